pub mod content_ops;
pub mod entity_ops;
pub mod store;

pub use store::{ChangeSet, Sequences, Store};
