//! Draft/published pairing
//!
//! `transitions` owns the only code paths that write versioning state;
//! `status` derives the read-only flags from it.

pub mod status;
pub mod transitions;

pub use transitions::{publish, unpublish, PublishOutcome};
