pub mod content_item;
pub mod entity;
pub mod placeholder;
pub mod user;

pub use content_item::{ContentItem, ContentItemId};
pub use entity::{EntityContent, EntityId, VersionedEntity, VersioningState};
pub use placeholder::{Placeholder, PlaceholderId};
pub use user::User;
