//! URL resolution seam
//!
//! The page tree and routing live outside the kernel. The signer only needs
//! an entity's path, and the views need to map a path back to an entity
//! within an already filtered result set.

use crate::model::VersionedEntity;
use crate::query::EntityQuery;

pub trait UrlResolver {
    /// Path of the entity, e.g. `/about/`
    fn absolute_url(&self, entity: &VersionedEntity) -> String;

    /// The entity among `candidates` that lives at `path`
    ///
    /// Guarded draft rows never match.
    fn resolve<'s>(&self, candidates: EntityQuery<'s>, path: &str) -> Option<&'s VersionedEntity>;
}

/// Flat `/<prefix>/<slug>/` routing
#[derive(Debug, Clone)]
pub struct SlugResolver {
    prefix: String,
}

impl SlugResolver {
    /// `prefix` must start and end with '/'
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for SlugResolver {
    fn default() -> Self {
        Self::new("/")
    }
}

impl UrlResolver for SlugResolver {
    fn absolute_url(&self, entity: &VersionedEntity) -> String {
        format!("{}{}/", self.prefix, entity.slug())
    }

    fn resolve<'s>(&self, candidates: EntityQuery<'s>, path: &str) -> Option<&'s VersionedEntity> {
        let slug = path.strip_prefix(&self.prefix)?;
        let slug = slug.strip_suffix('/').unwrap_or(slug);
        if slug.is_empty() || slug.contains('/') {
            return None;
        }
        candidates
            .into_iter()
            .filter_map(|row| row.entity())
            .find(|e| e.slug() == slug)
    }
}
