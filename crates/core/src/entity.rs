//! Entity trait: identity + continuity across state changes.

use chrono::{DateTime, Utc};

/// A persisted record with a stable identity.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Creation timestamp, used for newest-first listings.
    fn created_at(&self) -> DateTime<Utc>;
}
