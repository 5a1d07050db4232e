//! Seams to the surrounding ORM: entities, the parent's morph relation, and storage.
//!
//! The core never implements these. It borrows the parent, owns a working copy of
//! the related entity during a write, and hands that copy to the parent once the
//! store has accepted it.

use serde_json::Value;
use std::fmt;

use crate::error::StoreError;
use crate::types::{EntityId, MorphReference};

/// An entity as seen by fields: a typed bag of attributes with an optional key.
pub trait Model: fmt::Debug {
    /// Concrete entity type, also used as the morph discriminator.
    fn entity_type(&self) -> &str;

    /// Primary key, `None` until the entity has been persisted.
    fn key(&self) -> Option<&EntityId>;

    /// Set by the store when the entity is first persisted.
    fn assign_key(&mut self, key: EntityId);

    fn exists(&self) -> bool {
        self.key().is_some()
    }

    fn attribute(&self, name: &str) -> Option<&Value>;

    fn set_attribute(&mut self, name: &str, value: Value);

    /// Owned copy used as the write path's working entity.
    fn duplicate(&self) -> Box<dyn Model>;
}

/// The entity owning the polymorphic attribute.
pub trait MorphParent {
    /// The loaded related entity for `attribute`, if any.
    fn morph_related(&self, attribute: &str) -> Option<&dyn Model>;

    /// Point `attribute` at a persisted related entity. Does not save the parent.
    fn associate(&mut self, attribute: &str, reference: MorphReference, related: Box<dyn Model>);
}

/// Persistence for related entities.
pub trait EntityStore {
    /// Insert or update `model`, assigning a key on first insert.
    fn save(&mut self, model: &mut dyn Model) -> Result<(), StoreError>;
}
