//! The nested field contract and ordered field sets.

use serde_json::Value;
use std::fmt;

use crate::error::FieldError;
use crate::model::Model;
use crate::request::RequestContext;
use crate::types::{Linkage, OperationKind, RelationKind};

/// A field exposed by a candidate type.
///
/// Only the capabilities the morph-to field needs are part of the contract;
/// labels, visibility and rule attachment belong to the implementing framework.
pub trait Field: fmt::Debug {
    /// Attribute name on the related entity and key in the submitted payload.
    fn attribute(&self) -> &str;

    /// Load this field's display value from `model`.
    fn resolve(&mut self, model: &dyn Model) -> Result<(), FieldError>;

    /// Apply the submitted value to `model`.
    fn fill(&self, request: &RequestContext, model: &mut dyn Model) -> Result<(), FieldError>;

    /// Transport representation for the UI.
    fn serialize(&self, request: &RequestContext) -> Result<Value, FieldError>;

    /// Relation capability, if this field is a nested relation.
    fn relation(&self) -> Option<RelationKind> {
        None
    }

    /// Receive linkage metadata before `resolve`. Only called on relation fields.
    fn link(&mut self, _linkage: Linkage) {}

    /// Rule violations for the submitted payload.
    fn validate(&self, _request: &RequestContext, _operation: OperationKind) -> Vec<String> {
        Vec::new()
    }
}

/// Ordered fields one candidate exposes for one operation kind.
#[derive(Debug, Default)]
pub struct FieldSet {
    fields: Vec<Box<dyn Field>>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, builder style
    pub fn with(mut self, field: impl Field + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }

    pub fn push(&mut self, field: Box<dyn Field>) {
        self.fields.push(field);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Field> {
        self.fields.iter().map(|f| f.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Field>> {
        self.fields.iter_mut()
    }

    pub fn get(&self, attribute: &str) -> Option<&dyn Field> {
        self.iter().find(|f| f.attribute() == attribute)
    }

    /// Attribute names in field order
    pub fn attributes(&self) -> Vec<&str> {
        self.iter().map(|f| f.attribute()).collect()
    }
}

impl FromIterator<Box<dyn Field>> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Box<dyn Field>>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
