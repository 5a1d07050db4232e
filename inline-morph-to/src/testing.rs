//! In-memory entities, fields and resources for tests.
//!
//! Enabled for this crate's own tests and, through the `test-support` feature,
//! for integration tests and downstream crates.

use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::descriptor::ResourceDescriptor;
use crate::error::{FieldError, StoreError};
use crate::field::{Field, FieldSet};
use crate::model::{EntityStore, Model, MorphParent};
use crate::request::RequestContext;
use crate::types::{EntityId, Linkage, MorphReference, OperationKind, RelationKind};

/// A plain attribute bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity_type: String,
    key: Option<EntityId>,
    attributes: IndexMap<String, Value>,
}

impl Record {
    /// An unsaved record
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            key: None,
            attributes: IndexMap::new(),
        }
    }

    /// A record that already exists in storage
    pub fn persisted(entity_type: impl Into<String>, id: u64) -> Self {
        let mut record = Self::new(entity_type);
        record.key = Some(EntityId::from(id));
        record
    }

    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }
}

impl Model for Record {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn key(&self) -> Option<&EntityId> {
        self.key.as_ref()
    }

    fn assign_key(&mut self, key: EntityId) {
        self.key = Some(key);
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    fn duplicate(&self) -> Box<dyn Model> {
        Box::new(self.clone())
    }
}

/// A parent entity with any number of morph-to relations.
///
/// Associating writes `{attribute}_type` and `{attribute}_id` onto the
/// underlying record.
#[derive(Debug)]
pub struct ParentRecord {
    record: Record,
    references: HashMap<String, MorphReference>,
    related: HashMap<String, Box<dyn Model>>,
}

impl ParentRecord {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            record: Record::new(entity_type),
            references: HashMap::new(),
            related: HashMap::new(),
        }
    }

    /// Preload a related entity. Unsaved records are loaded without a reference.
    pub fn with_related(mut self, attribute: &str, related: Record) -> Self {
        match related.key().cloned() {
            Some(related_id) => {
                let reference = MorphReference {
                    related_type: related.entity_type().to_string(),
                    related_id,
                };
                self.associate(attribute, reference, Box::new(related));
            }
            None => {
                self.related.insert(attribute.to_string(), Box::new(related));
            }
        }
        self
    }

    pub fn reference(&self, attribute: &str) -> Option<&MorphReference> {
        self.references.get(attribute)
    }

    pub fn record(&self) -> &Record {
        &self.record
    }
}

impl MorphParent for ParentRecord {
    fn morph_related(&self, attribute: &str) -> Option<&dyn Model> {
        self.related.get(attribute).map(|m| m.as_ref())
    }

    fn associate(&mut self, attribute: &str, reference: MorphReference, related: Box<dyn Model>) {
        self.record.set_attribute(
            &format!("{attribute}_type"),
            Value::from(reference.related_type.clone()),
        );
        self.record.set_attribute(
            &format!("{attribute}_id"),
            Value::from(reference.related_id.to_string()),
        );
        self.references.insert(attribute.to_string(), reference);
        self.related.insert(attribute.to_string(), related);
    }
}

/// Records every save; optionally rejects all of them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Vec<Box<dyn Model>>,
    failure: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every save with `message`
    pub fn fail_with(message: impl Into<String>) -> Self {
        Self {
            saved: Vec::new(),
            failure: Some(message.into()),
        }
    }

    /// Number of accepted saves
    pub fn saves(&self) -> usize {
        self.saved.len()
    }

    /// Snapshots of accepted entities, in save order
    pub fn saved(&self) -> &[Box<dyn Model>] {
        &self.saved
    }
}

impl EntityStore for MemoryStore {
    fn save(&mut self, model: &mut dyn Model) -> Result<(), StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::new(model.entity_type(), message.clone()));
        }
        if model.key().is_none() {
            model.assign_key(EntityId::generate());
        }
        self.saved.push(model.duplicate());
        Ok(())
    }
}

/// A scalar field backed by one attribute.
#[derive(Debug, Clone)]
pub struct TextField {
    attribute: String,
    value: Option<Value>,
    required: bool,
    fail_resolve: bool,
    fail_serialize: bool,
    fail_fill: Option<String>,
}

impl TextField {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: None,
            required: false,
            fail_resolve: false,
            fail_serialize: false,
            fail_fill: None,
        }
    }

    /// Reject payloads without a non-empty value
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn failing_resolve(mut self) -> Self {
        self.fail_resolve = true;
        self
    }

    pub fn failing_serialize(mut self) -> Self {
        self.fail_serialize = true;
        self
    }

    pub fn failing_fill(mut self, message: impl Into<String>) -> Self {
        self.fail_fill = Some(message.into());
        self
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl Field for TextField {
    fn attribute(&self) -> &str {
        &self.attribute
    }

    fn resolve(&mut self, model: &dyn Model) -> Result<(), FieldError> {
        if self.fail_resolve {
            return Err(FieldError::invalid_value(&self.attribute, "unreadable stored value"));
        }
        self.value = model.attribute(&self.attribute).cloned();
        Ok(())
    }

    fn fill(&self, request: &RequestContext, model: &mut dyn Model) -> Result<(), FieldError> {
        if let Some(message) = &self.fail_fill {
            return Err(FieldError::invalid_value(&self.attribute, message.clone()));
        }
        if let Some(value) = request.input(&self.attribute) {
            model.set_attribute(&self.attribute, value.clone());
        }
        Ok(())
    }

    fn serialize(&self, request: &RequestContext) -> Result<Value, FieldError> {
        if self.fail_serialize {
            return Err(FieldError::misconfigured(format!(
                "{} cannot be serialized",
                self.attribute
            )));
        }
        Ok(json!({
            "attribute": self.attribute,
            "value": self.value,
            "resource": request.route().active_resource(),
        }))
    }

    fn validate(&self, request: &RequestContext, _operation: OperationKind) -> Vec<String> {
        let present = match request.input(&self.attribute) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if self.required && !present {
            vec!["required".to_string()]
        } else {
            Vec::new()
        }
    }
}

/// A nested relation field that records the linkage it receives.
#[derive(Debug, Clone)]
pub struct RelationField {
    attribute: String,
    kind: RelationKind,
    linkage: Option<Linkage>,
}

impl RelationField {
    pub fn new(attribute: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            linkage: None,
        }
    }

    pub fn linkage(&self) -> Option<&Linkage> {
        self.linkage.as_ref()
    }
}

impl Field for RelationField {
    fn attribute(&self) -> &str {
        &self.attribute
    }

    fn resolve(&mut self, _model: &dyn Model) -> Result<(), FieldError> {
        Ok(())
    }

    fn fill(&self, _request: &RequestContext, _model: &mut dyn Model) -> Result<(), FieldError> {
        Ok(())
    }

    fn serialize(&self, request: &RequestContext) -> Result<Value, FieldError> {
        Ok(json!({
            "attribute": self.attribute,
            "relation": self.kind,
            "resource": request.route().active_resource(),
            "inlineMorphTo": self.linkage,
        }))
    }

    fn relation(&self) -> Option<RelationKind> {
        Some(self.kind)
    }

    fn link(&mut self, linkage: Linkage) {
        self.linkage = Some(linkage);
    }
}

/// Shared log of field-set requests: operation kind and whether the model
/// passed in was unsaved.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(OperationKind, bool)>>>);

impl CallLog {
    fn record(&self, operation: OperationKind, fresh: bool) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push((operation, fresh));
        }
    }

    fn snapshot(&self) -> Vec<(OperationKind, bool)> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn operations(&self) -> Vec<OperationKind> {
        self.snapshot().into_iter().map(|(op, _)| op).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when every request described an unsaved model
    pub fn all_fresh(&self) -> bool {
        self.snapshot().iter().all(|(_, fresh)| *fresh)
    }
}

type FieldFactory = Box<dyn Fn() -> FieldSet>;

/// A resource built from closures.
pub struct StaticResource {
    uri_key: String,
    model_type: String,
    type_path: Option<String>,
    fields: FieldFactory,
    per_operation: HashMap<OperationKind, FieldFactory>,
    failure: Option<String>,
    calls: CallLog,
}

impl StaticResource {
    pub fn new(uri_key: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            uri_key: uri_key.into(),
            model_type: model_type.into(),
            type_path: None,
            fields: Box::new(FieldSet::new),
            per_operation: HashMap::new(),
            failure: None,
            calls: CallLog::default(),
        }
    }

    /// Type path the label is derived from
    pub fn with_type_path(mut self, type_path: impl Into<String>) -> Self {
        self.type_path = Some(type_path.into());
        self
    }

    /// Fields for every operation kind without its own factory
    pub fn fields(mut self, factory: impl Fn() -> FieldSet + 'static) -> Self {
        self.fields = Box::new(factory);
        self
    }

    pub fn fields_for(
        mut self,
        operation: OperationKind,
        factory: impl Fn() -> FieldSet + 'static,
    ) -> Self {
        self.per_operation.insert(operation, Box::new(factory));
        self
    }

    /// Every field-set request fails with `message`
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn shared(self) -> Arc<dyn ResourceDescriptor> {
        Arc::new(self)
    }

    fn produce(&self, operation: OperationKind, model: &dyn Model) -> Result<FieldSet, FieldError> {
        self.calls.record(operation, !model.exists());
        if let Some(message) = &self.failure {
            return Err(FieldError::misconfigured(message.clone()));
        }
        let factory = self.per_operation.get(&operation).unwrap_or(&self.fields);
        Ok(factory())
    }
}

impl fmt::Debug for StaticResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticResource")
            .field("uri_key", &self.uri_key)
            .field("model_type", &self.model_type)
            .finish_non_exhaustive()
    }
}

impl ResourceDescriptor for StaticResource {
    fn uri_key(&self) -> &str {
        &self.uri_key
    }

    fn model_type(&self) -> &str {
        &self.model_type
    }

    fn type_path(&self) -> &str {
        self.type_path.as_deref().unwrap_or(&self.model_type)
    }

    fn new_model(&self) -> Box<dyn Model> {
        Box::new(Record::new(self.model_type.clone()))
    }

    fn available_fields(
        &self,
        model: &dyn Model,
        _request: &RequestContext,
    ) -> Result<FieldSet, FieldError> {
        self.produce(OperationKind::Generic, model)
    }

    fn creation_fields(
        &self,
        model: &dyn Model,
        _request: &RequestContext,
    ) -> Result<FieldSet, FieldError> {
        self.produce(OperationKind::Creation, model)
    }

    fn update_fields(
        &self,
        model: &dyn Model,
        _request: &RequestContext,
    ) -> Result<FieldSet, FieldError> {
        self.produce(OperationKind::Update, model)
    }

    fn detail_fields(
        &self,
        model: &dyn Model,
        _request: &RequestContext,
    ) -> Result<FieldSet, FieldError> {
        self.produce(OperationKind::Detail, model)
    }

    fn index_fields(
        &self,
        model: &dyn Model,
        _request: &RequestContext,
    ) -> Result<FieldSet, FieldError> {
        self.produce(OperationKind::Index, model)
    }
}
