//! Entity-description providers and the type-resolution service.

use crate::error::{FieldError, MorphError, Result, ValidationErrors};
use crate::field::FieldSet;
use crate::model::Model;
use crate::request::RequestContext;
use crate::types::OperationKind;

/// Describes one candidate resource type: its identity and its field sets per
/// operation kind.
///
/// Every field-set method receives the model it should describe. The resolver
/// always passes a fresh instance from [`ResourceDescriptor::new_model`]; the
/// shape of a field set is type-level metadata.
pub trait ResourceDescriptor {
    /// Stable identifier, unique within one morph-to field (e.g. `"videos"`).
    fn uri_key(&self) -> &str;

    /// Entity type this resource describes, matched against [`Model::entity_type`].
    fn model_type(&self) -> &str;

    /// Fully-qualified type path used to derive a human label.
    fn type_path(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// An empty, unsaved instance of the described entity type.
    fn new_model(&self) -> Box<dyn Model>;

    /// Every field the resource declares.
    fn available_fields(
        &self,
        model: &dyn Model,
        request: &RequestContext,
    ) -> std::result::Result<FieldSet, FieldError>;

    fn creation_fields(
        &self,
        model: &dyn Model,
        request: &RequestContext,
    ) -> std::result::Result<FieldSet, FieldError> {
        self.available_fields(model, request)
    }

    fn update_fields(
        &self,
        model: &dyn Model,
        request: &RequestContext,
    ) -> std::result::Result<FieldSet, FieldError> {
        self.available_fields(model, request)
    }

    fn detail_fields(
        &self,
        model: &dyn Model,
        request: &RequestContext,
    ) -> std::result::Result<FieldSet, FieldError> {
        self.available_fields(model, request)
    }

    fn index_fields(
        &self,
        model: &dyn Model,
        request: &RequestContext,
    ) -> std::result::Result<FieldSet, FieldError> {
        self.available_fields(model, request)
    }

    /// Validate the payload for a new entity using the creation fields' rules.
    fn validate_for_creation(&self, request: &RequestContext) -> Result<()> {
        let model = self.new_model();
        let fields = self
            .creation_fields(model.as_ref(), request)
            .map_err(|e| MorphError::descriptor(self.uri_key(), e))?;
        collect_violations(&fields, request, OperationKind::Creation)
    }

    /// Validate the payload for an existing entity using the update fields' rules.
    fn validate_for_update(&self, model: &dyn Model, request: &RequestContext) -> Result<()> {
        let fields = self
            .update_fields(model, request)
            .map_err(|e| MorphError::descriptor(self.uri_key(), e))?;
        collect_violations(&fields, request, OperationKind::Update)
    }
}

fn collect_violations(
    fields: &FieldSet,
    request: &RequestContext,
    operation: OperationKind,
) -> Result<()> {
    let mut errors = ValidationErrors::new();
    for field in fields.iter() {
        for message in field.validate(request, operation) {
            errors.add(field.attribute(), message);
        }
    }
    errors.into_result().map_err(MorphError::from)
}

/// Maps a concrete entity type to the identifier of the resource describing it.
pub trait TypeResolution {
    fn resource_for_entity_type(&self, entity_type: &str) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StaticResource, TextField};

    #[test]
    fn creation_validation_aggregates_field_rules() {
        let resource = StaticResource::new("articles", "Article").fields(|| {
            FieldSet::new()
                .with(TextField::new("title").required())
                .with(TextField::new("summary").required())
                .with(TextField::new("body"))
        });
        let request = RequestContext::new(OperationKind::Creation).with_input("summary", "x");

        let err = resource.validate_for_creation(&request).unwrap_err();
        let MorphError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.violations()[0].attribute, "title");
    }

    #[test]
    fn update_validation_passes_with_complete_payload() {
        let resource = StaticResource::new("articles", "Article")
            .fields(|| FieldSet::new().with(TextField::new("title").required()));
        let request = RequestContext::new(OperationKind::Update).with_input("title", "Hello");
        let model = resource.new_model();

        assert!(resource.validate_for_update(model.as_ref(), &request).is_ok());
    }
}
