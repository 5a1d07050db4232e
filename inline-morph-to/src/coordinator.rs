//! The morph-to field itself.
//!
//! Composes the registry, resolver, locator and serializer into the two
//! operations the framework calls: resolving the current association for
//! display, and filling a newly selected entity on save.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::MorphSettings;
use crate::descriptor::TypeResolution;
use crate::error::{MorphError, Result, StoreError, ValidationErrors};
use crate::locator::ActiveEntityLocator;
use crate::model::{EntityStore, Model, MorphParent};
use crate::registry::{CandidateType, TypeList, TypeRegistry};
use crate::request::RequestContext;
use crate::resolver::FieldSetResolver;
use crate::serialize::{SerializationAdapter, SerializedCandidate};
use crate::types::{Linkage, MorphReference, OperationKind};

/// Stages of the write path, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    TypeSelected,
    Validating,
    Filling,
    Persisting,
    Associated,
}

/// Outcome of the read path.
pub struct Resolution<'r> {
    /// Identifier of the active candidate, `None` when nothing is associated.
    pub value: Option<String>,
    /// The pass holding the active candidate's resolved fields.
    pub fields: FieldSetResolver<'r>,
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub identifier: String,
    pub reference: MorphReference,
    /// `true` when a new related entity was created
    pub created: bool,
}

/// The full field payload sent to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorphToPayload {
    pub component: String,
    pub name: String,
    pub attribute: String,
    pub value: Option<String>,
    pub resources: Vec<SerializedCandidate>,
    pub listable: bool,
}

pub struct InlineMorphTo {
    name: String,
    attribute: String,
    registry: TypeRegistry,
    resolution: Option<Box<dyn TypeResolution>>,
    settings: MorphSettings,
}

impl InlineMorphTo {
    /// A field named `name`; the attribute is the lower-cased name with spaces
    /// replaced by underscores.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let attribute = name.to_lowercase().replace(' ', "_");
        Self {
            name,
            attribute,
            registry: TypeRegistry::new(),
            resolution: None,
            settings: MorphSettings::default(),
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Declare the candidate types.
    pub fn types(mut self, types: TypeList) -> Result<Self> {
        self.registry.register(types)?;
        Ok(self)
    }

    /// Replace the registry-based entity type lookup.
    pub fn with_type_resolution(mut self, resolution: impl TypeResolution + 'static) -> Self {
        self.resolution = Some(Box::new(resolution));
        self
    }

    pub fn with_settings(mut self, settings: MorphSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &MorphSettings {
        &self.settings
    }

    fn type_resolution(&self) -> &dyn TypeResolution {
        match &self.resolution {
            Some(resolution) => resolution.as_ref(),
            None => &self.registry,
        }
    }

    /// Read path: locate the associated entity and resolve the active
    /// candidate's fields against it for the request's operation kind.
    pub fn resolve<'r>(
        &self,
        parent: &dyn MorphParent,
        request: &'r RequestContext,
    ) -> Result<Resolution<'r>> {
        let mut pass = FieldSetResolver::for_request(request);
        let locator = ActiveEntityLocator::new(&self.registry, self.type_resolution());

        let Some(located) = locator.locate(parent, &self.attribute)? else {
            return Ok(Resolution {
                value: None,
                fields: pass,
            });
        };

        let entity = located.entity;
        let identifier = located.candidate.identifier();
        let fields = pass.fields(located.candidate)?;

        for field in fields.iter_mut() {
            if self.settings.link_relations && field.relation().is_some() {
                if let Some(key) = entity.key() {
                    field.link(Linkage {
                        via_resource_id: key.clone(),
                        via_resource: identifier.to_string(),
                    });
                }
            }
            field.resolve(entity).map_err(|source| MorphError::Resolve {
                resource: identifier.to_string(),
                attribute: field.attribute().to_string(),
                source,
            })?;
        }

        debug!(
            attribute = %self.attribute,
            identifier,
            operation = ?request.operation(),
            "resolved morph-to value"
        );
        Ok(Resolution {
            value: Some(identifier.to_string()),
            fields: pass,
        })
    }

    /// Read path plus serialization of every candidate.
    pub fn serialize(
        &self,
        parent: &dyn MorphParent,
        request: &RequestContext,
    ) -> Result<MorphToPayload> {
        let Resolution { value, mut fields } = self.resolve(parent, request)?;
        let resources = SerializationAdapter::serialize_all(&self.registry, &mut fields)?;

        Ok(MorphToPayload {
            component: self.settings.component.clone(),
            name: self.name.clone(),
            attribute: self.attribute.clone(),
            value,
            resources,
            listable: self.settings.listable,
        })
    }

    /// Write path: select, validate, fill, persist, then associate.
    ///
    /// Association happens only after the store accepted the related entity.
    /// The parent itself is not saved. A related entity that was persisted is
    /// not rolled back if a later step fails.
    pub fn fill(
        &self,
        request: &RequestContext,
        parent: &mut dyn MorphParent,
        store: &mut dyn EntityStore,
    ) -> Result<Association> {
        let candidate = self.selected_candidate(request)?;
        let identifier = candidate.identifier();
        let mut related = self.working_entity(parent, candidate);
        let created = !related.exists();
        debug!(stage = ?WriteStage::TypeSelected, identifier, created, "morph-to write");

        debug!(stage = ?WriteStage::Validating, identifier, "morph-to write");
        let descriptor = candidate.descriptor();
        let operation = if created {
            descriptor.validate_for_creation(request)?;
            OperationKind::Creation
        } else {
            descriptor.validate_for_update(related.as_ref(), request)?;
            OperationKind::Update
        };

        debug!(stage = ?WriteStage::Filling, identifier, "morph-to write");
        let mut pass = FieldSetResolver::new(operation, request);
        for field in pass.fields(candidate)?.iter() {
            field
                .fill(request, related.as_mut())
                .map_err(|source| MorphError::Fill {
                    attribute: field.attribute().to_string(),
                    source,
                })?;
        }

        debug!(stage = ?WriteStage::Persisting, identifier, "morph-to write");
        store.save(related.as_mut())?;
        let related_id = related.key().cloned().ok_or_else(|| {
            StoreError::new(related.entity_type(), "saved entity has no key")
        })?;

        let reference = MorphReference {
            related_type: related.entity_type().to_string(),
            related_id,
        };
        parent.associate(&self.attribute, reference.clone(), related);
        info!(
            stage = ?WriteStage::Associated,
            attribute = %self.attribute,
            identifier,
            related_id = %reference.related_id,
            "associated related entity"
        );

        Ok(Association {
            identifier: identifier.to_string(),
            reference,
            created,
        })
    }

    fn selected_candidate(&self, request: &RequestContext) -> Result<&CandidateType> {
        let Some(identifier) = request.input(&self.attribute).and_then(Value::as_str) else {
            let mut errors = ValidationErrors::new();
            errors.add(&self.attribute, "a type must be selected");
            return Err(errors.into());
        };
        self.registry
            .get(identifier)
            .ok_or_else(|| MorphError::UnknownType {
                attribute: self.attribute.clone(),
                identifier: identifier.to_string(),
            })
    }

    /// A copy of the parent's related entity when it already has the selected
    /// type, otherwise a fresh instance of that type.
    fn working_entity(&self, parent: &dyn MorphParent, candidate: &CandidateType) -> Box<dyn Model> {
        let existing = parent.morph_related(&self.attribute).filter(|entity| {
            self.type_resolution()
                .resource_for_entity_type(entity.entity_type())
                .as_deref()
                == Some(candidate.identifier())
        });
        match existing {
            Some(entity) => entity.duplicate(),
            None => candidate.descriptor().new_model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSet;
    use crate::testing::{MemoryStore, ParentRecord, Record, RelationField, StaticResource, TextField};
    use crate::types::RelationKind;

    fn field() -> InlineMorphTo {
        InlineMorphTo::new("Commentable")
            .types(TypeList::unkeyed([
                StaticResource::new("articles", "Article")
                    .with_type_path("app::resources::Article")
                    .fields(|| FieldSet::new().with(TextField::new("title").required()))
                    .shared(),
                StaticResource::new("videos", "Video")
                    .with_type_path("app::resources::Video")
                    .fields(|| {
                        FieldSet::new()
                            .with(TextField::new("url"))
                            .with(RelationField::new("comments", RelationKind::HasMany))
                    })
                    .shared(),
            ]))
            .unwrap()
    }

    #[test]
    fn attribute_derived_from_name() {
        assert_eq!(InlineMorphTo::new("Related Item").attribute(), "related_item");
        assert_eq!(
            InlineMorphTo::new("Related Item").with_attribute("item").attribute(),
            "item"
        );
    }

    #[test]
    fn resolve_without_relation_is_empty() {
        let field = field();
        let request = RequestContext::new(OperationKind::Detail);
        let resolution = field.resolve(&ParentRecord::new("Comment"), &request).unwrap();

        assert!(resolution.value.is_none());
        assert!(resolution.fields.get("articles").is_none());
    }

    #[test]
    fn resolve_links_relation_fields() {
        let field = field();
        let parent = ParentRecord::new("Comment").with_related(
            "commentable",
            Record::persisted("Video", 42).with("url", "https://example.test/v"),
        );
        let request = RequestContext::new(OperationKind::Detail);

        let resolution = field.resolve(&parent, &request).unwrap();
        assert_eq!(resolution.value.as_deref(), Some("videos"));

        let json: Vec<_> = resolution
            .fields
            .get("videos")
            .unwrap()
            .iter()
            .map(|f| f.serialize(&request).unwrap())
            .collect();
        assert_eq!(json[0]["value"], "https://example.test/v");
        assert_eq!(json[1]["inlineMorphTo"]["viaResourceId"], "42");
        assert_eq!(json[1]["inlineMorphTo"]["viaResource"], "videos");
    }

    #[test]
    fn linkage_can_be_disabled() {
        let field = field().with_settings(MorphSettings {
            link_relations: false,
            ..MorphSettings::default()
        });
        let parent =
            ParentRecord::new("Comment").with_related("commentable", Record::persisted("Video", 1));
        let request = RequestContext::new(OperationKind::Detail);

        let resolution = field.resolve(&parent, &request).unwrap();
        let comments = resolution.fields.get("videos").unwrap().get("comments").unwrap();
        assert!(comments.serialize(&request).unwrap()["inlineMorphTo"].is_null());
    }

    #[test]
    fn resolve_failure_names_the_field() {
        let field = InlineMorphTo::new("Commentable")
            .types(TypeList::unkeyed([StaticResource::new("videos", "Video")
                .fields(|| FieldSet::new().with(TextField::new("url").failing_resolve()))
                .shared()]))
            .unwrap();
        let parent =
            ParentRecord::new("Comment").with_related("commentable", Record::persisted("Video", 1));
        let request = RequestContext::new(OperationKind::Detail);

        let err = field.resolve(&parent, &request).err().unwrap();

        assert!(matches!(
            err,
            MorphError::Resolve { ref resource, ref attribute, .. }
                if resource == "videos" && attribute == "url"
        ));
        assert_eq!(err.kind(), crate::error::ErrorKind::Resolution);
    }

    #[test]
    fn fill_creates_and_associates() {
        let field = field();
        let mut parent = ParentRecord::new("Comment");
        let mut store = MemoryStore::new();
        let request = RequestContext::new(OperationKind::Creation)
            .with_input("commentable", "articles")
            .with_input("title", "Hello");

        let association = field.fill(&request, &mut parent, &mut store).unwrap();

        assert!(association.created);
        assert_eq!(association.identifier, "articles");
        assert_eq!(association.reference.related_type, "Article");
        assert_eq!(store.saves(), 1);
        assert_eq!(parent.reference("commentable"), Some(&association.reference));
        let related = parent.morph_related("commentable").unwrap();
        assert_eq!(related.attribute("title"), Some(&Value::from("Hello")));
    }

    #[test]
    fn missing_selection_is_a_validation_error() {
        let field = field();
        let mut parent = ParentRecord::new("Comment");
        let mut store = MemoryStore::new();
        let request = RequestContext::new(OperationKind::Creation).with_input("title", "Hello");

        let err = field.fill(&request, &mut parent, &mut store).unwrap_err();
        assert!(matches!(err, MorphError::Validation(_)));
        assert_eq!(store.saves(), 0);
    }
}
