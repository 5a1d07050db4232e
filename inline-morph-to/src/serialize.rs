//! Transport form of every candidate's field set.
//!
//! Nested fields read the route's active resource to decide how they render, so
//! each candidate is serialized with the route naming that candidate. The
//! original route value is put back on every exit path.

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{MorphError, Result};
use crate::registry::TypeRegistry;
use crate::resolver::FieldSetResolver;

/// One candidate as sent to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializedCandidate {
    pub identifier: String,
    pub label: String,
    pub fields: Vec<Value>,
}

pub struct SerializationAdapter;

impl SerializationAdapter {
    /// Serialize all candidates in registration order, resolving any field set
    /// the pass has not produced yet.
    pub fn serialize_all(
        registry: &TypeRegistry,
        pass: &mut FieldSetResolver<'_>,
    ) -> Result<Vec<SerializedCandidate>> {
        let request = pass.request();
        let route = request.route();
        let _restore = scopeguard::guard(route.active_resource(), |original| {
            trace!(resource = ?original, "restoring route resource");
            route.set_active_resource(original);
        });

        let mut out = Vec::with_capacity(registry.len());
        for candidate in registry.iter() {
            let fields = pass.fields(candidate)?;
            route.set_active_resource(Some(candidate.identifier().to_string()));

            let serialized = fields
                .iter()
                .map(|field| {
                    field.serialize(request).map_err(|source| MorphError::Serialization {
                        resource: candidate.identifier().to_string(),
                        attribute: field.attribute().to_string(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            out.push(SerializedCandidate {
                identifier: candidate.identifier().to_string(),
                label: candidate.label().to_string(),
                fields: serialized,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSet;
    use crate::registry::TypeList;
    use crate::request::RequestContext;
    use crate::testing::{StaticResource, TextField};
    use crate::types::OperationKind;

    fn registry(video_fails: bool) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeList::keyed([
                (
                    "Article",
                    StaticResource::new("articles", "Article")
                        .fields(|| FieldSet::new().with(TextField::new("title")))
                        .shared(),
                ),
                (
                    "Video",
                    StaticResource::new("videos", "Video")
                        .fields(move || {
                            let title = TextField::new("title");
                            FieldSet::new().with(if video_fails {
                                title.failing_serialize()
                            } else {
                                title
                            })
                        })
                        .shared(),
                ),
            ]))
            .unwrap();
        registry
    }

    #[test]
    fn each_candidate_sees_its_own_resource() {
        let registry = registry(false);
        let request = RequestContext::new(OperationKind::Creation).with_resource("comments");
        let mut pass = FieldSetResolver::for_request(&request);

        let out = SerializationAdapter::serialize_all(&registry, &mut pass).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].identifier, "articles");
        assert_eq!(out[0].label, "Article");
        assert_eq!(out[0].fields[0]["resource"], "articles");
        assert_eq!(out[1].fields[0]["resource"], "videos");
        assert_eq!(request.route().active_resource().as_deref(), Some("comments"));
    }

    #[test]
    fn route_restored_when_serialization_fails() {
        let registry = registry(true);
        let request = RequestContext::new(OperationKind::Creation).with_resource("comments");
        let mut pass = FieldSetResolver::for_request(&request);

        let err = SerializationAdapter::serialize_all(&registry, &mut pass).unwrap_err();

        assert!(matches!(err, MorphError::Serialization { ref resource, .. } if resource == "videos"));
        assert_eq!(request.route().active_resource().as_deref(), Some("comments"));
    }

    #[test]
    fn route_restored_to_absent() {
        let registry = registry(false);
        let request = RequestContext::new(OperationKind::Index);
        let mut pass = FieldSetResolver::for_request(&request);

        SerializationAdapter::serialize_all(&registry, &mut pass).unwrap();
        assert!(request.route().active_resource().is_none());
    }
}
