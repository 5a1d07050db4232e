//! The candidate types a morph-to field may point at.
//!
//! Candidates are registered once, when the field is configured, and keep their
//! registration order. Lookups go through an identifier index.

use convert_case::{Boundary, Case, Casing};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::descriptor::{ResourceDescriptor, TypeResolution};
use crate::error::{MorphError, Result};

/// One entity kind the morph attribute may reference.
#[derive(Clone)]
pub struct CandidateType {
    identifier: String,
    label: String,
    descriptor: Arc<dyn ResourceDescriptor>,
}

impl CandidateType {
    fn new(label: String, descriptor: Arc<dyn ResourceDescriptor>) -> Self {
        Self {
            identifier: descriptor.uri_key().to_string(),
            label,
            descriptor,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn descriptor(&self) -> &dyn ResourceDescriptor {
        self.descriptor.as_ref()
    }

    /// Whether this candidate describes entities of `entity_type`
    pub fn describes(&self, entity_type: &str) -> bool {
        self.descriptor.model_type() == entity_type
    }
}

impl fmt::Debug for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateType")
            .field("identifier", &self.identifier)
            .field("label", &self.label)
            .field("model_type", &self.descriptor.model_type())
            .finish()
    }
}

/// The argument to `types(...)`.
///
/// Unkeyed lists derive each label from the descriptor's type name; keyed maps
/// use their keys verbatim. One call uses exactly one mode.
pub enum TypeList {
    Unkeyed(Vec<Arc<dyn ResourceDescriptor>>),
    Keyed(IndexMap<String, Arc<dyn ResourceDescriptor>>),
}

impl TypeList {
    pub fn unkeyed(descriptors: impl IntoIterator<Item = Arc<dyn ResourceDescriptor>>) -> Self {
        Self::Unkeyed(descriptors.into_iter().collect())
    }

    pub fn keyed<L: Into<String>>(
        entries: impl IntoIterator<Item = (L, Arc<dyn ResourceDescriptor>)>,
    ) -> Self {
        Self::Keyed(
            entries
                .into_iter()
                .map(|(label, descriptor)| (label.into(), descriptor))
                .collect(),
        )
    }

    fn into_candidates(self) -> Vec<CandidateType> {
        match self {
            Self::Unkeyed(descriptors) => descriptors
                .into_iter()
                .map(|d| CandidateType::new(human_case(d.type_path()), d))
                .collect(),
            Self::Keyed(entries) => entries
                .into_iter()
                .map(|(label, d)| CandidateType::new(label, d))
                .collect(),
        }
    }
}

/// Ordered candidate types with an identifier index.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    candidates: Vec<CandidateType>,
    index: HashMap<String, usize>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register candidates. On a duplicate identifier nothing is registered.
    pub fn register(&mut self, types: TypeList) -> Result<()> {
        let incoming = types.into_candidates();

        let mut seen = HashSet::new();
        for candidate in &incoming {
            let id = candidate.identifier();
            if self.index.contains_key(id) || !seen.insert(id) {
                return Err(MorphError::DuplicateIdentifier {
                    identifier: id.to_string(),
                });
            }
        }

        for candidate in incoming {
            debug!(
                identifier = %candidate.identifier,
                label = %candidate.label,
                "registered morph candidate"
            );
            self.index
                .insert(candidate.identifier.clone(), self.candidates.len());
            self.candidates.push(candidate);
        }
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Option<&CandidateType> {
        self.index.get(identifier).map(|&i| &self.candidates[i])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    /// All candidates in registration order.
    pub fn candidates(&self) -> &[CandidateType] {
        &self.candidates
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateType> {
        self.candidates.iter()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.iter().map(|c| c.identifier()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl TypeResolution for TypeRegistry {
    fn resource_for_entity_type(&self, entity_type: &str) -> Option<String> {
        self.iter()
            .find(|c| c.describes(entity_type))
            .map(|c| c.identifier.clone())
    }
}

/// Splits before every uppercase letter that follows a non-separator, so
/// acronyms become one word per letter and digits stay attached.
const BEFORE_UPPER: Boundary = Boundary::Custom {
    condition: before_upper,
    start: 1,
    len: 0,
};

fn before_upper(s: &[&str]) -> bool {
    let is_upper = |g: &&str| g.to_uppercase() != g.to_lowercase() && *g == g.to_uppercase();
    match (s.first(), s.get(1)) {
        (Some(first), Some(second)) => !matches!(*first, "_" | " ") && is_upper(second),
        _ => false,
    }
}

/// Human label for a type path: `app::resources::BlogPostArticle` → `Blog Post Article`.
pub fn human_case(type_path: &str) -> String {
    let without_generics = type_path.split('<').next().unwrap_or(type_path);
    let short = without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics);
    short
        .set_boundaries(&[Boundary::Underscore, Boundary::Space, BEFORE_UPPER])
        .remove_empty()
        .to_case(Case::Title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticResource;
    use rstest::rstest;

    fn resource(uri_key: &str, model_type: &str) -> Arc<dyn ResourceDescriptor> {
        StaticResource::new(uri_key, model_type).shared()
    }

    #[rstest]
    #[case("app::resources::BlogPostArticle", "Blog Post Article")]
    #[case("Article", "Article")]
    #[case("app::resources::Video", "Video")]
    #[case("app::resources::podcast_episode", "Podcast Episode")]
    #[case("app::resources::Wrapper<app::Inner>", "Wrapper")]
    #[case("Mp4Video", "Mp4 Video")]
    #[case("Video2", "Video2")]
    #[case("HTMLPage", "H T M L Page")]
    #[case("ABTest", "A B Test")]
    fn human_case_conversion(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(human_case(path), expected);
    }

    #[test]
    fn unkeyed_labels_are_derived() {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeList::unkeyed([
                StaticResource::new("articles", "Article")
                    .with_type_path("app::resources::BlogPostArticle")
                    .shared(),
                StaticResource::new("videos", "Video")
                    .with_type_path("app::resources::Video")
                    .shared(),
            ]))
            .unwrap();

        assert_eq!(registry.identifiers(), vec!["articles", "videos"]);
        assert_eq!(registry.get("articles").unwrap().label(), "Blog Post Article");
        assert_eq!(registry.get("videos").unwrap().label(), "Video");
    }

    #[test]
    fn keyed_labels_are_verbatim() {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeList::keyed([
                ("my_custom label", resource("articles", "Article")),
                ("Clips", resource("videos", "Video")),
            ]))
            .unwrap();

        assert_eq!(registry.get("articles").unwrap().label(), "my_custom label");
        assert_eq!(registry.get("videos").unwrap().label(), "Clips");
    }

    #[test]
    fn duplicate_within_call_registers_nothing() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .register(TypeList::unkeyed([
                resource("articles", "Article"),
                resource("articles", "Post"),
            ]))
            .unwrap_err();

        assert!(matches!(err, MorphError::DuplicateIdentifier { ref identifier } if identifier == "articles"));
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_across_calls_keeps_existing() {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeList::unkeyed([resource("videos", "Video")]))
            .unwrap();

        let result = registry.register(TypeList::unkeyed([
            resource("articles", "Article"),
            resource("videos", "Clip"),
        ]));

        assert!(result.is_err());
        assert_eq!(registry.identifiers(), vec!["videos"]);
        assert!(!registry.contains("articles"));
    }

    #[test]
    fn resolves_entity_types_to_identifiers() {
        let mut registry = TypeRegistry::new();
        registry
            .register(TypeList::unkeyed([
                resource("articles", "Article"),
                resource("videos", "Video"),
            ]))
            .unwrap();

        assert_eq!(
            registry.resource_for_entity_type("Video").as_deref(),
            Some("videos")
        );
        assert!(registry.resource_for_entity_type("Podcast").is_none());
    }
}
