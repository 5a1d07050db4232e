//! Core value types shared by the read and write paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Which admin screen or action triggered field resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Creation,
    Update,
    Detail,
    Index,
    /// Unrecognized context; exposes the broadest field set.
    Generic,
}

/// Relation capability carried by nested relation fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// One-to-one
    HasOne,
    /// One-to-many
    HasMany,
    /// Many-to-many
    BelongsToMany,
}

/// Primary key of a persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a fresh ULID-backed key
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<Ulid> for EntityId {
    fn from(id: Ulid) -> Self {
        Self(id.to_string())
    }
}

/// Identifiers injected into a nested relation field so it queries against the
/// related entity instead of the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Linkage {
    pub via_resource_id: EntityId,
    pub via_resource: String,
}

/// Foreign key + type discriminator written onto the parent by `associate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphReference {
    pub related_type: String,
    pub related_id: EntityId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_kind_kebab_case() {
        let json = serde_json::to_string(&OperationKind::Generic).unwrap();
        assert_eq!(json, "\"generic\"");
        let parsed: RelationKind = serde_json::from_str("\"belongs-to-many\"").unwrap();
        assert_eq!(parsed, RelationKind::BelongsToMany);
    }

    #[test]
    fn linkage_uses_camel_case_keys() {
        let linkage = Linkage {
            via_resource_id: EntityId::from(7),
            via_resource: "videos".into(),
        };
        let json = serde_json::to_value(&linkage).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "viaResourceId": "7", "viaResource": "videos" })
        );
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(EntityId::generate(), EntityId::generate());
        assert_eq!(EntityId::generate().as_str().len(), 26);
    }
}
