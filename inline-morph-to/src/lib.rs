//! Inline polymorphic "morph-to" form field
//!
//! `inline-morph-to` lets an admin form edit a polymorphic belongs-to relation
//! in place: the user picks one of several candidate resource types and fills
//! that type's own fields inside the parent's form.
//!
//! # Architecture
//!
//! - **Registry**: candidate types keyed by identifier, labels derived from type paths
//! - **Per-pass resolution**: field sets are produced per operation kind and memoized for one pass only
//! - **Write path**: validate, fill, persist, then associate; the parent is untouched on failure
//! - **Serialization**: every candidate serialized with the route naming it, original route restored on exit
//! - **Seams**: entities, storage and descriptors are traits the host framework implements

pub mod config;
pub mod coordinator;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod locator;
pub mod model;
pub mod operation;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod serialize;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::MorphSettings;
pub use coordinator::{Association, InlineMorphTo, MorphToPayload, Resolution, WriteStage};
pub use descriptor::{ResourceDescriptor, TypeResolution};
pub use error::{ErrorKind, FieldError, MorphError, Result, StoreError, ValidationErrors, Violation};
pub use field::{Field, FieldSet};
pub use locator::{ActiveEntityLocator, Located};
pub use model::{EntityStore, Model, MorphParent};
pub use operation::ContextResolver;
pub use registry::{human_case, CandidateType, TypeList, TypeRegistry};
pub use request::{RequestContext, RouteState};
pub use resolver::FieldSetResolver;
pub use serialize::{SerializationAdapter, SerializedCandidate};
pub use types::{EntityId, Linkage, MorphReference, OperationKind, RelationKind};
