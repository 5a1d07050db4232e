//! One resolution pass over candidate field sets.
//!
//! A resolver is created per pass (one read, one write, one serialization) and
//! memoizes the field set of each candidate it is asked about. Passes never
//! share field sets: visibility and resolved values differ per context.

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::trace;

use crate::descriptor::ResourceDescriptor;
use crate::error::{FieldError, MorphError, Result};
use crate::field::FieldSet;
use crate::model::Model;
use crate::registry::CandidateType;
use crate::request::RequestContext;
use crate::types::OperationKind;

pub struct FieldSetResolver<'r> {
    operation: OperationKind,
    request: &'r RequestContext,
    resolved: IndexMap<String, FieldSet>,
}

impl<'r> FieldSetResolver<'r> {
    pub fn new(operation: OperationKind, request: &'r RequestContext) -> Self {
        Self {
            operation,
            request,
            resolved: IndexMap::new(),
        }
    }

    /// A pass for the request's own operation kind
    pub fn for_request(request: &'r RequestContext) -> Self {
        Self::new(request.operation(), request)
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn request(&self) -> &'r RequestContext {
        self.request
    }

    /// The candidate's field set for this pass, produced on first use.
    pub fn fields(&mut self, candidate: &CandidateType) -> Result<&mut FieldSet> {
        match self.resolved.entry(candidate.identifier().to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let descriptor = candidate.descriptor();
                let fresh = descriptor.new_model();
                let set = produce(descriptor, self.operation, fresh.as_ref(), self.request)
                    .map_err(|e| MorphError::descriptor(candidate.identifier(), e))?;
                trace!(
                    identifier = %candidate.identifier(),
                    operation = ?self.operation,
                    fields = set.len(),
                    "resolved candidate field set"
                );
                Ok(entry.insert(set))
            }
        }
    }

    /// An already-produced field set
    pub fn get(&self, identifier: &str) -> Option<&FieldSet> {
        self.resolved.get(identifier)
    }

    pub fn is_resolved(&self, identifier: &str) -> bool {
        self.resolved.contains_key(identifier)
    }
}

fn produce(
    descriptor: &dyn ResourceDescriptor,
    operation: OperationKind,
    model: &dyn Model,
    request: &RequestContext,
) -> std::result::Result<FieldSet, FieldError> {
    match operation {
        OperationKind::Creation => descriptor.creation_fields(model, request),
        OperationKind::Update => descriptor.update_fields(model, request),
        OperationKind::Detail => descriptor.detail_fields(model, request),
        OperationKind::Index => descriptor.index_fields(model, request),
        OperationKind::Generic => descriptor.available_fields(model, request),
    }
}
