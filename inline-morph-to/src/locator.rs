//! Finds which related entity, and which candidate, is active.

use tracing::{trace, warn};

use crate::descriptor::TypeResolution;
use crate::error::{MorphError, Result};
use crate::model::{Model, MorphParent};
use crate::registry::{CandidateType, TypeRegistry};

/// The currently associated entity and the candidate describing it.
#[derive(Debug)]
pub struct Located<'p, 'c> {
    pub entity: &'p dyn Model,
    pub candidate: &'c CandidateType,
}

pub struct ActiveEntityLocator<'c> {
    registry: &'c TypeRegistry,
    resolution: &'c dyn TypeResolution,
}

impl<'c> ActiveEntityLocator<'c> {
    pub fn new(registry: &'c TypeRegistry, resolution: &'c dyn TypeResolution) -> Self {
        Self {
            registry,
            resolution,
        }
    }

    /// `Ok(None)` when nothing is associated. An entity whose type is not
    /// registered is a configuration drift and fails.
    pub fn locate<'p>(
        &self,
        parent: &'p dyn MorphParent,
        attribute: &str,
    ) -> Result<Option<Located<'p, 'c>>> {
        let Some(entity) = parent.morph_related(attribute) else {
            trace!(attribute, "no related entity");
            return Ok(None);
        };

        let entity_type = entity.entity_type();
        let candidate = self
            .resolution
            .resource_for_entity_type(entity_type)
            .and_then(|identifier| self.registry.get(&identifier));

        match candidate {
            Some(candidate) => {
                trace!(
                    attribute,
                    entity_type,
                    identifier = %candidate.identifier(),
                    "located related entity"
                );
                Ok(Some(Located { entity, candidate }))
            }
            None => {
                warn!(attribute, entity_type, "related entity type is not registered");
                Err(MorphError::unregistered(entity_type))
            }
        }
    }
}
