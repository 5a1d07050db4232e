//! Per-operation request context and its ambient route state.

use serde_json::{Map, Value};
use std::cell::RefCell;

use crate::operation::ContextResolver;
use crate::types::OperationKind;

/// Route parameters nested fields read while serializing.
///
/// The active resource identifier is the one piece of request state the core
/// mutates; every mutation goes through a save/restore scope.
#[derive(Debug, Default)]
pub struct RouteState {
    resource: RefCell<Option<String>>,
}

impl RouteState {
    pub fn new(resource: Option<String>) -> Self {
        Self {
            resource: RefCell::new(resource),
        }
    }

    /// Identifier of the resource the route currently names
    pub fn active_resource(&self) -> Option<String> {
        self.resource.borrow().clone()
    }

    pub fn set_active_resource(&self, resource: Option<String>) {
        *self.resource.borrow_mut() = resource;
    }
}

/// Everything one incoming operation carries into the field.
#[derive(Debug)]
pub struct RequestContext {
    operation: OperationKind,
    payload: Map<String, Value>,
    route: RouteState,
}

impl RequestContext {
    pub fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            payload: Map::new(),
            route: RouteState::default(),
        }
    }

    /// Build a context from the caller's operation signal
    pub fn for_signal(signal: Option<&str>) -> Self {
        Self::new(ContextResolver::classify(signal))
    }

    /// Add one submitted attribute
    pub fn with_input(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(attribute.into(), value.into());
        self
    }

    /// Replace the submitted payload
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Set the resource the route names
    pub fn with_resource(self, resource: impl Into<String>) -> Self {
        self.route.set_active_resource(Some(resource.into()));
        self
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn input(&self, attribute: &str) -> Option<&Value> {
        self.payload.get(attribute)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn route(&self) -> &RouteState {
        &self.route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_payload_and_route() {
        let request = RequestContext::for_signal(Some("update-field"))
            .with_input("title", "Hello")
            .with_resource("comments");

        assert_eq!(request.operation(), OperationKind::Update);
        assert_eq!(request.input("title"), Some(&Value::from("Hello")));
        assert!(request.input("body").is_none());
        assert_eq!(request.route().active_resource().as_deref(), Some("comments"));
    }

    #[test]
    fn route_state_is_mutable_through_shared_reference() {
        let request = RequestContext::new(OperationKind::Detail);
        assert!(request.route().active_resource().is_none());

        request.route().set_active_resource(Some("videos".into()));
        assert_eq!(request.route().active_resource().as_deref(), Some("videos"));
    }
}
