//! Classification of the caller's operation signal.

use crate::types::OperationKind;

/// Maps the route/controller tag a caller passes in to an [`OperationKind`].
pub struct ContextResolver;

impl ContextResolver {
    /// Classify a signal. Unknown or absent signals are `Generic`.
    pub fn classify(signal: Option<&str>) -> OperationKind {
        let Some(signal) = signal else {
            return OperationKind::Generic;
        };
        let normalized: String = signal
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "creation-field" | "creation" => OperationKind::Creation,
            "update-field" | "update" => OperationKind::Update,
            "resource-show" | "detail" => OperationKind::Detail,
            "resource-index" | "index" => OperationKind::Index,
            _ => OperationKind::Generic,
        }
    }
}

impl From<&str> for OperationKind {
    fn from(signal: &str) -> Self {
        ContextResolver::classify(Some(signal))
    }
}
