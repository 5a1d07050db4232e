//! Field settings loaded through figment.
//!
//! Precedence, lowest first: built-in defaults, an optional settings file
//! (TOML, YAML or JSON by extension), then `INLINE_MORPH_*` environment variables.

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "INLINE_MORPH_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphSettings {
    /// UI component that renders the field
    pub component: String,
    /// Whether the field shows on index screens
    pub listable: bool,
    /// Inject linkage metadata into nested relation fields on read
    pub link_relations: bool,
}

impl Default for MorphSettings {
    fn default() -> Self {
        Self {
            component: "inline-morph-to".to_string(),
            listable: true,
            link_relations: true,
        }
    }
}

impl MorphSettings {
    /// Defaults only
    pub fn figment() -> Figment {
        Figment::new().merge(Serialized::defaults(Self::default()))
    }

    /// Defaults overridden by the environment
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment().merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Defaults overridden by a settings file, then by the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Figment::from(Yaml::file(path)),
            Some("json") => Figment::from(Json::file(path)),
            _ => Figment::from(Toml::file(path)),
        };
        debug!(path = %path.display(), "loading morph-to settings");
        Self::from_figment(
            Self::figment()
                .merge(file)
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }
}
