// config lets you read a separate config file, with environment overrides
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Environment variables with this prefix override file settings,
/// e.g. `FABRICA_RQL_MAX_CLAUSES=16`. Values are parsed into the type of
/// the setting they replace.
pub const ENV_PREFIX: &str = "FABRICA_RQL";

/// Limits and knobs for parsing and building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RqlSettings {
    /// Maximum number of clauses (predicates and directives) in one string.
    pub max_clauses: usize,
    /// Maximum number of values a single predicate may carry.
    pub max_values: usize,
    /// Maximum length of the RQL text in bytes.
    pub max_length: usize,
    /// Wildcard character in like patterns. Empty disables wildcards.
    pub like_wildcard: String,
    /// Page size used by query plans when the text has no `limit(...)`.
    pub default_limit: Option<usize>,
}

impl Default for RqlSettings {
    fn default() -> Self {
        Self {
            max_clauses: 64,
            max_values: 256,
            max_length: 4096,
            like_wildcard: "*".to_owned(),
            default_limit: None,
        }
    }
}

impl RqlSettings {
    /// Loads `rql.toml` (or any other supported format named `rql.*`) from the
    /// working directory when present, then applies environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from("rql")
    }
    pub fn load_from(name: &str) -> Result<Self> {
        let settings: RqlSettings = Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        debug!(?settings, source = name, "settings loaded");
        Ok(settings)
    }
    pub fn wildcard(&self) -> Option<char> {
        self.like_wildcard.chars().next()
    }
}
