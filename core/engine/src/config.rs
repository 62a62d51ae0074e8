//! FILENAME: core/engine/src/config.rs
//! PURPOSE: Engine-wide settings with environment overrides.

use serde::{Deserialize, Serialize};

/// How column types are determined at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeMode {
    /// The `type` field of each column spec decides; anything else is a String column.
    #[default]
    Declared,
    /// Undeclared columns are typed from the first data row, and columns
    /// without a formula get a default one (average or row count).
    Inferred,
}

impl TypeMode {
    pub fn parse(s: &str) -> Option<TypeMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "declared" => Some(TypeMode::Declared),
            "inferred" => Some(TypeMode::Inferred),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used by `select rows` when the request carries no usable limit.
    pub default_limit: usize,
    pub type_mode: TypeMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_limit: 50,
            type_mode: TypeMode::Declared,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TABLE_DEFAULT_LIMIT`: page size for `select rows`
    /// - `TABLE_TYPE_MODE`: `declared` or `inferred`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TABLE_DEFAULT_LIMIT") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.default_limit = v;
            }
        }

        if let Ok(s) = std::env::var("TABLE_TYPE_MODE") {
            if let Some(mode) = TypeMode::parse(&s) {
                cfg.type_mode = mode;
            }
        }

        cfg
    }
}
