//! FILENAME: app/worker/src/config.rs
//! PURPOSE: Settings for a spawned worker.

use engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub engine: EngineConfig,
    /// When set, log lines are also appended to this file.
    pub log_file: Option<PathBuf>,
}

impl WorkerConfig {
    /// Engine settings from the environment, plus `TABLE_LOG_FILE`.
    pub fn from_env() -> Self {
        WorkerConfig {
            engine: EngineConfig::from_env(),
            log_file: std::env::var_os("TABLE_LOG_FILE").map(PathBuf::from),
        }
    }
}
