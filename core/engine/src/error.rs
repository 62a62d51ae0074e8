//! FILENAME: core/engine/src/error.rs

use thiserror::Error;

/// Canonical result for the table engine.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing or malformed `cols`/`rows` at initialization. Fatal to the table.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid filter pattern for column {column}: {source}")]
    Pattern {
        column: String,
        #[source]
        source: regex::Error,
    },
}
