//! Error types for tiny worlds.

use crate::logic::{SchemaError, UnifyFailure};
use thiserror::Error;

/// The main error type for tiny world operations.
#[derive(Debug, Error)]
pub enum TinyWorldError {
    /// Malformed type hierarchy, schema, or task configuration
    #[error("config error: {0}")]
    Config(String),

    /// Malformed relation or rule text
    #[error("parse error at {location}: {message}")]
    Parse { location: String, message: String },

    /// A rule or fact does not fit the story's relation schema
    #[error("SchemaError:{0}")]
    Schema(#[from] SchemaError),

    /// A fact could not be unified into the scene
    #[error("UnifyFailure:{0}")]
    Unify(#[from] UnifyFailure),

    /// The matcher exceeded its branch budget
    #[error("rule `{rule}` exceeded the branch limit of {limit}")]
    BranchLimit { rule: String, limit: usize },

    /// Config (de)serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a config file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tiny world operations.
pub type Result<T> = std::result::Result<T, TinyWorldError>;
