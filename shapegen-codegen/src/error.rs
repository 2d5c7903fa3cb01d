//! Error types for entity loading and code generation.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for entity loading operations.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Entity file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Entity file could not be parsed.
    #[error("failed to parse '{}': {source}", path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: shapegen_schema::ParseError,
    },

    /// Entity document was read but does not define the requested entity.
    #[error("entity '{name}' is not defined in '{}'", path.display())]
    EntityMissing {
        /// Qualified entity name.
        name: String,
        /// File path.
        path: PathBuf,
    },

    /// Entity was loaded but failed validation.
    #[error("invalid entity: {0}")]
    Schema(#[from] shapegen_schema::SchemaError),

    /// Base directory does not exist.
    #[error("base directory '{}' does not exist", path.display())]
    BaseDirMissing {
        /// Directory path.
        path: PathBuf,
    },

    /// No entity is known under this name.
    #[error("entity '{name}' not found")]
    NotFound {
        /// Requested name.
        name: String,
    },

    /// Invalid glob pattern.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Directory traversal error.
    #[error("directory traversal error: {0}")]
    Glob(#[from] glob::GlobError),
}

impl LoadError {
    /// Creates a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Entity document parsing error.
    #[error("entity parse error: {0}")]
    Parse(#[from] shapegen_schema::ParseError),

    /// Entity validation error.
    #[error("entity error: {0}")]
    Schema(#[from] shapegen_schema::SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity loading error.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Requested root entity cannot be resolved.
    #[error("entity '{name}' not found")]
    EntityNotFound {
        /// Requested name.
        name: String,
    },
}

impl CodegenError {
    /// Creates an entity not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::EntityNotFound { name: name.into() }
    }
}
