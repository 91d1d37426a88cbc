//! Error types for metadata parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Metadata model errors.
#[derive(Error, Debug)]
pub enum MdefError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata file not found.
    #[error("Metadata file not found: {0}")]
    NotFound(PathBuf),

    /// The document is missing required keys or has the wrong shape.
    #[error("Malformed metadata in {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    /// Two tables (virtual or not) share a name.
    #[error("Metadata in {source_name} contains more than one table named {name}")]
    DuplicateName { source_name: String, name: String },
}

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, MdefError>;
