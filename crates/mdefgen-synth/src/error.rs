//! Error types for sample extraction and query synthesis.

use std::path::PathBuf;
use thiserror::Error;

/// Synthesis errors.
#[derive(Error, Debug)]
pub enum SynthError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Result document missing on disk.
    #[error("Result document not found: {0}")]
    NotFound(PathBuf),

    /// Result document is not well-formed XML or lacks a required attribute.
    #[error("Malformed result document: {0}")]
    MalformedResult(String),

    /// A baseline result disagrees with the diff schema it was produced from.
    #[error("Result for table {table} does not match the metadata: {reason}")]
    ResultMismatch { table: String, reason: String },

    /// A table produced no usable sampled values at all.
    #[error("Table {table} has no sampled values")]
    EmptySample { table: String },

    /// A sample-driven category was requested without a sample map.
    #[error("No sampled values available; the baseline run produced nothing to sample")]
    MissingSamples,

    /// The stored-procedure category was requested without procedure arguments.
    #[error("No stored procedure arguments configured for suite {suite}")]
    MissingProcedures { suite: String },
}

/// Result type for synthesis operations.
pub type Result<T> = std::result::Result<T, SynthError>;
