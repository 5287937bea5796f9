//! Error types for the s2g core library.
//!
//! Uses hierarchical domain-specific errors following the thiserror pattern.

use thiserror::Error;

/// Result type alias for s2g operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for s2g.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest-related error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Schema document error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Catalog-related error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Manifest-specific errors.
///
/// A malformed row aborts the whole run: the manifest is a release
/// artifact and a missing field means the artifact itself is broken.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// A required field is absent or empty in a manifest row
    #[error("Missing required field '{field}' in manifest row {row}")]
    MissingField { field: &'static str, row: usize },

    /// The manifest could not be read or parsed as CSV
    #[error("Failed to read manifest: {0}")]
    Csv(#[from] csv::Error),
}

/// Schema-document errors.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// No schema document exists at the expected key
    #[error("Schema document not found at '{key}'")]
    NotFound { key: String },

    /// The schema document is not valid JSON for a table definition
    #[error("Schema document at '{key}' is not valid: {message}")]
    Parse { key: String, message: String },

    /// Any other storage failure (permissions, connectivity, throttling)
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Catalog-specific errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A table with this name already exists.
    ///
    /// Handled internally by the reconciler's policy branches and never
    /// surfaced to callers of `reconcile`, except when a rename alias
    /// itself collides (two conflicts within the same second).
    #[error("Table already exists: {database}.{table}")]
    AlreadyExists { database: String, table: String },

    /// Table not found
    #[error("Table not found: {database}.{table}")]
    TableNotFound { database: String, table: String },

    /// Unrecognized reconciliation policy
    #[error("Invalid policy '{0}': expected 'replace' or 'rename'")]
    InvalidPolicy(String),

    /// Conflict persisted through the bounded retry budget
    #[error("Conflict on {database}.{table} persisted after {attempts} attempts")]
    ConflictRetriesExhausted {
        database: String,
        table: String,
        attempts: u32,
    },

    /// Any other catalog failure (permissions, throttling, malformed request)
    #[error("Catalog operation failed: {0}")]
    Operation(String),
}

// Conversion implementations for external error types

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
