//! s2g core - S3 to Glue table deployment
//!
//! This library reconciles versioned table definitions stored in S3 with
//! the AWS Glue Data Catalog as part of a data pipeline release:
//!
//! - Manifest of (database, table, location) rows describing what must exist
//! - Schema documents fetched from object storage and completed with the
//!   manifest's storage location
//! - Conflict resolution by policy (replace, or rename out of the way)

pub mod aws;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod reconcile;
pub mod schema;
pub mod table;

// Re-export commonly used types
pub use config::{Config, ReconcilePolicy};
pub use error::{CatalogError, ManifestError, SchemaError};
pub use error::{Error, Result};
pub use table::TableDefinition;
