//! Table catalog capability.
//!
//! The catalog is the system of record mapping (database, table) names to
//! schema and location metadata. The reconciler only ever needs three
//! operations against it, abstracted here so backends can be substituted:
//!
//! - **Glue**: the AWS Glue Data Catalog
//! - **Memory**: an in-process map, for local validation and tests

pub mod glue;
pub mod memory;

pub use glue::GlueCatalog;
pub use memory::MemoryCatalog;

use crate::config::{CatalogType, Config};
use crate::table::TableDefinition;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Catalog operations required by reconciliation.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Create a catalog entry for `definition`.
    ///
    /// Fails with `CatalogError::AlreadyExists` when an entry with the same
    /// database and table name is already present, and
    /// `CatalogError::Operation` for any other failure.
    async fn create_table(&self, definition: &TableDefinition) -> Result<()>;

    /// Fetch the full definition of an existing entry.
    async fn get_table(&self, database: &str, table: &str) -> Result<TableDefinition>;

    /// Delete an entry by name.
    async fn delete_table(&self, database: &str, table: &str) -> Result<()>;
}

/// Build the catalog backend selected by configuration.
pub async fn from_config(config: &Config) -> Result<Arc<dyn Catalog>> {
    match config.catalog.catalog_type {
        CatalogType::Glue => Ok(Arc::new(GlueCatalog::new(config).await?)),
        CatalogType::Memory => Ok(Arc::new(MemoryCatalog::new())),
    }
}
