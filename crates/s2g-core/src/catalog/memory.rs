//! In-process catalog backend.
//!
//! Holds entries in a map keyed by (database, table). Used for local
//! validation runs against a manifest without touching AWS, and by tests
//! as the substitute for the Glue backend.

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::table::TableDefinition;
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory catalog of table definitions.
#[derive(Default)]
pub struct MemoryCatalog {
    tables: RwLock<HashMap<(String, String), TableDefinition>>,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly, bypassing conflict detection.
    pub fn insert(&self, definition: TableDefinition) {
        self.tables.write().insert(
            (definition.database_name.clone(), definition.name.clone()),
            definition,
        );
    }

    /// Look up an entry without going through the capability trait.
    pub fn get(&self, database: &str, table: &str) -> Option<TableDefinition> {
        self.tables
            .read()
            .get(&(database.to_string(), table.to_string()))
            .cloned()
    }

    /// All entries, in no particular order.
    pub fn entries(&self) -> Vec<TableDefinition> {
        self.tables.read().values().cloned().collect()
    }

    /// Number of entries currently in the catalog.
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Number of create calls issued against this catalog.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of delete calls issued against this catalog.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let key = (definition.database_name.clone(), definition.name.clone());
        let mut tables = self.tables.write();
        if tables.contains_key(&key) {
            return Err(CatalogError::AlreadyExists {
                database: definition.database_name.clone(),
                table: definition.name.clone(),
            }
            .into());
        }
        tables.insert(key, definition.clone());
        Ok(())
    }

    async fn get_table(&self, database: &str, table: &str) -> Result<TableDefinition> {
        self.get(database, table).ok_or_else(|| {
            CatalogError::TableNotFound {
                database: database.to_string(),
                table: table.to_string(),
            }
            .into()
        })
    }

    async fn delete_table(&self, database: &str, table: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        self.tables
            .write()
            .remove(&(database.to_string(), table.to_string()))
            .map(|_| ())
            .ok_or_else(|| {
                CatalogError::TableNotFound {
                    database: database.to_string(),
                    table: table.to_string(),
                }
                .into()
            })
    }
}
