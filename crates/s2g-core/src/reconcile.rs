//! Table reconciliation.
//!
//! Ensures a catalog entry exists for each table definition, resolving name
//! conflicts according to the configured policy:
//!
//! - **replace**: delete the existing entry, then create the new one
//! - **rename**: move the existing entry to a timestamped alias, then create
//!   the new one under the canonical name
//!
//! Conflict handling runs as a bounded loop rather than recursion: every
//! policy branch clears the obstruction and retries the create. The
//! delete-then-create sequence is not atomic against the catalog; a
//! concurrent actor can recreate the entry between the two calls, which
//! shows up as a fresh conflict on the retry and eventually as
//! `ConflictRetriesExhausted`.

use crate::catalog::Catalog;
use crate::config::ReconcilePolicy;
use crate::error::CatalogError;
use crate::table::TableDefinition;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Reconciles table definitions against the catalog.
///
/// Holds no state across calls: every conflict is resolved from catalog
/// truth at the moment of the call.
pub struct Reconciler {
    catalog: Arc<dyn Catalog>,
    policy: ReconcilePolicy,
    max_conflict_attempts: u32,
}

impl Reconciler {
    /// Create a reconciler over `catalog` with the given conflict policy.
    pub fn new(catalog: Arc<dyn Catalog>, policy: ReconcilePolicy, max_conflict_attempts: u32) -> Self {
        Self {
            catalog,
            policy,
            max_conflict_attempts,
        }
    }

    /// Ensure a catalog entry exists for `definition`.
    ///
    /// Idempotent with respect to final catalog state, but not in the number
    /// of catalog calls issued. Conflict errors are consumed by the policy
    /// branches; every other catalog error surfaces to the caller unretried.
    pub async fn reconcile(&self, definition: TableDefinition) -> Result<()> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.catalog.create_table(&definition).await {
                Ok(()) => {
                    info!(
                        database = %definition.database_name,
                        table = %definition.name,
                        attempts,
                        "Table reconciled"
                    );
                    return Ok(());
                }
                Err(Error::Catalog(CatalogError::AlreadyExists { .. })) => {
                    if attempts >= self.max_conflict_attempts {
                        return Err(CatalogError::ConflictRetriesExhausted {
                            database: definition.database_name.clone(),
                            table: definition.name.clone(),
                            attempts,
                        }
                        .into());
                    }
                    self.clear_conflict(&definition).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Clear the existing entry blocking `definition`, per policy.
    async fn clear_conflict(&self, definition: &TableDefinition) -> Result<()> {
        match &self.policy {
            ReconcilePolicy::Replace => {
                warn!(
                    database = %definition.database_name,
                    table = %definition.name,
                    "Name conflict: replacing existing table"
                );
                self.catalog
                    .delete_table(&definition.database_name, &definition.name)
                    .await
            }
            ReconcilePolicy::Rename => {
                self.rename_existing(definition).await
            }
            ReconcilePolicy::Other(policy) => {
                warn!(
                    database = %definition.database_name,
                    table = %definition.name,
                    policy = %policy,
                    "Invalid policy, expected 'replace' or 'rename'; skipping table"
                );
                Err(CatalogError::InvalidPolicy(policy.clone()).into())
            }
        }
    }

    /// Move the existing entry out of the way under a timestamped alias.
    ///
    /// The alias keeps every attribute of the existing entry; only the name
    /// changes. If deleting the original fails after the alias was created,
    /// both entries remain in the catalog and the error surfaces; nothing is
    /// rolled back.
    async fn rename_existing(&self, definition: &TableDefinition) -> Result<()> {
        let existing = self
            .catalog
            .get_table(&definition.database_name, &definition.name)
            .await?;

        let alias = format!("{}_{}", existing.name, timestamp_suffix(Utc::now()));
        warn!(
            database = %definition.database_name,
            table = %definition.name,
            alias = %alias,
            "Name conflict: renaming existing table"
        );

        // Two conflicts on the same table within one second derive the same
        // alias; the collision surfaces here as AlreadyExists.
        self.catalog.create_table(&existing.with_name(alias.as_str())).await?;

        self.catalog
            .delete_table(&existing.database_name, &existing.name)
            .await
    }
}

/// Wall-clock suffix appended to a renamed table, second resolution.
fn timestamp_suffix(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::Result;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn definition(json: &str) -> TableDefinition {
        serde_json::from_str(json).unwrap()
    }

    fn orders(owner: &str) -> TableDefinition {
        definition(&format!(
            r#"{{"DatabaseName":"sales","Name":"orders","Owner":"{}"}}"#,
            owner
        ))
    }

    fn reconciler(catalog: Arc<dyn Catalog>, policy: ReconcilePolicy) -> Reconciler {
        Reconciler::new(catalog, policy, 5)
    }

    #[test]
    fn test_timestamp_suffix_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(timestamp_suffix(at), "20240102_030405");
    }

    #[tokio::test]
    async fn test_no_conflict_creates_once() {
        let catalog = Arc::new(MemoryCatalog::new());
        let r = reconciler(catalog.clone(), ReconcilePolicy::Rename);

        r.reconcile(orders("alice")).await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.create_calls(), 1);
        assert_eq!(
            catalog.get("sales", "orders").unwrap().owner.as_deref(),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn test_replace_overwrites_existing() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.insert(orders("bob"));

        let r = reconciler(catalog.clone(), ReconcilePolicy::Replace);
        r.reconcile(orders("alice")).await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("sales", "orders").unwrap().owner.as_deref(),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn test_replace_is_idempotent() {
        let catalog = Arc::new(MemoryCatalog::new());
        let r = reconciler(catalog.clone(), ReconcilePolicy::Replace);

        r.reconcile(orders("alice")).await.unwrap();
        r.reconcile(orders("alice")).await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("sales", "orders").unwrap().owner.as_deref(),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn test_rename_keeps_old_table_under_alias() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.insert(orders("bob"));

        let r = reconciler(catalog.clone(), ReconcilePolicy::Rename);
        r.reconcile(orders("alice")).await.unwrap();

        assert_eq!(catalog.len(), 2);

        // Canonical name carries the incoming definition.
        assert_eq!(
            catalog.get("sales", "orders").unwrap().owner.as_deref(),
            Some("alice")
        );

        // The alias carries the old entry's attributes unchanged.
        let alias = catalog
            .entries()
            .into_iter()
            .find(|t| t.name != "orders")
            .unwrap();
        assert!(alias.name.starts_with("orders_"));
        assert_eq!(alias.name.len(), "orders_20240102_030405".len());
        assert_eq!(alias.owner.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_invalid_policy_leaves_catalog_unchanged() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.insert(orders("bob"));

        let r = reconciler(catalog.clone(), ReconcilePolicy::Other("merge".into()));
        let err = r.reconcile(orders("alice")).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Catalog(CatalogError::InvalidPolicy(ref p)) if p == "merge"
        ));
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("sales", "orders").unwrap().owner.as_deref(),
            Some("bob")
        );
        assert_eq!(catalog.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_policy_without_conflict_still_creates() {
        // The policy only matters when a conflict actually occurs.
        let catalog = Arc::new(MemoryCatalog::new());
        let r = reconciler(catalog.clone(), ReconcilePolicy::Other("merge".into()));

        r.reconcile(orders("alice")).await.unwrap();
        assert_eq!(catalog.len(), 1);
    }

    /// Catalog that reports a conflict on every create, modeling a
    /// concurrent actor recreating the entry between delete and create.
    struct AlwaysConflicting {
        create_calls: std::sync::atomic::AtomicU32,
    }

    #[async_trait]
    impl Catalog for AlwaysConflicting {
        async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
            self.create_calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(CatalogError::AlreadyExists {
                database: definition.database_name.clone(),
                table: definition.name.clone(),
            }
            .into())
        }

        async fn get_table(&self, _: &str, _: &str) -> Result<TableDefinition> {
            unreachable!("replace policy never fetches")
        }

        async fn delete_table(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_persistent_conflict_is_bounded() {
        let catalog = Arc::new(AlwaysConflicting {
            create_calls: std::sync::atomic::AtomicU32::new(0),
        });
        let r = Reconciler::new(catalog.clone(), ReconcilePolicy::Replace, 3);

        let err = r.reconcile(orders("alice")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::ConflictRetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(
            catalog.create_calls.load(std::sync::atomic::Ordering::SeqCst),
            3
        );
    }

    /// Wrapper that fails deletes, for exercising the accepted
    /// two-entries-left failure mode of the rename path.
    struct FailingDelete {
        inner: Arc<MemoryCatalog>,
    }

    #[async_trait]
    impl Catalog for FailingDelete {
        async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
            self.inner.create_table(definition).await
        }

        async fn get_table(&self, database: &str, table: &str) -> Result<TableDefinition> {
            self.inner.get_table(database, table).await
        }

        async fn delete_table(&self, _: &str, _: &str) -> Result<()> {
            Err(CatalogError::Operation("access denied".into()).into())
        }
    }

    #[tokio::test]
    async fn test_rename_with_failing_delete_leaves_both_entries() {
        let inner = Arc::new(MemoryCatalog::new());
        inner.insert(orders("bob"));

        let r = reconciler(
            Arc::new(FailingDelete { inner: inner.clone() }),
            ReconcilePolicy::Rename,
        );
        let err = r.reconcile(orders("alice")).await.unwrap_err();

        // The failure surfaces; the alias and the original both remain.
        assert!(matches!(err, Error::Catalog(CatalogError::Operation(_))));
        assert_eq!(inner.len(), 2);
        assert_eq!(
            inner.get("sales", "orders").unwrap().owner.as_deref(),
            Some("bob")
        );
    }

    #[tokio::test]
    async fn test_operation_error_is_not_retried() {
        struct Denied;

        #[async_trait]
        impl Catalog for Denied {
            async fn create_table(&self, _: &TableDefinition) -> Result<()> {
                Err(CatalogError::Operation("throttled".into()).into())
            }
            async fn get_table(&self, _: &str, _: &str) -> Result<TableDefinition> {
                unreachable!()
            }
            async fn delete_table(&self, _: &str, _: &str) -> Result<()> {
                unreachable!()
            }
        }

        let r = reconciler(Arc::new(Denied), ReconcilePolicy::Replace);
        let err = r.reconcile(orders("alice")).await.unwrap_err();
        assert!(matches!(err, Error::Catalog(CatalogError::Operation(_))));
    }
}
