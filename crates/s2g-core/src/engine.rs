//! Reconciliation engine.
//!
//! Drives the pipeline: manifest row -> resolved definition -> reconciled
//! catalog entry. Tables are processed one at a time, each fully (including
//! conflict resolution) before the next manifest row begins.

use crate::catalog::{self, Catalog};
use crate::config::Config;
use crate::error::CatalogError;
use crate::manifest::ManifestReader;
use crate::reconcile::Reconciler;
use crate::schema::{S3SchemaStore, SchemaResolver, SchemaStore};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Tables successfully reconciled
    pub reconciled: usize,
    /// Tables skipped because the policy was invalid at conflict time
    pub skipped: usize,
}

/// The reconciliation engine.
pub struct ReconcileEngine {
    config: Config,
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn SchemaStore>,
}

impl ReconcileEngine {
    /// Build an engine with backends selected by configuration.
    pub async fn new(config: Config) -> Result<Self> {
        let catalog = catalog::from_config(&config).await?;
        let store = Arc::new(S3SchemaStore::new(&config.storage).await?);
        Ok(Self::with_capabilities(config, catalog, store))
    }

    /// Build an engine over explicitly provided capabilities.
    pub fn with_capabilities(
        config: Config,
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn SchemaStore>,
    ) -> Self {
        Self {
            config,
            catalog,
            store,
        }
    }

    /// Reconcile every table listed in the manifest.
    ///
    /// A malformed manifest row or a bad schema document aborts the run; an
    /// invalid policy is reported for its table and the run continues.
    pub async fn run(&self) -> Result<RunSummary> {
        let resolver = SchemaResolver::new(
            Arc::clone(&self.store),
            self.config.storage.schema_prefix.clone(),
        );
        let reconciler = Reconciler::new(
            Arc::clone(&self.catalog),
            self.config.reconcile.policy.clone(),
            self.config.reconcile.max_conflict_attempts,
        );

        info!(
            manifest = %self.config.manifest.path.display(),
            bucket = %self.config.storage.bucket,
            policy = %self.config.reconcile.policy,
            "Starting reconciliation run"
        );

        let mut summary = RunSummary::default();

        for row in ManifestReader::open(&self.config.manifest.path)? {
            let row = row?;
            let definition = resolver
                .resolve(&row.database_name, &row.table_name, &row.s3_path)
                .await?;

            match reconciler.reconcile(definition).await {
                Ok(()) => summary.reconciled += 1,
                Err(Error::Catalog(CatalogError::InvalidPolicy(policy))) => {
                    error!(
                        database = %row.database_name,
                        table = %row.table_name,
                        policy = %policy,
                        "Skipping table: invalid reconcile policy"
                    );
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            reconciled = summary.reconciled,
            skipped = summary.skipped,
            "Reconciliation run complete"
        );

        Ok(summary)
    }
}
