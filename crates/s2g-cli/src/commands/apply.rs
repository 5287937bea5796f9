//! Apply command implementation.

use anyhow::Result;
use s2g_core::engine::ReconcileEngine;
use s2g_core::Config;
use std::path::PathBuf;
use tracing::info;

/// Reconcile every manifest table against the catalog.
pub async fn run(
    mut config: Config,
    bucket: Option<String>,
    manifest: Option<PathBuf>,
    policy: Option<String>,
) -> Result<()> {
    // Apply CLI overrides
    if let Some(b) = bucket {
        config.storage.bucket = b;
    }
    if let Some(m) = manifest {
        config.manifest.path = m;
    }
    if let Some(p) = policy {
        config.reconcile.policy = p.as_str().into();
    }

    config.validate()?;

    info!(
        bucket = %config.storage.bucket,
        manifest = %config.manifest.path.display(),
        policy = %config.reconcile.policy,
        "Starting apply"
    );

    let engine = ReconcileEngine::new(config).await?;
    let summary = engine.run().await?;

    info!(
        reconciled = summary.reconciled,
        skipped = summary.skipped,
        "Apply finished"
    );
    Ok(())
}
