//! Configuration structures for s2g.
//!
//! Configuration is loaded from TOML files and can be overridden via CLI flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Schema storage configuration
    pub storage: StorageConfig,

    /// Catalog configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Manifest configuration
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Reconciliation configuration
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Monitoring configuration
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Schema storage (S3) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Bucket holding the serialized table definitions
    pub bucket: String,

    /// AWS region (falls back to environment defaults when unset)
    pub aws_region: Option<String>,

    /// AWS access key ID
    pub aws_access_key_id: Option<String>,

    /// AWS secret access key
    pub aws_secret_access_key: Option<String>,

    /// S3 endpoint (for MinIO or other S3-compatible storage)
    pub s3_endpoint: Option<String>,

    /// Key prefix under which schema documents live
    #[serde(default = "default_schema_prefix")]
    pub schema_prefix: String,
}

/// Catalog backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Catalog backend type
    #[serde(default)]
    pub catalog_type: CatalogType,

    /// Glue catalog ID (defaults to the AWS account ID)
    pub catalog_id: Option<String>,

    /// AWS region for the Glue catalog (falls back to storage region)
    pub aws_region: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_type: CatalogType::default(),
            catalog_id: None,
            aws_region: None,
        }
    }
}

/// Catalog backend type.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogType {
    /// AWS Glue Data Catalog
    #[default]
    Glue,
    /// In-process catalog, for local validation and tests
    Memory,
}

/// Manifest source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestConfig {
    /// Path to the manifest CSV
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
        }
    }
}

/// Reconciliation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Conflict resolution policy
    #[serde(default)]
    pub policy: ReconcilePolicy,

    /// Maximum create attempts per table before giving up.
    ///
    /// The delete-then-create sequence is not transactional against the
    /// catalog; a concurrent actor can recreate the entry between the two
    /// calls. The cap turns that pathological interleaving into an error
    /// instead of an unbounded retry.
    #[serde(default = "default_max_conflict_attempts")]
    pub max_conflict_attempts: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            policy: ReconcilePolicy::default(),
            max_conflict_attempts: default_max_conflict_attempts(),
        }
    }
}

/// Conflict resolution policy for table creation.
///
/// Unrecognized values are preserved rather than rejected at parse time;
/// the reconciler reports them when (and only when) a conflict actually
/// requires a policy decision, so tables without conflicts still deploy.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcilePolicy {
    /// Delete the existing entry, then create the new one
    Replace,
    /// Move the existing entry to a timestamped alias, then create the new one
    Rename,
    /// Anything else found in config or on the command line
    Other(String),
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        ReconcilePolicy::Rename
    }
}

impl From<&str> for ReconcilePolicy {
    fn from(s: &str) -> Self {
        match s {
            "replace" => ReconcilePolicy::Replace,
            "rename" => ReconcilePolicy::Rename,
            other => ReconcilePolicy::Other(other.to_string()),
        }
    }
}

impl FromStr for ReconcilePolicy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcilePolicy::Replace => write!(f, "replace"),
            ReconcilePolicy::Rename => write!(f, "rename"),
            ReconcilePolicy::Other(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for ReconcilePolicy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ReconcilePolicy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Monitoring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured logs
    #[default]
    Json,
    /// Human-readable text logs
    Text,
}

impl Config {
    /// Minimal configuration for a bucket, everything else defaulted.
    /// Used when no configuration file is present and the bucket comes from
    /// the command line.
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Self {
            storage: StorageConfig {
                bucket: bucket.into(),
                aws_region: None,
                aws_access_key_id: None,
                aws_secret_access_key: None,
                s3_endpoint: None,
                schema_prefix: default_schema_prefix(),
            },
            catalog: CatalogConfig::default(),
            manifest: ManifestConfig::default(),
            reconcile: ReconcileConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.storage.bucket.is_empty() {
            return Err(crate::Error::Config(
                "storage.bucket must not be empty".into(),
            ));
        }
        if self.reconcile.max_conflict_attempts == 0 {
            return Err(crate::Error::Config(
                "reconcile.max_conflict_attempts must be at least 1".into(),
            ));
        }
        if let ReconcilePolicy::Other(p) = &self.reconcile.policy {
            // Not fatal at load time: the reconciler reports it per table.
            tracing::warn!(policy = %p, "Unrecognized reconcile policy in configuration");
        }
        Ok(())
    }
}

fn default_schema_prefix() -> String {
    "glue/table".to_string()
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("manifest.csv")
}

fn default_max_conflict_attempts() -> u32 {
    5
}
