//! Schema document storage and resolution.
//!
//! Table definitions are stored as JSON documents in object storage, keyed
//! by `{prefix}/{database}/{table}.json`. The resolver fetches a document
//! and overlays the manifest's storage location onto it, producing the
//! complete definition handed to the reconciler.

use crate::config::StorageConfig;
use crate::error::SchemaError;
use crate::table::TableDefinition;
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Key-value fetch capability over the schema document store.
///
/// Implementations must distinguish a missing key (`SchemaError::NotFound`)
/// from other storage failures (`SchemaError::Storage`).
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Fetch the raw document at `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// S3-backed schema store.
pub struct S3SchemaStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3SchemaStore {
    /// Create a new S3 schema store from storage configuration.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let sdk_config = crate::aws::sdk_config(
            config.aws_region.as_deref(),
            config.aws_access_key_id.as_deref(),
            config.aws_secret_access_key.as_deref(),
        )
        .await;

        let client = match &config.s3_endpoint {
            Some(endpoint) => {
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                aws_sdk_s3::Client::from_conf(s3_config)
            }
            None => aws_sdk_s3::Client::new(&sdk_config),
        };

        info!(bucket = %config.bucket, "S3 schema store initialized");

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl SchemaStore for S3SchemaStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let error_str = aws_sdk_s3::error::DisplayErrorContext(e).to_string();
                if error_str.contains("NoSuchKey") {
                    SchemaError::NotFound { key: key.to_string() }
                } else {
                    SchemaError::Storage(format!(
                        "Failed to fetch s3://{}/{}: {}",
                        self.bucket, key, error_str
                    ))
                }
            })?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| SchemaError::Storage(format!("Failed to read s3://{}/{}: {}", self.bucket, key, e)))?;

        Ok(bytes.into_bytes().to_vec())
    }
}

/// In-process schema store, for local validation and tests.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under `key`.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.objects.write().insert(key.into(), value.into());
    }
}

#[async_trait]
impl SchemaStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound { key: key.to_string() }.into())
    }
}

/// Resolves (database, table, location) into a complete table definition.
pub struct SchemaResolver {
    store: Arc<dyn SchemaStore>,
    prefix: String,
}

impl SchemaResolver {
    /// Create a resolver over `store`, with documents keyed under `prefix`.
    pub fn new(store: Arc<dyn SchemaStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Storage key for a table's schema document.
    pub fn key(&self, database: &str, table: &str) -> String {
        format!("{}/{}/{}.json", self.prefix, database, table)
    }

    /// Fetch the schema document for `database.table` and overlay `s3_path`
    /// as the storage location. Issues exactly one storage read.
    pub async fn resolve(
        &self,
        database: &str,
        table: &str,
        s3_path: &str,
    ) -> Result<TableDefinition> {
        let key = self.key(database, table);
        let bytes = self.store.get(&key).await?;

        let mut definition: TableDefinition =
            serde_json::from_slice(&bytes).map_err(|e| SchemaError::Parse {
                key: key.clone(),
                message: e.to_string(),
            })?;

        definition.set_location(s3_path);

        debug!(
            database = %database,
            table = %table,
            location = %s3_path,
            "Resolved table definition"
        );

        Ok(definition)
    }
}
