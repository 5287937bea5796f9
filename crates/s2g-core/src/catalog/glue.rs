//! AWS Glue catalog backend.
//!
//! Maps the permissive JSON table-definition model onto Glue's typed
//! `TableInput` for creation, and back from Glue's `Table` when an existing
//! entry has to be fetched for renaming. Absent optional fields stay absent
//! in both directions.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::CatalogError;
use crate::table::{
    Column, SchemaId, SchemaReference, SerdeInfo, SkewedInfo, SortColumn, StorageDescriptor,
    TableDefinition, TargetTable,
};
use crate::Result;
use async_trait::async_trait;
use aws_sdk_glue::error::DisplayErrorContext;
use aws_sdk_glue::primitives::DateTime;
use aws_sdk_glue::types as glue;
use aws_sdk_glue::Client as GlueClient;
use tracing::{debug, info, warn};

/// AWS Glue catalog client.
pub struct GlueCatalog {
    client: GlueClient,
    /// Glue catalog ID (defaults to the AWS account ID when unset)
    catalog_id: Option<String>,
}

impl GlueCatalog {
    /// Create a new Glue catalog client from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let region = config
            .catalog
            .aws_region
            .clone()
            .or_else(|| config.storage.aws_region.clone());

        if region.is_none() {
            warn!("Glue catalog without explicit AWS region will use environment defaults");
        }

        let sdk_config = crate::aws::sdk_config(
            region.as_deref(),
            config.storage.aws_access_key_id.as_deref(),
            config.storage.aws_secret_access_key.as_deref(),
        )
        .await;

        let client = GlueClient::new(&sdk_config);

        info!(
            region = region.as_deref().unwrap_or("<default>"),
            "AWS Glue catalog client initialized"
        );

        Ok(Self {
            client,
            catalog_id: config.catalog.catalog_id.clone(),
        })
    }
}

#[async_trait]
impl Catalog for GlueCatalog {
    async fn create_table(&self, definition: &TableDefinition) -> Result<()> {
        let table_input = build_table_input(definition)?;

        let result = self
            .client
            .create_table()
            .set_catalog_id(
                definition
                    .catalog_id
                    .clone()
                    .or_else(|| self.catalog_id.clone()),
            )
            .database_name(&definition.database_name)
            .table_input(table_input)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(
                    database = %definition.database_name,
                    table = %definition.name,
                    "Created Glue table"
                );
                Ok(())
            }
            Err(e) => {
                let error_str = DisplayErrorContext(e).to_string();
                if error_str.contains("AlreadyExistsException") {
                    debug!(
                        database = %definition.database_name,
                        table = %definition.name,
                        "Glue table already exists"
                    );
                    Err(CatalogError::AlreadyExists {
                        database: definition.database_name.clone(),
                        table: definition.name.clone(),
                    }
                    .into())
                } else {
                    Err(CatalogError::Operation(format!(
                        "Failed to create Glue table {}: {}",
                        definition.qualified_name(),
                        error_str
                    ))
                    .into())
                }
            }
        }
    }

    async fn get_table(&self, database: &str, table: &str) -> Result<TableDefinition> {
        let result = self
            .client
            .get_table()
            .set_catalog_id(self.catalog_id.clone())
            .database_name(database)
            .name(table)
            .send()
            .await;

        match result {
            Ok(output) => {
                let glue_table = output.table().ok_or_else(|| CatalogError::TableNotFound {
                    database: database.to_string(),
                    table: table.to_string(),
                })?;
                let mut definition = table_to_definition(glue_table);
                if definition.database_name.is_empty() {
                    definition.database_name = database.to_string();
                }
                Ok(definition)
            }
            Err(e) => {
                let error_str = DisplayErrorContext(e).to_string();
                if error_str.contains("EntityNotFoundException") {
                    Err(CatalogError::TableNotFound {
                        database: database.to_string(),
                        table: table.to_string(),
                    }
                    .into())
                } else {
                    Err(CatalogError::Operation(format!(
                        "Failed to get Glue table {}.{}: {}",
                        database, table, error_str
                    ))
                    .into())
                }
            }
        }
    }

    async fn delete_table(&self, database: &str, table: &str) -> Result<()> {
        let result = self
            .client
            .delete_table()
            .set_catalog_id(self.catalog_id.clone())
            .database_name(database)
            .name(table)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(database = %database, table = %table, "Deleted Glue table");
                Ok(())
            }
            Err(e) => {
                let error_str = DisplayErrorContext(e).to_string();
                if error_str.contains("EntityNotFoundException") {
                    Err(CatalogError::TableNotFound {
                        database: database.to_string(),
                        table: table.to_string(),
                    }
                    .into())
                } else {
                    Err(CatalogError::Operation(format!(
                        "Failed to delete Glue table {}.{}: {}",
                        database, table, error_str
                    ))
                    .into())
                }
            }
        }
    }
}

/// Build a Glue `TableInput` from a table definition.
pub fn build_table_input(definition: &TableDefinition) -> Result<glue::TableInput> {
    let mut builder = glue::TableInput::builder()
        .name(&definition.name)
        .set_description(definition.description.clone())
        .set_owner(definition.owner.clone())
        .set_last_access_time(definition.last_access_time.map(DateTime::from_secs_f64))
        .set_last_analyzed_time(definition.last_analyzed_time.map(DateTime::from_secs_f64))
        .set_retention(definition.retention)
        .set_view_original_text(definition.view_original_text.clone())
        .set_view_expanded_text(definition.view_expanded_text.clone())
        .set_table_type(definition.table_type.clone())
        .set_parameters(definition.parameters.clone())
        .set_target_table(definition.target_table.as_ref().map(build_target_table));

    if let Some(sd) = &definition.storage_descriptor {
        builder = builder.storage_descriptor(build_storage_descriptor(sd)?);
    }
    if let Some(keys) = &definition.partition_keys {
        builder = builder.set_partition_keys(Some(build_columns(keys)?));
    }

    builder.build().map_err(|e| {
        CatalogError::Operation(format!(
            "Failed to build table input for {}: {}",
            definition.qualified_name(),
            e
        ))
        .into()
    })
}

fn build_storage_descriptor(sd: &StorageDescriptor) -> Result<glue::StorageDescriptor> {
    let mut builder = glue::StorageDescriptor::builder()
        .set_location(sd.location.clone())
        .set_additional_locations(sd.additional_locations.clone())
        .set_input_format(sd.input_format.clone())
        .set_output_format(sd.output_format.clone())
        .set_compressed(sd.compressed)
        .set_number_of_buckets(sd.number_of_buckets)
        .set_bucket_columns(sd.bucket_columns.clone())
        .set_parameters(sd.parameters.clone())
        .set_stored_as_sub_directories(sd.stored_as_sub_directories);

    if let Some(columns) = &sd.columns {
        builder = builder.set_columns(Some(build_columns(columns)?));
    }
    if let Some(serde_info) = &sd.serde_info {
        builder = builder.serde_info(
            glue::SerDeInfo::builder()
                .set_name(serde_info.name.clone())
                .set_serialization_library(serde_info.serialization_library.clone())
                .set_parameters(serde_info.parameters.clone())
                .build(),
        );
    }
    if let Some(sort_columns) = &sd.sort_columns {
        builder = builder.set_sort_columns(Some(build_sort_columns(sort_columns)?));
    }
    if let Some(skewed) = &sd.skewed_info {
        builder = builder.skewed_info(
            glue::SkewedInfo::builder()
                .set_skewed_column_names(skewed.skewed_column_names.clone())
                .set_skewed_column_values(skewed.skewed_column_values.clone())
                .set_skewed_column_value_location_maps(
                    skewed.skewed_column_value_location_maps.clone(),
                )
                .build(),
        );
    }
    if let Some(reference) = &sd.schema_reference {
        builder = builder.schema_reference(build_schema_reference(reference));
    }

    Ok(builder.build())
}

fn build_columns(columns: &[Column]) -> Result<Vec<glue::Column>> {
    columns
        .iter()
        .map(|c| {
            glue::Column::builder()
                .name(&c.name)
                .set_type(c.r#type.clone())
                .set_comment(c.comment.clone())
                .set_parameters(c.parameters.clone())
                .build()
                .map_err(|e| {
                    CatalogError::Operation(format!("Failed to build column '{}': {}", c.name, e))
                        .into()
                })
        })
        .collect()
}

fn build_sort_columns(sort_columns: &[SortColumn]) -> Result<Vec<glue::Order>> {
    sort_columns
        .iter()
        .map(|s| {
            glue::Order::builder()
                .column(&s.column)
                .sort_order(s.sort_order)
                .build()
                .map_err(|e| {
                    CatalogError::Operation(format!(
                        "Failed to build sort column '{}': {}",
                        s.column, e
                    ))
                    .into()
                })
        })
        .collect()
}

fn build_schema_reference(reference: &SchemaReference) -> glue::SchemaReference {
    glue::SchemaReference::builder()
        .set_schema_id(reference.schema_id.as_ref().map(|id| {
            glue::SchemaId::builder()
                .set_schema_arn(id.schema_arn.clone())
                .set_registry_name(id.registry_name.clone())
                .set_schema_name(id.schema_name.clone())
                .build()
        }))
        .set_schema_version_id(reference.schema_version_id.clone())
        .set_schema_version_number(reference.schema_version_number)
        .build()
}

fn build_target_table(target: &TargetTable) -> glue::TableIdentifier {
    glue::TableIdentifier::builder()
        .set_catalog_id(target.catalog_id.clone())
        .set_database_name(target.database_name.clone())
        .set_name(target.name.clone())
        .build()
}

/// Convert a Glue `Table` (as returned by get_table) back into the model.
///
/// Used by the rename path, which recreates the existing entry under an
/// alias and therefore must carry every attribute across.
pub fn table_to_definition(table: &glue::Table) -> TableDefinition {
    TableDefinition {
        catalog_id: table.catalog_id().map(str::to_string),
        database_name: table.database_name().unwrap_or_default().to_string(),
        name: table.name().to_string(),
        description: table.description().map(str::to_string),
        owner: table.owner().map(str::to_string),
        last_access_time: table.last_access_time().map(|t| t.as_secs_f64()),
        last_analyzed_time: table.last_analyzed_time().map(|t| t.as_secs_f64()),
        retention: Some(table.retention()),
        storage_descriptor: table.storage_descriptor().map(descriptor_to_model),
        partition_keys: {
            let keys = table.partition_keys();
            (!keys.is_empty()).then(|| columns_to_model(keys))
        },
        view_original_text: table.view_original_text().map(str::to_string),
        view_expanded_text: table.view_expanded_text().map(str::to_string),
        table_type: table.table_type().map(str::to_string),
        parameters: table.parameters().cloned(),
        target_table: table.target_table().map(|t| TargetTable {
            catalog_id: t.catalog_id().map(str::to_string),
            database_name: t.database_name().map(str::to_string),
            name: t.name().map(str::to_string),
        }),
    }
}

fn descriptor_to_model(sd: &glue::StorageDescriptor) -> StorageDescriptor {
    StorageDescriptor {
        columns: {
            let columns = sd.columns();
            (!columns.is_empty()).then(|| columns_to_model(columns))
        },
        location: sd.location().map(str::to_string),
        additional_locations: {
            let locations = sd.additional_locations();
            (!locations.is_empty()).then(|| locations.to_vec())
        },
        input_format: sd.input_format().map(str::to_string),
        output_format: sd.output_format().map(str::to_string),
        compressed: Some(sd.compressed()),
        number_of_buckets: Some(sd.number_of_buckets()),
        serde_info: sd.serde_info().map(|si| SerdeInfo {
            name: si.name().map(str::to_string),
            serialization_library: si.serialization_library().map(str::to_string),
            parameters: si.parameters().cloned(),
        }),
        bucket_columns: {
            let columns = sd.bucket_columns();
            (!columns.is_empty()).then(|| columns.to_vec())
        },
        sort_columns: {
            let sorts = sd.sort_columns();
            (!sorts.is_empty()).then(|| {
                sorts
                    .iter()
                    .map(|o| SortColumn {
                        column: o.column().to_string(),
                        sort_order: o.sort_order(),
                    })
                    .collect()
            })
        },
        parameters: sd.parameters().cloned(),
        skewed_info: sd.skewed_info().map(|sk| SkewedInfo {
            skewed_column_names: {
                let names = sk.skewed_column_names();
                (!names.is_empty()).then(|| names.to_vec())
            },
            skewed_column_values: {
                let values = sk.skewed_column_values();
                (!values.is_empty()).then(|| values.to_vec())
            },
            skewed_column_value_location_maps: sk.skewed_column_value_location_maps().cloned(),
        }),
        stored_as_sub_directories: Some(sd.stored_as_sub_directories()),
        schema_reference: sd.schema_reference().map(|sr| SchemaReference {
            schema_id: sr.schema_id().map(|id| SchemaId {
                schema_arn: id.schema_arn().map(str::to_string),
                registry_name: id.registry_name().map(str::to_string),
                schema_name: id.schema_name().map(str::to_string),
            }),
            schema_version_id: sr.schema_version_id().map(str::to_string),
            schema_version_number: sr.schema_version_number(),
        }),
    }
}

fn columns_to_model(columns: &[glue::Column]) -> Vec<Column> {
    columns
        .iter()
        .map(|c| Column {
            name: c.name().to_string(),
            r#type: c.r#type().map(str::to_string),
            comment: c.comment().map(str::to_string),
            parameters: c.parameters().cloned(),
        })
        .collect()
}
