//! Table definition model.
//!
//! Mirrors the JSON shape of the serialized table definitions stored in S3,
//! which in turn follows the Glue `TableInput` structure (PascalCase keys).
//! Every field except the database and table names is optional pass-through
//! payload: the documents are authored by hand and intentionally permissive,
//! so nothing here is validated beyond being well-formed JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A complete table definition, the unit of work for reconciliation.
///
/// `database_name` and `name` together form the conflict key against the
/// catalog. Everything else is copied through to the catalog unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,

    pub database_name: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access_time: Option<f64>,

    /// Seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analyzed_time: Option<f64>,

    /// Retention period in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_descriptor: Option<StorageDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_keys: Option<Vec<Column>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_original_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_expanded_text: Option<String>,

    /// e.g. "EXTERNAL_TABLE" or "VIRTUAL_VIEW"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_table: Option<TargetTable>,
}

impl TableDefinition {
    /// Fully qualified `database.table` name.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database_name, self.name)
    }

    /// Derive a copy of this definition under a different table name,
    /// preserving every other attribute.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Overlay a physical storage location, replacing whatever location the
    /// document specified and creating the descriptor if it had none.
    pub fn set_location(&mut self, location: impl Into<String>) {
        self.storage_descriptor
            .get_or_insert_with(StorageDescriptor::default)
            .location = Some(location.into());
    }
}

/// Physical storage metadata for a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_locations: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_buckets: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serde_info: Option<SerdeInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_columns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_columns: Option<Vec<SortColumn>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skewed_info: Option<SkewedInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_as_sub_directories: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_reference: Option<SchemaReference>,
}

/// A single column of a table or partition key list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Column {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, String>>,
}

/// Serialization/deserialization library info.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerdeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialization_library: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, String>>,
}

/// Sort order for a bucketed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SortColumn {
    pub column: String,

    /// 1 ascending, 0 descending
    pub sort_order: i32,
}

/// Skewed-value metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SkewedInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skewed_column_names: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skewed_column_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skewed_column_value_location_maps: Option<HashMap<String, String>>,
}

/// Reference to a schema in the Glue schema registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchemaReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<SchemaId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version_number: Option<i64>,
}

/// Identifier for a registry schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchemaId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
}

/// Target of a resource-linked table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let json = r#"{"DatabaseName":"sales","Name":"orders","StorageDescriptor":{"Location":"s3://old/"}}"#;
        let def: TableDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(def.database_name, "sales");
        assert_eq!(def.name, "orders");
        assert_eq!(
            def.storage_descriptor.as_ref().unwrap().location.as_deref(),
            Some("s3://old/")
        );
        assert_eq!(def.qualified_name(), "sales.orders");
        assert!(def.owner.is_none());
    }

    #[test]
    fn test_parse_full_document() {
        let json = r#"{
            "CatalogId": "123456789012",
            "DatabaseName": "sales",
            "Name": "orders",
            "Description": "order history",
            "Owner": "alice",
            "LastAccessTime": 1704164645.0,
            "Retention": 30,
            "StorageDescriptor": {
                "Columns": [
                    {"Name": "order_id", "Type": "bigint"},
                    {"Name": "status", "Type": "string", "Comment": "order state"}
                ],
                "Location": "s3://old/",
                "InputFormat": "org.apache.hadoop.hive.ql.io.parquet.MapredParquetInputFormat",
                "OutputFormat": "org.apache.hadoop.hive.ql.io.parquet.MapredParquetOutputFormat",
                "Compressed": true,
                "NumberOfBuckets": 4,
                "SerdeInfo": {
                    "SerializationLibrary": "org.apache.hadoop.hive.ql.io.parquet.serde.ParquetHiveSerDe"
                },
                "BucketColumns": ["order_id"],
                "SortColumns": [{"Column": "order_id", "SortOrder": 1}],
                "Parameters": {"classification": "parquet"},
                "SkewedInfo": {"SkewedColumnNames": ["status"]},
                "StoredAsSubDirectories": false
            },
            "PartitionKeys": [{"Name": "ds", "Type": "string"}],
            "TableType": "EXTERNAL_TABLE",
            "Parameters": {"team": "data-platform"}
        }"#;
        let def: TableDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(def.catalog_id.as_deref(), Some("123456789012"));
        assert_eq!(def.owner.as_deref(), Some("alice"));
        assert_eq!(def.retention, Some(30));

        let sd = def.storage_descriptor.as_ref().unwrap();
        assert_eq!(sd.columns.as_ref().unwrap().len(), 2);
        assert_eq!(sd.number_of_buckets, Some(4));
        assert_eq!(sd.sort_columns.as_ref().unwrap()[0].sort_order, 1);
        assert_eq!(
            def.partition_keys.as_ref().unwrap()[0].name,
            "ds"
        );
        assert_eq!(def.table_type.as_deref(), Some("EXTERNAL_TABLE"));
    }

    #[test]
    fn test_with_name_preserves_attributes() {
        let json = r#"{"DatabaseName":"sales","Name":"orders","Owner":"alice"}"#;
        let def: TableDefinition = serde_json::from_str(json).unwrap();

        let renamed = def.with_name("orders_20240102_030405");
        assert_eq!(renamed.name, "orders_20240102_030405");
        assert_eq!(renamed.database_name, "sales");
        assert_eq!(renamed.owner.as_deref(), Some("alice"));
        // Original untouched
        assert_eq!(def.name, "orders");
    }

    #[test]
    fn test_set_location_overlays() {
        let json = r#"{"DatabaseName":"sales","Name":"orders","StorageDescriptor":{"Location":"s3://old/"}}"#;
        let mut def: TableDefinition = serde_json::from_str(json).unwrap();
        def.set_location("s3://bucket/sales/orders/");
        assert_eq!(
            def.storage_descriptor.as_ref().unwrap().location.as_deref(),
            Some("s3://bucket/sales/orders/")
        );
    }

    #[test]
    fn test_set_location_creates_descriptor() {
        let json = r#"{"DatabaseName":"sales","Name":"orders"}"#;
        let mut def: TableDefinition = serde_json::from_str(json).unwrap();
        def.set_location("s3://bucket/sales/orders/");
        assert_eq!(
            def.storage_descriptor.as_ref().unwrap().location.as_deref(),
            Some("s3://bucket/sales/orders/")
        );
    }

    #[test]
    fn test_roundtrip_keeps_pascal_case_keys() {
        let json = r#"{"DatabaseName":"sales","Name":"orders","Owner":"alice"}"#;
        let def: TableDefinition = serde_json::from_str(json).unwrap();
        let out = serde_json::to_string(&def).unwrap();
        assert!(out.contains("\"DatabaseName\""));
        assert!(out.contains("\"Owner\""));
        // Absent optionals are omitted, not serialized as null
        assert!(!out.contains("ViewOriginalText"));
    }
}
