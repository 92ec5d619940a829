//! Immutable, versioned table metadata.
//!
//! A [`TableMetadata`] value describes one committed version of a table. It is
//! never mutated after it is written: every `with_*` method returns a new value
//! that becomes the next version once committed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IcebergError, IcebergResult};

/// Table property selecting the data file format.
pub const DEFAULT_FILE_FORMAT_PROPERTY: &str = "write.format.default";

/// Table property holding the table comment.
pub const COMMENT_PROPERTY: &str = "comment";

/// Properties that move data or metadata files outside the table location.
///
/// Dropping such a table could delete files that belong to something else.
pub const PATH_OVERRIDE_PROPERTIES: [&str; 4] = [
    "write.object-storage.path",
    "write.folder-storage.path",
    "write.data.path",
    "write.metadata.path",
];

/// Current format version written by this crate.
pub const FORMAT_VERSION: i32 = 2;

/// Data file format of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileFormat {
    /// Apache Parquet.
    #[default]
    Parquet,
    /// Apache ORC.
    Orc,
    /// Apache Avro.
    Avro,
}

impl FileFormat {
    /// File name extension for data files of this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Orc => "orc",
            Self::Avro => "avro",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parquet => "PARQUET",
            Self::Orc => "ORC",
            Self::Avro => "AVRO",
        };
        f.write_str(name)
    }
}

impl FromStr for FileFormat {
    type Err = IcebergError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PARQUET" => Ok(Self::Parquet),
            "ORC" => Ok(Self::Orc),
            "AVRO" => Ok(Self::Avro),
            other => Err(IcebergError::invalid_metadata(format!(
                "unsupported file format: {other}"
            ))),
        }
    }
}

/// A field in a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedField {
    /// Unique field ID.
    pub id: i32,
    /// Field name.
    pub name: String,
    /// Whether the field is required.
    pub required: bool,
    /// Field type name (`long`, `string`, `decimal(10,2)`, ...).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Column comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl NestedField {
    /// Creates an optional field.
    #[must_use]
    pub fn optional(id: i32, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            required: false,
            field_type: field_type.into(),
            doc: None,
        }
    }

    /// Creates a required field.
    #[must_use]
    pub fn required(id: i32, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            required: true,
            ..Self::optional(id, name, field_type)
        }
    }

    /// Sets the column comment.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// Table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema ID.
    #[serde(rename = "schema-id")]
    pub schema_id: i32,

    /// Schema type (always "struct" for table schemas).
    #[serde(rename = "type", default = "default_struct_type")]
    pub schema_type: String,

    /// Schema fields.
    #[serde(default)]
    pub fields: Vec<NestedField>,
}

fn default_struct_type() -> String {
    "struct".to_string()
}

impl Schema {
    /// Creates schema 0 with the given fields.
    #[must_use]
    pub fn new(fields: Vec<NestedField>) -> Self {
        Self {
            schema_id: 0,
            schema_type: default_struct_type(),
            fields,
        }
    }

    /// Looks up a field by ID.
    #[must_use]
    pub fn field(&self, id: i32) -> Option<&NestedField> {
        self.fields.iter().find(|field| field.id == id)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&NestedField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Highest field ID in the schema.
    #[must_use]
    pub fn highest_field_id(&self) -> i32 {
        self.fields.iter().map(|field| field.id).max().unwrap_or(0)
    }
}

/// Partition transform applied to a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Transform {
    /// Source value unmodified.
    Identity,
    /// Year of a date or timestamp.
    Year,
    /// Month of a date or timestamp.
    Month,
    /// Day of a date or timestamp.
    Day,
    /// Hour of a timestamp.
    Hour,
    /// Hash of the value modulo `n`.
    Bucket(u32),
    /// Value truncated to width `w`.
    Truncate(u32),
    /// Always null.
    Void,
}

impl Transform {
    /// Renders the partition field the way engines accept it in DDL.
    #[must_use]
    pub fn render(self, column: &str) -> String {
        match self {
            Self::Identity => column.to_string(),
            Self::Year => format!("year({column})"),
            Self::Month => format!("month({column})"),
            Self::Day => format!("day({column})"),
            Self::Hour => format!("hour({column})"),
            Self::Bucket(n) => format!("bucket({column}, {n})"),
            Self::Truncate(w) => format!("truncate({column}, {w})"),
            Self::Void => format!("void({column})"),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Year => f.write_str("year"),
            Self::Month => f.write_str("month"),
            Self::Day => f.write_str("day"),
            Self::Hour => f.write_str("hour"),
            Self::Bucket(n) => write!(f, "bucket[{n}]"),
            Self::Truncate(w) => write!(f, "truncate[{w}]"),
            Self::Void => f.write_str("void"),
        }
    }
}

impl FromStr for Transform {
    type Err = IcebergError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parametrized = |prefix: &str| -> Option<IcebergResult<u32>> {
            let inner = s.strip_prefix(prefix)?.strip_suffix(']')?;
            Some(inner.parse().map_err(|_| {
                IcebergError::invalid_metadata(format!("invalid transform argument: {s}"))
            }))
        };

        match s {
            "identity" => Ok(Self::Identity),
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "void" => Ok(Self::Void),
            _ => {
                if let Some(n) = parametrized("bucket[") {
                    return n.map(Self::Bucket);
                }
                if let Some(w) = parametrized("truncate[") {
                    return w.map(Self::Truncate);
                }
                Err(IcebergError::invalid_metadata(format!("unknown transform: {s}")))
            }
        }
    }
}

impl TryFrom<String> for Transform {
    type Error = IcebergError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Transform> for String {
    fn from(value: Transform) -> Self {
        value.to_string()
    }
}

/// A field in a partition spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionField {
    /// Source column ID.
    #[serde(rename = "source-id")]
    pub source_id: i32,
    /// Partition field ID.
    #[serde(rename = "field-id")]
    pub field_id: i32,
    /// Partition field name.
    pub name: String,
    /// Transform applied to the source column.
    pub transform: Transform,
}

/// Partition spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    /// Spec ID.
    #[serde(rename = "spec-id")]
    pub spec_id: i32,
    /// Partition fields.
    #[serde(default)]
    pub fields: Vec<PartitionField>,
}

impl PartitionSpec {
    /// The unpartitioned spec.
    #[must_use]
    pub fn unpartitioned() -> Self {
        Self {
            spec_id: 0,
            fields: Vec::new(),
        }
    }

    /// Builds spec 0 from `(source column, transform)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::InvalidMetadata`] when a column is not in `schema`.
    pub fn builder_for(schema: &Schema, columns: &[(&str, Transform)]) -> IcebergResult<Self> {
        let mut fields = Vec::with_capacity(columns.len());
        for (offset, (column, transform)) in (1000..).zip(columns) {
            let source = schema.field_by_name(column).ok_or_else(|| {
                IcebergError::invalid_metadata(format!("partition column not in schema: {column}"))
            })?;
            let name = match transform {
                Transform::Identity => (*column).to_string(),
                Transform::Bucket(_) => format!("{column}_bucket"),
                Transform::Truncate(_) => format!("{column}_trunc"),
                other => format!("{column}_{other}"),
            };
            fields.push(PartitionField {
                source_id: source.id,
                field_id: offset,
                name,
                transform: *transform,
            });
        }
        Ok(Self { spec_id: 0, fields })
    }

    /// Builds spec 0 from rendered partition fields (`col`, `day(col)`,
    /// `bucket(col, 16)`, ...), the inverse of [`TableMetadata::partition_fields`].
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::InvalidMetadata`] for unparsable fields or
    /// columns missing from `schema`.
    pub fn from_rendered_fields(schema: &Schema, rendered: &[String]) -> IcebergResult<Self> {
        let parsed = rendered
            .iter()
            .map(|field| parse_partition_field(field))
            .collect::<IcebergResult<Vec<_>>>()?;
        let columns: Vec<(&str, Transform)> = parsed
            .iter()
            .map(|(column, transform)| (column.as_str(), *transform))
            .collect();
        Self::builder_for(schema, &columns)
    }

    /// Returns true when the spec has no non-void fields.
    #[must_use]
    pub fn is_unpartitioned(&self) -> bool {
        self.fields
            .iter()
            .all(|field| field.transform == Transform::Void)
    }
}

/// Parses one rendered partition field into its source column and transform.
fn parse_partition_field(field: &str) -> IcebergResult<(String, Transform)> {
    let invalid = || IcebergError::invalid_metadata(format!("invalid partition field: {field}"));
    let field = field.trim();
    let Some((function, rest)) = field.split_once('(') else {
        if field.is_empty() {
            return Err(invalid());
        }
        return Ok((field.to_string(), Transform::Identity));
    };
    let args = rest.strip_suffix(')').ok_or_else(invalid)?;
    let mut args = args.split(',').map(str::trim);
    let column = args.next().filter(|c| !c.is_empty()).ok_or_else(invalid)?;
    let argument = args.next();
    if args.next().is_some() {
        return Err(invalid());
    }

    let transform = match (function.trim().to_ascii_lowercase().as_str(), argument) {
        ("year", None) => Transform::Year,
        ("month", None) => Transform::Month,
        ("day", None) => Transform::Day,
        ("hour", None) => Transform::Hour,
        ("void", None) => Transform::Void,
        ("bucket", Some(n)) => Transform::Bucket(n.parse().map_err(|_| invalid())?),
        ("truncate", Some(w)) => Transform::Truncate(w.parse().map_err(|_| invalid())?),
        _ => return Err(invalid()),
    };
    Ok((column.to_string(), transform))
}

/// A committed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot ID.
    #[serde(rename = "snapshot-id")]
    pub snapshot_id: i64,
    /// Parent snapshot ID.
    #[serde(rename = "parent-snapshot-id", skip_serializing_if = "Option::is_none")]
    pub parent_snapshot_id: Option<i64>,
    /// Sequence number.
    #[serde(rename = "sequence-number")]
    pub sequence_number: i64,
    /// Commit timestamp in milliseconds.
    #[serde(rename = "timestamp-ms")]
    pub timestamp_ms: i64,
    /// Location of the manifest list.
    #[serde(rename = "manifest-list")]
    pub manifest_list: String,
    /// Snapshot summary (`operation`, `added-data-files`, ...).
    #[serde(default)]
    pub summary: BTreeMap<String, String>,
    /// Schema ID at commit time.
    #[serde(rename = "schema-id")]
    pub schema_id: i32,
}

/// Entry in the metadata log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataLogEntry {
    /// Location of a previous metadata file.
    #[serde(rename = "metadata-file")]
    pub metadata_file: String,
    /// Timestamp when that file was replaced.
    #[serde(rename = "timestamp-ms")]
    pub timestamp_ms: i64,
}

/// One immutable version of a table's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Format version.
    #[serde(rename = "format-version")]
    pub format_version: i32,

    /// Unique table identifier.
    #[serde(rename = "table-uuid")]
    pub table_uuid: Uuid,

    /// Table location (root path for data and metadata).
    pub location: String,

    /// Last sequence number assigned.
    #[serde(rename = "last-sequence-number")]
    pub last_sequence_number: i64,

    /// Last updated timestamp in milliseconds.
    #[serde(rename = "last-updated-ms")]
    pub last_updated_ms: i64,

    /// Last assigned column ID.
    #[serde(rename = "last-column-id")]
    pub last_column_id: i32,

    /// Current schema ID.
    #[serde(rename = "current-schema-id")]
    pub current_schema_id: i32,

    /// All schemas.
    pub schemas: Vec<Schema>,

    /// Default partition spec ID.
    #[serde(rename = "default-spec-id")]
    pub default_spec_id: i32,

    /// Partition specs.
    #[serde(rename = "partition-specs")]
    pub partition_specs: Vec<PartitionSpec>,

    /// Table properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    /// Current snapshot ID.
    #[serde(rename = "current-snapshot-id", skip_serializing_if = "Option::is_none")]
    pub current_snapshot_id: Option<i64>,

    /// All snapshots.
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,

    /// Metadata log (previous metadata files, oldest first).
    #[serde(rename = "metadata-log", default)]
    pub metadata_log: Vec<MetadataLogEntry>,

    /// Where this version was read from or written to. Not part of the file.
    #[serde(skip)]
    pub metadata_location: Option<String>,
}

impl TableMetadata {
    /// Creates the first version of a new table.
    #[must_use]
    pub fn new(
        location: impl Into<String>,
        schema: Schema,
        spec: PartitionSpec,
        properties: BTreeMap<String, String>,
        now_ms: i64,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            table_uuid: Uuid::new_v4(),
            location: location.into().trim_end_matches('/').to_string(),
            last_sequence_number: 0,
            last_updated_ms: now_ms,
            last_column_id: schema.highest_field_id(),
            current_schema_id: schema.schema_id,
            default_spec_id: spec.spec_id,
            schemas: vec![schema],
            partition_specs: vec![spec],
            properties,
            current_snapshot_id: None,
            snapshots: Vec::new(),
            metadata_log: Vec::new(),
            metadata_location: None,
        }
    }

    /// Parses a metadata file.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::InvalidMetadata`] for malformed JSON or a
    /// metadata file whose current schema or spec is missing.
    pub fn from_json(bytes: &[u8], metadata_location: &str) -> IcebergResult<Self> {
        let mut metadata: Self = serde_json::from_slice(bytes).map_err(|err| {
            IcebergError::invalid_metadata(format!("{metadata_location}: {err}"))
        })?;
        if metadata.current_schema().is_none() || metadata.default_spec().is_none() {
            return Err(IcebergError::invalid_metadata(format!(
                "{metadata_location}: current schema or default spec missing"
            )));
        }
        metadata.metadata_location = Some(metadata_location.to_string());
        Ok(metadata)
    }

    /// Serializes this version for writing.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::InvalidMetadata`] if serialization fails.
    pub fn to_json(&self) -> IcebergResult<Bytes> {
        serde_json::to_vec_pretty(self)
            .map(Bytes::from)
            .map_err(|err| IcebergError::invalid_metadata(err.to_string()))
    }

    /// Returns the current schema.
    #[must_use]
    pub fn current_schema(&self) -> Option<&Schema> {
        self.schemas
            .iter()
            .find(|schema| schema.schema_id == self.current_schema_id)
    }

    /// Returns the default partition spec.
    #[must_use]
    pub fn default_spec(&self) -> Option<&PartitionSpec> {
        self.partition_specs
            .iter()
            .find(|spec| spec.spec_id == self.default_spec_id)
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        let id = self.current_snapshot_id?;
        self.snapshots.iter().find(|s| s.snapshot_id == id)
    }

    /// Returns the table's data file format.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::InvalidMetadata`] for an unknown format name.
    pub fn file_format(&self) -> IcebergResult<FileFormat> {
        self.properties
            .get(DEFAULT_FILE_FORMAT_PROPERTY)
            .map_or(Ok(FileFormat::default()), |name| name.parse())
    }

    /// Renders the default spec's partition fields (`col`, `bucket(col, 16)`, ...).
    ///
    /// Fields whose source column is missing from the current schema are skipped.
    #[must_use]
    pub fn partition_fields(&self) -> Vec<String> {
        let (Some(schema), Some(spec)) = (self.current_schema(), self.default_spec()) else {
            return Vec::new();
        };
        spec.fields
            .iter()
            .filter(|field| field.transform != Transform::Void)
            .filter_map(|field| {
                schema
                    .field(field.source_id)
                    .map(|source| field.transform.render(&source.name))
            })
            .collect()
    }

    /// Returns the table comment property.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.properties.get(COMMENT_PROPERTY).map(String::as_str)
    }

    /// Returns the path-override properties set on this table.
    #[must_use]
    pub fn path_overrides(&self) -> Vec<&'static str> {
        PATH_OVERRIDE_PROPERTIES
            .into_iter()
            .filter(|key| self.properties.contains_key(*key))
            .collect()
    }

    /// Returns the next version with `property` set (or removed for `None`).
    #[must_use]
    pub fn with_property(&self, property: &str, value: Option<String>, now_ms: i64) -> Self {
        let mut next = self.next_version(now_ms);
        match value {
            Some(value) => next.properties.insert(property.to_string(), value),
            None => next.properties.remove(property),
        };
        next
    }

    /// Returns the next version with a column comment changed.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::NotFound`] when the column is not in the
    /// current schema.
    pub fn with_column_doc(
        &self,
        column: &str,
        doc: Option<String>,
        now_ms: i64,
    ) -> IcebergResult<Self> {
        let mut next = self.next_version(now_ms);
        let current = next.current_schema_id;
        let field = next
            .schemas
            .iter_mut()
            .find(|schema| schema.schema_id == current)
            .and_then(|schema| schema.fields.iter_mut().find(|f| f.name == column))
            .ok_or_else(|| IcebergError::NotFound {
                message: format!("column {column}"),
            })?;
        field.doc = doc;
        Ok(next)
    }

    /// Returns the next version with `snapshot` as the current snapshot.
    #[must_use]
    pub fn with_snapshot(&self, snapshot: Snapshot, now_ms: i64) -> Self {
        let mut next = self.next_version(now_ms);
        next.last_sequence_number = snapshot.sequence_number;
        next.current_snapshot_id = Some(snapshot.snapshot_id);
        next.snapshots.push(snapshot);
        next
    }

    /// Copies this version into a successor that records it in the log.
    fn next_version(&self, now_ms: i64) -> Self {
        let mut next = self.clone();
        if let Some(previous) = self.metadata_location.clone() {
            next.metadata_log.push(MetadataLogEntry {
                metadata_file: previous,
                timestamp_ms: now_ms,
            });
        }
        next.last_updated_ms = now_ms;
        next.metadata_location = None;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_schema() -> Schema {
        Schema::new(vec![
            NestedField::required(1, "order_id", "long"),
            NestedField::optional(2, "order_ts", "timestamptz"),
            NestedField::optional(3, "customer", "string"),
        ])
    }

    #[test]
    fn test_transform_parse_and_display() {
        for raw in ["identity", "day", "bucket[16]", "truncate[10]", "void"] {
            let transform: Transform = raw.parse().expect("parse");
            assert_eq!(transform.to_string(), raw);
        }
        assert!("bucket[x]".parse::<Transform>().is_err());
        assert!("zorder".parse::<Transform>().is_err());
    }

    #[test]
    fn test_partition_fields_rendering() {
        let schema = orders_schema();
        let spec = PartitionSpec::builder_for(
            &schema,
            &[
                ("order_ts", Transform::Day),
                ("customer", Transform::Bucket(16)),
                ("order_id", Transform::Identity),
            ],
        )
        .expect("spec");
        let metadata = TableMetadata::new("memory://wh/t", schema, spec, BTreeMap::new(), 1);

        assert_eq!(
            metadata.partition_fields(),
            vec!["day(order_ts)", "bucket(customer, 16)", "order_id"]
        );
    }

    #[test]
    fn test_rendered_fields_parse_back() {
        let schema = orders_schema();
        let rendered = vec![
            "day(order_ts)".to_string(),
            "bucket(customer, 16)".to_string(),
            "order_id".to_string(),
        ];
        let spec = PartitionSpec::from_rendered_fields(&schema, &rendered).expect("spec");
        let metadata = TableMetadata::new("memory://wh/t", schema.clone(), spec, BTreeMap::new(), 1);
        assert_eq!(metadata.partition_fields(), rendered);

        for bad in ["", "bucket(customer)", "day(order_ts", "zorder(a)", "missing"] {
            assert!(
                PartitionSpec::from_rendered_fields(&schema, &[bad.to_string()]).is_err(),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_file_format_defaults_to_parquet() {
        let mut metadata = TableMetadata::new(
            "memory://wh/t",
            orders_schema(),
            PartitionSpec::unpartitioned(),
            BTreeMap::new(),
            1,
        );
        assert_eq!(metadata.file_format().expect("format"), FileFormat::Parquet);

        metadata
            .properties
            .insert(DEFAULT_FILE_FORMAT_PROPERTY.into(), "orc".into());
        assert_eq!(metadata.file_format().expect("format"), FileFormat::Orc);
    }

    #[test]
    fn test_json_roundtrip_keeps_location_out_of_file() {
        let mut metadata = TableMetadata::new(
            "memory://wh/t/",
            orders_schema(),
            PartitionSpec::unpartitioned(),
            BTreeMap::new(),
            1,
        );
        metadata.metadata_location = Some("memory://wh/t/metadata/00000-a.metadata.json".into());

        let bytes = metadata.to_json().expect("json");
        assert!(!String::from_utf8_lossy(&bytes).contains("00000-a"));

        let parsed = TableMetadata::from_json(&bytes, "memory://x").expect("parse");
        assert_eq!(parsed.location, "memory://wh/t");
        assert_eq!(parsed.metadata_location.as_deref(), Some("memory://x"));
    }

    #[test]
    fn test_next_version_logs_previous_file() {
        let mut metadata = TableMetadata::new(
            "memory://wh/t",
            orders_schema(),
            PartitionSpec::unpartitioned(),
            BTreeMap::new(),
            1,
        );
        metadata.metadata_location = Some("memory://wh/t/metadata/00000-a.metadata.json".into());

        let next = metadata.with_property(COMMENT_PROPERTY, Some("orders".into()), 2);
        assert_eq!(next.comment(), Some("orders"));
        assert_eq!(next.metadata_log.len(), 1);
        assert!(next.metadata_location.is_none());
        assert!(metadata.comment().is_none());

        let err = next
            .with_column_doc("missing", None, 3)
            .expect_err("unknown column");
        assert!(err.is_not_found());
    }
}
