//! View and materialized-view definitions and their record encoding.
//!
//! A definition is stored in the record's original-text field as
//! `/* Presto View: <base64 JSON> */` (or `Presto Materialized View`), which any
//! engine reading the metastore sees as an opaque comment. The expanded-text
//! field holds a fixed marker.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hivecat_iceberg::FileFormat;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::identifier::CatalogSchemaTableName;

/// Record comment marking views written by this catalog.
pub const VIEW_COMMENT: &str = "Presto View";

/// Record comment marking materialized views written by this catalog.
pub const MATERIALIZED_VIEW_COMMENT: &str = "Presto Materialized View";

/// Expanded text of view records.
pub const VIEW_EXPANDED_TEXT_MARKER: &str = "/* Presto View */";

/// Expanded text of materialized-view records.
pub const MATERIALIZED_VIEW_EXPANDED_TEXT_MARKER: &str = "/* Presto Materialized View */";

const VIEW_PREFIX: &str = "/* Presto View: ";
const MATERIALIZED_VIEW_PREFIX: &str = "/* Presto Materialized View: ";
const SUFFIX: &str = " */";

/// An output column of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewColumn {
    /// Column name.
    pub name: String,
    /// Engine type name (`bigint`, `varchar`, ...).
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ViewColumn {
    /// Creates a column.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A logical view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDefinition {
    /// Query text as written by the user.
    pub original_sql: String,
    /// Catalog the query was resolved in.
    #[serde(default)]
    pub catalog: Option<String>,
    /// Schema the query was resolved in.
    #[serde(default)]
    pub schema: Option<String>,
    /// Output columns.
    pub columns: Vec<ViewColumn>,
    /// View comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Owner whose privileges the view runs with.
    #[serde(default)]
    pub owner: Option<String>,
    /// Whether the view runs with the invoker's privileges.
    #[serde(default)]
    pub run_as_invoker: bool,
}

impl ViewDefinition {
    /// Returns the definition with the owner removed.
    #[must_use]
    pub fn without_owner(&self) -> Self {
        Self {
            owner: None,
            ..self.clone()
        }
    }
}

/// Storage-table properties of a materialized view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedViewProperties {
    /// File format of the storage table. Defaults to the catalog default.
    pub format: Option<FileFormat>,
    /// Partition fields (`col`, `day(col)`, `bucket(col, 16)`, ...).
    pub partitioning: Vec<String>,
}

/// A materialized view backed by a storage table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedViewDefinition {
    /// Query text as written by the user.
    pub original_sql: String,
    /// The storage table; set on definitions read from the catalog.
    pub storage_table: Option<CatalogSchemaTableName>,
    /// Catalog the query was resolved in.
    pub catalog: Option<String>,
    /// Schema the query was resolved in.
    pub schema: Option<String>,
    /// Output columns.
    pub columns: Vec<ViewColumn>,
    /// Comment.
    pub comment: Option<String>,
    /// Owner of the view record.
    pub owner: Option<String>,
    /// Storage-table properties. On reads these reflect the live storage table.
    pub properties: MaterializedViewProperties,
}

/// The part of a materialized-view definition persisted in the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredMaterializedView {
    pub(crate) original_sql: String,
    #[serde(default)]
    pub(crate) catalog: Option<String>,
    #[serde(default)]
    pub(crate) schema: Option<String>,
    pub(crate) columns: Vec<ViewColumn>,
    #[serde(default)]
    pub(crate) comment: Option<String>,
}

impl From<&MaterializedViewDefinition> for StoredMaterializedView {
    fn from(definition: &MaterializedViewDefinition) -> Self {
        Self {
            original_sql: definition.original_sql.clone(),
            catalog: definition.catalog.clone(),
            schema: definition.schema.clone(),
            columns: definition.columns.clone(),
            comment: definition.comment.clone(),
        }
    }
}

/// Encodes a view definition as record original text.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidMetadata`] if serialization fails.
pub fn encode_view(definition: &ViewDefinition) -> CatalogResult<String> {
    encode(VIEW_PREFIX, definition)
}

/// Decodes record original text written by [`encode_view`].
///
/// # Errors
///
/// Returns [`CatalogError::InvalidMetadata`] for text without the view
/// markers or with a malformed payload.
pub fn decode_view(text: &str) -> CatalogResult<ViewDefinition> {
    decode(VIEW_PREFIX, text)
}

pub(crate) fn encode_materialized_view(
    definition: &StoredMaterializedView,
) -> CatalogResult<String> {
    encode(MATERIALIZED_VIEW_PREFIX, definition)
}

pub(crate) fn decode_materialized_view(text: &str) -> CatalogResult<StoredMaterializedView> {
    decode(MATERIALIZED_VIEW_PREFIX, text)
}

fn encode<T: Serialize>(prefix: &str, value: &T) -> CatalogResult<String> {
    let json = serde_json::to_vec(value)
        .map_err(|err| CatalogError::invalid_metadata(format!("cannot encode view: {err}")))?;
    Ok(format!("{prefix}{}{SUFFIX}", STANDARD.encode(json)))
}

fn decode<T: DeserializeOwned>(prefix: &str, text: &str) -> CatalogResult<T> {
    let payload = text
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(SUFFIX))
        .ok_or_else(|| CatalogError::invalid_metadata("view text is missing its markers"))?;
    let json = STANDARD
        .decode(payload.trim())
        .map_err(|err| CatalogError::invalid_metadata(format!("view payload is not base64: {err}")))?;
    serde_json::from_slice(&json)
        .map_err(|err| CatalogError::invalid_metadata(format!("view payload is malformed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> ViewDefinition {
        ViewDefinition {
            original_sql: "SELECT id FROM orders".into(),
            catalog: Some("iceberg".into()),
            schema: Some("sales".into()),
            columns: vec![ViewColumn::new("id", "bigint")],
            comment: Some("ids".into()),
            owner: Some("alice".into()),
            run_as_invoker: false,
        }
    }

    #[test]
    fn test_view_text_shape() {
        let text = encode_view(&definition()).expect("encode");
        assert!(text.starts_with("/* Presto View: "));
        assert!(text.ends_with(" */"));
        assert_eq!(decode_view(&text).expect("decode"), definition());
    }

    #[test]
    fn test_payload_uses_camel_case_json() {
        let text = encode_view(&definition()).expect("encode");
        let payload = &text[VIEW_PREFIX.len()..text.len() - SUFFIX.len()];
        let json = String::from_utf8(STANDARD.decode(payload).expect("base64")).expect("utf8");
        assert!(json.contains("\"originalSql\""));
        assert!(json.contains("\"runAsInvoker\""));
    }

    #[test]
    fn test_kinds_do_not_cross_decode() {
        let stored = StoredMaterializedView {
            original_sql: "SELECT 1".into(),
            catalog: None,
            schema: None,
            columns: vec![ViewColumn::new("x", "integer")],
            comment: None,
        };
        let text = encode_materialized_view(&stored).expect("encode");
        assert!(text.starts_with("/* Presto Materialized View: "));
        assert!(decode_view(&text).is_err());
        assert_eq!(decode_materialized_view(&text).expect("decode"), stored);
    }

    #[test]
    fn test_rejects_garbage() {
        for text in ["SELECT 1", "/* Presto View: ??? */", "/* Presto View: e30= */x"] {
            let err = decode_view(text).expect_err(text);
            assert!(matches!(err, CatalogError::InvalidMetadata { .. }), "{text}: {err}");
        }
    }
}
