//! Metastore record types.
//!
//! These mirror what a Hive-compatible metastore stores per database and per
//! table. Parameters use `BTreeMap` so that records compare and serialize
//! deterministically.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Table parameter holding the table comment.
pub const TABLE_COMMENT: &str = "comment";

/// Kind of principal that can own a database, table or view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrincipalType {
    /// An individual user.
    User,
    /// A role.
    Role,
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "USER",
            Self::Role => "ROLE",
        })
    }
}

/// Owner of a metastore object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HivePrincipal {
    /// Principal kind.
    pub principal_type: PrincipalType,
    /// Principal name.
    pub name: String,
}

impl HivePrincipal {
    /// Creates a user principal.
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            principal_type: PrincipalType::User,
            name: name.into(),
        }
    }

    /// Creates a role principal.
    #[must_use]
    pub fn role(name: impl Into<String>) -> Self {
        Self {
            principal_type: PrincipalType::Role,
            name: name.into(),
        }
    }
}

/// Privileges granted alongside a newly created table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalPrivileges {
    /// User receiving full ownership grants, if any.
    pub owner: Option<String>,
}

impl PrincipalPrivileges {
    /// No grants at all (system-managed security).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The initial ownership grant set for `user`.
    #[must_use]
    pub fn initial_for(user: impl Into<String>) -> Self {
        Self {
            owner: Some(user.into()),
        }
    }
}

/// A namespace record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Database name.
    pub name: String,
    /// Storage location, if configured.
    pub location: Option<String>,
    /// Owner kind; absent under system-managed security.
    pub owner_type: Option<PrincipalType>,
    /// Owner name; absent under system-managed security.
    pub owner_name: Option<String>,
    /// Optional comment.
    pub comment: Option<String>,
    /// Free-form parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Database {
    /// Creates a database record with no location and no owner.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            owner_type: None,
            owner_name: None,
            comment: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Sets the storage location.
    #[must_use]
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: Option<HivePrincipal>) -> Self {
        self.owner_type = owner.as_ref().map(|p| p.principal_type);
        self.owner_name = owner.map(|p| p.name);
        self
    }

    /// Returns the owner principal when both owner fields are set.
    #[must_use]
    pub fn owner(&self) -> Option<HivePrincipal> {
        match (self.owner_type, &self.owner_name) {
            (Some(principal_type), Some(name)) => Some(HivePrincipal {
                principal_type,
                name: name.clone(),
            }),
            _ => None,
        }
    }
}

/// Physical kind of a table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    /// Metastore-managed table.
    ManagedTable,
    /// External table (data owned outside the metastore).
    ExternalTable,
    /// A view: no data, only view text.
    VirtualView,
    /// A metastore-native materialized view (not written by this catalog).
    MaterializedView,
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Hive type name (e.g. `string`, `bigint`).
    pub type_name: String,
    /// Optional column comment.
    pub comment: Option<String>,
}

impl Column {
    /// Creates a column without a comment.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            comment: None,
        }
    }
}

/// A table, view or materialized-view record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Owning database.
    pub database_name: String,
    /// Table name.
    pub table_name: String,
    /// Owner user; absent under system-managed security.
    pub owner: Option<String>,
    /// Physical kind.
    pub table_type: TableType,
    /// Data columns.
    pub data_columns: Vec<Column>,
    /// Partition columns.
    #[serde(default)]
    pub partition_columns: Vec<Column>,
    /// Storage location; empty for views.
    pub location: Option<String>,
    /// Free-form parameters (table-format markers, comments, view flags).
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Encoded view definition for views.
    pub view_original_text: Option<String>,
    /// Expanded view text marker for views.
    pub view_expanded_text: Option<String>,
}

impl Table {
    /// Creates an empty record of the given kind.
    #[must_use]
    pub fn new(
        database_name: impl Into<String>,
        table_name: impl Into<String>,
        table_type: TableType,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            table_name: table_name.into(),
            owner: None,
            table_type,
            data_columns: Vec::new(),
            partition_columns: Vec::new(),
            location: None,
            parameters: BTreeMap::new(),
            view_original_text: None,
            view_expanded_text: None,
        }
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }

    /// Sets the data columns.
    #[must_use]
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.data_columns = columns;
        self
    }

    /// Sets the storage location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Sets the view texts.
    #[must_use]
    pub fn with_view_text(
        mut self,
        original: impl Into<String>,
        expanded: impl Into<String>,
    ) -> Self {
        self.view_original_text = Some(original.into());
        self.view_expanded_text = Some(expanded.into());
        self
    }

    /// Returns a parameter value.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Returns true for virtual views.
    #[must_use]
    pub fn is_view(&self) -> bool {
        self.table_type == TableType::VirtualView
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_owner_requires_both_fields() {
        let db = Database::new("sales").with_owner(Some(HivePrincipal::role("admin")));
        assert_eq!(db.owner(), Some(HivePrincipal::role("admin")));

        let mut partial = db.clone();
        partial.owner_type = None;
        assert_eq!(partial.owner(), None);

        assert_eq!(Database::new("sys").with_owner(None).owner(), None);
    }

    #[test]
    fn test_table_builder() {
        let table = Table::new("sales", "orders", TableType::ExternalTable)
            .with_location("memory://wh/sales/orders")
            .with_parameter(TABLE_COMMENT, "all orders");
        assert_eq!(table.parameter(TABLE_COMMENT), Some("all orders"));
        assert!(!table.is_view());
    }
}
