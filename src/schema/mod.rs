//! Physical schema definitions, the introspector that builds them, and the
//! renderers that turn them back into text.

mod ddl;
mod introspector;
mod report;

pub use ddl::render_create_table;
pub use introspector::SchemaIntrospector;
pub use report::render_table_report;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index-name fragments that mark an index as backing the primary key.
pub const PRIMARY_KEY_MARKERS: &[&str] = &["pkey", "pk_"];

/// Whether an index name follows a primary-key naming convention.
pub fn is_primary_key_index(index_name: &str) -> bool {
    let lower = index_name.to_lowercase();
    PRIMARY_KEY_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDdlDefinition {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub table_name: String,
    /// Sorted by ordinal position.
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Option<PrimaryKeyDefinition>,
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    pub indexes: Vec<IndexDefinition>,
    /// Unique indexes, excluding the one backing the primary key.
    pub unique_constraints: Vec<UniqueConstraintDefinition>,
}

impl TableDdlDefinition {
    /// `schema.table`, or just `table` when the schema is empty.
    pub fn qualified_name(&self) -> String {
        match self.schema.as_deref() {
            Some(schema) if !schema.is_empty() => format!("{}.{}", schema, self.table_name),
            _ => self.table_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub column_name: String,
    pub type_name: String,
    pub type_code: i32,
    /// Length for character types, precision for numeric types.
    pub column_size: Option<i32>,
    /// Scale for numeric types.
    pub decimal_digits: Option<i32>,
    pub nullable: bool,
    pub default_value: Option<String>,
    /// 1-based position in the table.
    pub ordinal_position: i32,
    pub remarks: Option<String>,
    pub auto_increment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyDefinition {
    pub constraint_name: Option<String>,
    /// In key sequence order.
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    pub constraint_name: String,
    pub fk_column_name: String,
    pub pk_table_schema: Option<String>,
    pub pk_table_name: String,
    pub pk_column_name: String,
    pub delete_rule: ReferentialAction,
    pub update_rule: ReferentialAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub index_name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraintDefinition {
    pub constraint_name: String,
    pub columns: Vec<String>,
}

/// Action taken on the child rows when a referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    #[default]
    NoAction,
}

impl ReferentialAction {
    pub const CASCADE_CODE: i16 = 0;
    pub const RESTRICT_CODE: i16 = 1;
    pub const SET_NULL_CODE: i16 = 2;
    pub const NO_ACTION_CODE: i16 = 3;
    pub const SET_DEFAULT_CODE: i16 = 4;

    /// Map a catalog referential-action code. Unknown or missing codes are
    /// `NO ACTION`.
    pub fn from_code(code: Option<i16>) -> Self {
        match code {
            Some(Self::CASCADE_CODE) => ReferentialAction::Cascade,
            Some(Self::SET_NULL_CODE) => ReferentialAction::SetNull,
            Some(Self::SET_DEFAULT_CODE) => ReferentialAction::SetDefault,
            Some(Self::RESTRICT_CODE) => ReferentialAction::Restrict,
            _ => ReferentialAction::NoAction,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
    #[default]
    Unspecified,
}

impl SortOrder {
    /// Parse the catalog marker: `A` ascending, `D` descending.
    pub fn from_marker(marker: Option<&str>) -> Self {
        match marker {
            Some("A") | Some("a") => SortOrder::Ascending,
            Some("D") | Some("d") => SortOrder::Descending,
            _ => SortOrder::Unspecified,
        }
    }
}
