use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{
    is_primary_key_index, ColumnDefinition, ForeignKeyDefinition, IndexDefinition,
    PrimaryKeyDefinition, ReferentialAction, SortOrder, TableDdlDefinition,
    UniqueConstraintDefinition,
};
use crate::db::{
    CatalogAccessor, CatalogConnection, CatalogError, CatalogScope, ColumnRow, ForeignKeyRow,
    IndexRow, PrimaryKeyRow,
};
use crate::error::{Error, Result};

/// Builds [`TableDdlDefinition`]s from live catalog metadata.
///
/// Every call checks out one connection from the accessor and gives it back
/// before returning, on success and on failure alike.
pub struct SchemaIntrospector<C> {
    catalog: C,
}

impl<C: CatalogAccessor> SchemaIntrospector<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn table_ddl_definition(&self, table_name: &str) -> Result<TableDdlDefinition> {
        let conn = self
            .catalog
            .acquire()
            .await
            .map_err(|e| Error::introspection(table_name, e))?;

        let result = read_definition(&conn, table_name).await;
        drop(conn);

        match result {
            Ok(Some(definition)) => Ok(definition),
            Ok(None) => Err(Error::table_not_found(table_name)),
            Err(e) => {
                warn!(table = table_name, error = %e, "catalog query failed");
                Err(Error::introspection(table_name, e))
            }
        }
    }

    /// `CREATE TABLE` plus any `CREATE INDEX` statements for a table.
    pub async fn table_ddl(&self, table_name: &str) -> Result<String> {
        let definition = self.table_ddl_definition(table_name).await?;
        Ok(super::render_create_table(&definition))
    }

    /// Human-readable metadata report for a table.
    pub async fn table_report(&self, table_name: &str) -> Result<String> {
        let definition = self.table_ddl_definition(table_name).await?;
        Ok(super::render_table_report(&definition))
    }

    /// Base table names, sorted case-insensitively.
    pub async fn table_names(&self, schema: Option<&str>) -> Result<Vec<String>> {
        let label = schema.unwrap_or("*");
        let conn = self
            .catalog
            .acquire()
            .await
            .map_err(|e| Error::introspection(label, e))?;
        conn.table_names(schema)
            .await
            .map_err(|e| Error::introspection(label, e))
    }
}

async fn read_definition<K: CatalogConnection>(
    conn: &K,
    requested: &str,
) -> std::result::Result<Option<TableDdlDefinition>, CatalogError> {
    let scope = conn.scope().await?;

    let Some(table_name) = resolve_table(conn, &scope, requested).await? else {
        debug!(table = requested, "no table matched any case variant");
        return Ok(None);
    };

    let columns = build_columns(conn.columns(&scope, &table_name).await?);
    let primary_key = build_primary_key(conn.primary_keys(&scope, &table_name).await?);
    let foreign_keys = build_foreign_keys(conn.imported_keys(&scope, &table_name).await?);
    let indexes = build_indexes(conn.index_info(&scope, &table_name, false).await?);
    let unique_constraints =
        build_unique_constraints(conn.index_info(&scope, &table_name, true).await?);

    debug!(
        table = %table_name,
        columns = columns.len(),
        foreign_keys = foreign_keys.len(),
        indexes = indexes.len(),
        unique_constraints = unique_constraints.len(),
        "introspected table"
    );

    Ok(Some(TableDdlDefinition {
        catalog: scope.catalog,
        schema: scope.schema,
        table_name,
        columns,
        primary_key,
        foreign_keys,
        indexes,
        unique_constraints,
    }))
}

/// Exact name first, then upper case, then lower case; first hit wins.
async fn resolve_table<K: CatalogConnection>(
    conn: &K,
    scope: &CatalogScope,
    requested: &str,
) -> std::result::Result<Option<String>, CatalogError> {
    let candidates = [
        requested.to_string(),
        requested.to_uppercase(),
        requested.to_lowercase(),
    ];

    for candidate in &candidates {
        if let Some(found) = conn.find_table(scope, candidate).await? {
            debug!(requested, candidate = %candidate, resolved = %found, "resolved table name");
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn build_columns(rows: Vec<ColumnRow>) -> Vec<ColumnDefinition> {
    let mut columns: Vec<ColumnDefinition> = rows
        .into_iter()
        .map(|row| ColumnDefinition {
            column_name: row.column_name,
            type_name: row.type_name,
            type_code: row.type_code,
            column_size: row.column_size,
            decimal_digits: row.decimal_digits,
            nullable: row.nullable,
            default_value: row.default_value,
            ordinal_position: row.ordinal_position,
            remarks: row.remarks,
            auto_increment: row.auto_increment,
        })
        .collect();
    columns.sort_by_key(|column| column.ordinal_position);
    columns
}

fn build_primary_key(rows: Vec<PrimaryKeyRow>) -> Option<PrimaryKeyDefinition> {
    let mut constraint_name = None;
    let mut ordered = BTreeMap::new();
    for row in rows {
        constraint_name = row.constraint_name;
        ordered.insert(row.key_seq, row.column_name);
    }

    if ordered.is_empty() {
        return None;
    }
    Some(PrimaryKeyDefinition {
        constraint_name,
        columns: ordered.into_values().collect(),
    })
}

fn build_foreign_keys(rows: Vec<ForeignKeyRow>) -> Vec<ForeignKeyDefinition> {
    rows.into_iter()
        .map(|row| ForeignKeyDefinition {
            constraint_name: row.constraint_name,
            fk_column_name: row.fk_column_name,
            pk_table_schema: row.pk_table_schema,
            pk_table_name: row.pk_table_name,
            pk_column_name: row.pk_column_name,
            delete_rule: ReferentialAction::from_code(row.delete_rule),
            update_rule: ReferentialAction::from_code(row.update_rule),
        })
        .collect()
}

/// A named group of columns, accumulated in catalog order.
struct IndexGroup {
    name: String,
    columns: Vec<String>,
    unique: bool,
    sort_order: SortOrder,
}

/// Groups index rows by name. Groups keep first-seen order and columns keep
/// row order; rows without an index name are statistics rows and skipped.
fn group_index_rows(rows: Vec<IndexRow>) -> Vec<IndexGroup> {
    let mut groups: Vec<IndexGroup> = Vec::new();
    for row in rows {
        let Some(name) = row.index_name else {
            continue;
        };
        match groups.iter_mut().find(|group| group.name == name) {
            Some(group) => group.columns.push(row.column_name),
            None => groups.push(IndexGroup {
                name,
                columns: vec![row.column_name],
                unique: !row.non_unique,
                sort_order: SortOrder::from_marker(row.asc_or_desc.as_deref()),
            }),
        }
    }
    groups
}

fn build_indexes(rows: Vec<IndexRow>) -> Vec<IndexDefinition> {
    group_index_rows(rows)
        .into_iter()
        .map(|group| IndexDefinition {
            index_name: group.name,
            columns: group.columns,
            unique: group.unique,
            sort_order: group.sort_order,
        })
        .collect()
}

fn build_unique_constraints(rows: Vec<IndexRow>) -> Vec<UniqueConstraintDefinition> {
    group_index_rows(rows)
        .into_iter()
        .filter(|group| !is_primary_key_index(&group.name))
        .map(|group| UniqueConstraintDefinition {
            constraint_name: group.name,
            columns: group.columns,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_row(name: Option<&str>, column: &str, unique: bool) -> IndexRow {
        IndexRow {
            index_name: name.map(str::to_string),
            column_name: column.to_string(),
            non_unique: !unique,
            asc_or_desc: Some("A".into()),
        }
    }

    fn pk_row(seq: i32, column: &str) -> PrimaryKeyRow {
        PrimaryKeyRow {
            constraint_name: Some("order_line_pkey".into()),
            column_name: column.to_string(),
            key_seq: seq,
        }
    }

    #[test]
    fn composite_primary_key_follows_key_sequence() {
        let pk = build_primary_key(vec![pk_row(2, "b"), pk_row(1, "a")]).unwrap();
        assert_eq!(pk.columns, vec!["a", "b"]);
        assert_eq!(pk.constraint_name.as_deref(), Some("order_line_pkey"));
    }

    #[test]
    fn no_primary_key_rows_means_no_primary_key() {
        assert_eq!(build_primary_key(Vec::new()), None);
    }

    #[test]
    fn columns_sort_by_ordinal_position() {
        let row = |name: &str, pos: i32| ColumnRow {
            column_name: name.to_string(),
            type_name: "int4".into(),
            type_code: 23,
            column_size: Some(10),
            decimal_digits: Some(0),
            nullable: true,
            default_value: None,
            ordinal_position: pos,
            remarks: None,
            auto_increment: false,
        };
        let columns = build_columns(vec![row("c", 3), row("a", 1), row("b", 2)]);
        let names: Vec<_> = columns.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn composite_indexes_accumulate_in_row_order() {
        let indexes = build_indexes(vec![
            index_row(Some("idx_name"), "last_name", false),
            index_row(None, "ignored", false),
            index_row(Some("users_pkey"), "id", true),
            index_row(Some("idx_name"), "first_name", false),
        ]);

        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].index_name, "idx_name");
        assert_eq!(indexes[0].columns, vec!["last_name", "first_name"]);
        assert!(!indexes[0].unique);
        assert_eq!(indexes[0].sort_order, SortOrder::Ascending);
        assert_eq!(indexes[1].index_name, "users_pkey");
        assert!(indexes[1].unique);
    }

    #[test]
    fn unique_constraints_skip_primary_key_indexes() {
        let uniques = build_unique_constraints(vec![
            index_row(Some("users_pkey"), "id", true),
            index_row(Some("PK_USERS"), "id", true),
            index_row(Some("users_tenant_email_key"), "tenant_id", true),
            index_row(Some("users_tenant_email_key"), "email", true),
        ]);

        assert_eq!(
            uniques,
            vec![UniqueConstraintDefinition {
                constraint_name: "users_tenant_email_key".into(),
                columns: vec!["tenant_id".into(), "email".into()],
            }]
        );
    }
}
