use super::{ColumnDefinition, ForeignKeyDefinition, ReferentialAction, TableDdlDefinition};

const IDENTITY_CLAUSE: &str = "GENERATED ALWAYS AS IDENTITY";

/// Type-name fragments whose types take a `(size[, scale])` suffix.
const SIZED_TYPE_MARKERS: &[&str] = &["CHAR", "NUMERIC", "DECIMAL", "BINARY"];

fn needs_size(type_name: &str) -> bool {
    let upper = type_name.to_uppercase();
    SIZED_TYPE_MARKERS.iter().any(|marker| upper.contains(marker))
}

fn column_clause(column: &ColumnDefinition) -> String {
    assert!(
        !column.column_name.is_empty(),
        "column definition without a name"
    );

    let mut clause = format!("    {} {}", column.column_name, column.type_name);

    if let Some(size) = column.column_size {
        if needs_size(&column.type_name) {
            match column.decimal_digits {
                Some(scale) if scale > 0 => clause.push_str(&format!("({size}, {scale})")),
                _ => clause.push_str(&format!("({size})")),
            }
        }
    }
    if !column.nullable {
        clause.push_str(" NOT NULL");
    }
    if let Some(default) = column.default_value.as_deref().filter(|d| !d.is_empty()) {
        clause.push_str(" DEFAULT ");
        clause.push_str(default);
    }
    if column.auto_increment {
        clause.push(' ');
        clause.push_str(IDENTITY_CLAUSE);
    }
    clause
}

fn named_constraint(name: Option<&str>) -> String {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => format!("    CONSTRAINT {name} "),
        None => "    ".to_string(),
    }
}

fn foreign_key_clause(fk: &ForeignKeyDefinition) -> String {
    let mut clause = format!(
        "{}FOREIGN KEY ({}) REFERENCES ",
        named_constraint(Some(fk.constraint_name.as_str())),
        fk.fk_column_name
    );
    if let Some(schema) = fk.pk_table_schema.as_deref().filter(|s| !s.is_empty()) {
        clause.push_str(schema);
        clause.push('.');
    }
    clause.push_str(&format!("{}({})", fk.pk_table_name, fk.pk_column_name));

    if fk.delete_rule != ReferentialAction::NoAction {
        clause.push_str(&format!(" ON DELETE {}", fk.delete_rule));
    }
    if fk.update_rule != ReferentialAction::NoAction {
        clause.push_str(&format!(" ON UPDATE {}", fk.update_rule));
    }
    clause
}

/// Render a table definition as one `CREATE TABLE` statement with inline
/// constraints, followed by `CREATE INDEX` statements for the plain indexes.
///
/// # Panics
///
/// Panics if the table or any column has an empty name.
pub fn render_create_table(def: &TableDdlDefinition) -> String {
    assert!(!def.table_name.is_empty(), "table definition without a name");

    let table = def.qualified_name();
    let mut clauses: Vec<String> = def.columns.iter().map(column_clause).collect();

    if let Some(pk) = def.primary_key.as_ref().filter(|pk| !pk.columns.is_empty()) {
        clauses.push(format!(
            "{}PRIMARY KEY ({})",
            named_constraint(pk.constraint_name.as_deref()),
            pk.columns.join(", ")
        ));
    }

    for unique in &def.unique_constraints {
        clauses.push(format!(
            "{}UNIQUE ({})",
            named_constraint(Some(unique.constraint_name.as_str())),
            unique.columns.join(", ")
        ));
    }

    clauses.extend(def.foreign_keys.iter().map(foreign_key_clause));

    let mut sql = format!("CREATE TABLE {table} (\n{}\n);\n", clauses.join(",\n"));

    // Unique indexes are already table constraints.
    for index in &def.indexes {
        if index.unique {
            continue;
        }
        sql.push_str(&format!(
            "\nCREATE INDEX {} ON {} ({});",
            index.index_name,
            table,
            index.columns.join(", ")
        ));
    }

    sql
}
