use super::TableDdlDefinition;

/// Render a table definition as a sectioned, human-readable report.
///
/// Sections with nothing to show are left out.
pub fn render_table_report(def: &TableDdlDefinition) -> String {
    assert!(!def.table_name.is_empty(), "table definition without a name");

    let mut out = String::new();

    out.push_str("=== Table Metadata ===\n");
    if let Some(catalog) = &def.catalog {
        out.push_str(&format!("Catalog: {catalog}\n"));
    }
    if let Some(schema) = &def.schema {
        out.push_str(&format!("Schema: {schema}\n"));
    }
    out.push_str(&format!("Table: {}\n", def.table_name));

    if !def.columns.is_empty() {
        out.push_str(&format!("\n--- Columns ({}) ---\n", def.columns.len()));
        for col in &def.columns {
            out.push_str(&format!("\n{}:\n", col.column_name));

            let type_name = match (col.column_size, col.decimal_digits) {
                (Some(size), Some(scale)) if scale > 0 => {
                    format!("{}({size}, {scale})", col.type_name)
                }
                (Some(size), _) => format!("{}({size})", col.type_name),
                (None, _) => col.type_name.clone(),
            };
            out.push_str(&format!("  Type: {type_name}\n"));
            out.push_str(&format!("  Nullable: {}\n", col.nullable));
            if let Some(default) = col.default_value.as_deref().filter(|d| !d.is_empty()) {
                out.push_str(&format!("  Default: {default}\n"));
            }
            if col.auto_increment {
                out.push_str("  Auto Increment: true\n");
            }
            out.push_str(&format!("  Ordinal Position: {}\n", col.ordinal_position));
            if let Some(remarks) = col.remarks.as_deref().filter(|r| !r.is_empty()) {
                out.push_str(&format!("  Remarks: {remarks}\n"));
            }
        }
    }

    if let Some(pk) = &def.primary_key {
        out.push_str("\n--- Primary Key ---\n");
        if let Some(name) = &pk.constraint_name {
            out.push_str(&format!("Constraint: {name}\n"));
        }
        out.push_str(&format!("Columns: {}\n", pk.columns.join(", ")));
    }

    if !def.foreign_keys.is_empty() {
        out.push_str(&format!("\n--- Foreign Keys ({}) ---\n", def.foreign_keys.len()));
        for fk in &def.foreign_keys {
            out.push_str(&format!("\n{}:\n", fk.constraint_name));
            out.push_str(&format!("  Column: {}\n", fk.fk_column_name));
            out.push_str(&format!(
                "  References: {}.{}\n",
                fk.pk_table_name, fk.pk_column_name
            ));
            out.push_str(&format!("  On Delete: {}\n", fk.delete_rule));
            out.push_str(&format!("  On Update: {}\n", fk.update_rule));
        }
    }

    if !def.unique_constraints.is_empty() {
        out.push_str(&format!(
            "\n--- Unique Constraints ({}) ---\n",
            def.unique_constraints.len()
        ));
        for uc in &def.unique_constraints {
            out.push_str(&format!(
                "{}: ({})\n",
                uc.constraint_name,
                uc.columns.join(", ")
            ));
        }
    }

    if !def.indexes.is_empty() {
        out.push_str(&format!("\n--- Indexes ({}) ---\n", def.indexes.len()));
        for idx in &def.indexes {
            out.push_str(&format!("{}:\n", idx.index_name));
            out.push_str(&format!("  Columns: {}\n", idx.columns.join(", ")));
            out.push_str(&format!("  Unique: {}\n", idx.unique));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::{
        ColumnDefinition, ForeignKeyDefinition, IndexDefinition, PrimaryKeyDefinition,
        ReferentialAction, SortOrder, UniqueConstraintDefinition,
    };

    fn bare_table() -> TableDdlDefinition {
        TableDdlDefinition {
            catalog: Some("shop".into()),
            schema: Some("public".into()),
            table_name: "customer".into(),
            columns: vec![ColumnDefinition {
                column_name: "id".into(),
                type_name: "int4".into(),
                type_code: 23,
                column_size: Some(10),
                decimal_digits: Some(0),
                nullable: false,
                default_value: None,
                ordinal_position: 1,
                remarks: Some("surrogate key".into()),
                auto_increment: true,
            }],
            primary_key: None,
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    #[test]
    fn empty_sections_are_omitted() {
        let report = render_table_report(&bare_table());
        assert_eq!(
            report,
            "\
=== Table Metadata ===
Catalog: shop
Schema: public
Table: customer

--- Columns (1) ---

id:
  Type: int4(10)
  Nullable: false
  Auto Increment: true
  Ordinal Position: 1
  Remarks: surrogate key
"
        );
    }

    #[test]
    fn sections_follow_fixed_order() {
        let mut def = bare_table();
        def.primary_key = Some(PrimaryKeyDefinition {
            constraint_name: Some("customer_pkey".into()),
            columns: vec!["id".into()],
        });
        def.foreign_keys = vec![ForeignKeyDefinition {
            constraint_name: "customer_region_fk".into(),
            fk_column_name: "region_id".into(),
            pk_table_schema: Some("public".into()),
            pk_table_name: "region".into(),
            pk_column_name: "id".into(),
            delete_rule: ReferentialAction::Cascade,
            update_rule: ReferentialAction::NoAction,
        }];
        def.unique_constraints = vec![UniqueConstraintDefinition {
            constraint_name: "customer_email_key".into(),
            columns: vec!["email".into()],
        }];
        def.indexes = vec![IndexDefinition {
            index_name: "customer_email_key".into(),
            columns: vec!["email".into()],
            unique: true,
            sort_order: SortOrder::Ascending,
        }];

        let report = render_table_report(&def);
        let tail = &report[report.find("--- Primary Key ---").unwrap()..];
        assert_eq!(
            tail,
            "\
--- Primary Key ---
Constraint: customer_pkey
Columns: id

--- Foreign Keys (1) ---

customer_region_fk:
  Column: region_id
  References: region.id
  On Delete: CASCADE
  On Update: NO ACTION

--- Unique Constraints (1) ---
customer_email_key: (email)

--- Indexes (1) ---
customer_email_key:
  Columns: email
  Unique: true
"
        );
    }
}
