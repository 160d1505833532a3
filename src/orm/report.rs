use std::fmt::Display;

use super::EntityDefinition;

const DEFAULT_LENGTH: i32 = 255;

fn bracketed<T: Display>(items: &[T]) -> String {
    let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// Render an entity definition as a sectioned, human-readable report.
pub fn render_entity_report(def: &EntityDefinition) -> String {
    assert!(!def.name.is_empty(), "entity definition without a name");

    let mut out = String::new();

    out.push_str("=== Entity Definition ===\n");
    out.push_str(&format!("Name: {}\n", def.name));
    out.push_str(&format!("Class: {}\n", def.type_name));
    out.push_str(&format!("Table: {}\n", def.qualified_table()));
    out.push_str(&format!("Persistent: {}\n", def.persistent));
    out.push_str(&format!("Embeddable: {}\n", def.embeddable));
    out.push_str(&format!("Soft Deletable: {}\n", def.soft_delete));
    out.push_str(&format!("Versioned: {}\n", def.versioned));

    if let Some(inheritance) = &def.inheritance {
        out.push_str("\n--- Inheritance ---\n");
        if let Some(strategy) = inheritance.strategy {
            out.push_str(&format!("Strategy: {strategy}\n"));
        }
        if let Some(column) = &inheritance.discriminator_column {
            out.push_str(&format!("Discriminator Column: {column}\n"));
        }
        if let Some(value) = &inheritance.discriminator_value {
            out.push_str(&format!("Discriminator Value: {value}\n"));
        }
    }

    if let Some(pk) = &def.primary_key {
        out.push_str("\n--- Primary Key ---\n");
        out.push_str(&format!("Property: {}\n", pk.property_name));
        out.push_str(&format!("Type: {}\n", pk.type_name));
        out.push_str(&format!("Column: {}\n", pk.column_name));
        out.push_str(&format!("Generated: {}\n", pk.generated));
    }

    if !def.properties.is_empty() {
        out.push_str(&format!("\n--- Properties ({}) ---\n", def.properties.len()));
    }
    for prop in &def.properties {
        out.push_str(&format!("\n{}:\n", prop.name));
        out.push_str(&format!("  Type: {}\n", prop.type_name));
        out.push_str(&format!("  Property Type: {}\n", prop.kind));
        if let Some(column) = &prop.column_name {
            out.push_str(&format!("  Column: {column}\n"));
        }
        if let Some(definition) = &prop.column_definition {
            out.push_str(&format!("  Column Definition: {definition}\n"));
        }
        out.push_str(&format!("  Mandatory: {}\n", prop.mandatory));
        out.push_str(&format!("  Read Only: {}\n", prop.read_only));
        if let Some(length) = prop.length.filter(|l| *l != DEFAULT_LENGTH) {
            out.push_str(&format!("  Length: {length}\n"));
        }

        if let Some(relation) = prop.relation {
            out.push_str(&format!("  Relation: {relation}\n"));
            if let Some(related) = &prop.related_entity {
                out.push_str(&format!("  Related Entity: {related}\n"));
            }
            if let Some(mapped_by) = &prop.mapped_by {
                out.push_str(&format!("  Mapped By: {mapped_by}\n"));
            }
            if let Some(fetch) = prop.fetch {
                out.push_str(&format!("  Fetch: {fetch}\n"));
            }
            if let Some(cascade) = prop.cascade.as_deref().filter(|c| !c.is_empty()) {
                out.push_str(&format!("  Cascade: {}\n", bracketed(cascade)));
            }
        }

        if let (Some(enum_type), Some(encoding)) = (&prop.enum_type, prop.enum_encoding) {
            out.push_str(&format!("  Enum Class: {enum_type}\n"));
            out.push_str(&format!("  Enum Type: {encoding}\n"));
        }

        if !prop.markers.is_empty() {
            out.push_str(&format!(
                "  Annotations: {}\n",
                bracketed(prop.markers.as_slice())
            ));
        }
    }

    out
}
