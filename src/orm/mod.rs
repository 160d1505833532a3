//! Logical object model: type descriptors with their mapping markers, the
//! metamodel that names entities, and the extractor that joins the two into
//! entity definitions.

mod descriptor;
mod extractor;
mod metamodel;
mod report;

pub use descriptor::{
    simple_name, CascadeType, ColumnMapping, EnumEncoding, FetchType, FieldDescriptor,
    InheritanceStrategy, Marker, Relation, RelationKind, TypeDescriptor, TypeResolver,
};
pub use extractor::EntityExtractor;
pub use metamodel::{Manifest, MetaClass, MetaProperty, MetadataRegistry, Metamodel, PropertyKind};
pub use report::render_entity_report;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Logical entity name.
    pub name: String,
    pub simple_name: String,
    pub type_name: String,
    pub table_name: String,
    pub schema_name: Option<String>,
    pub persistent: bool,
    pub embeddable: bool,
    pub soft_delete: bool,
    pub versioned: bool,
    pub primary_key: Option<PrimaryKeyInfo>,
    /// Sorted by name.
    pub properties: Vec<PropertyDefinition>,
    /// Class-level markers as `@Name`.
    pub markers: Vec<String>,
    pub inheritance: Option<InheritanceInfo>,
}

impl EntityDefinition {
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// `schema.table`, or just `table` without a schema.
    pub fn qualified_table(&self) -> String {
        match &self.schema_name {
            Some(schema) => format!("{schema}.{}", self.table_name),
            None => self.table_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    /// Simple name of the declared type.
    pub type_name: String,
    pub kind: PropertyKind,
    pub column_name: Option<String>,
    pub column_definition: Option<String>,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub mandatory: bool,
    pub read_only: bool,
    pub relation: Option<RelationKind>,
    pub related_entity: Option<String>,
    pub mapped_by: Option<String>,
    pub fetch: Option<FetchType>,
    pub cascade: Option<Vec<CascadeType>>,
    /// Fully-qualified enum type.
    pub enum_type: Option<String>,
    pub enum_encoding: Option<EnumEncoding>,
    /// Non-structural field markers as `@Name`.
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyInfo {
    pub property_name: String,
    pub type_name: String,
    pub column_name: String,
    pub generated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceInfo {
    /// `None` when only discriminator markers are present.
    pub strategy: Option<InheritanceStrategy>,
    pub discriminator_column: Option<String>,
    pub discriminator_value: Option<String>,
}
