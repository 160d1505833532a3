use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A mapping annotation attached to a type or a field.
///
/// Serialized externally tagged in snake case, so a manifest writes `"id"`,
/// `{"column": {"name": "EMAIL", "length": 120}}` or `{"other": "Lob"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Entity {
        #[serde(default)]
        name: String,
    },
    Table {
        #[serde(default)]
        name: String,
        #[serde(default)]
        schema: String,
    },
    Embeddable,
    Inheritance {
        #[serde(default)]
        strategy: InheritanceStrategy,
    },
    DiscriminatorColumn {
        #[serde(default = "default_discriminator_column")]
        name: String,
    },
    DiscriminatorValue {
        value: String,
    },
    Id,
    GeneratedValue,
    Version,
    Column(ColumnMapping),
    JoinColumn {
        #[serde(default)]
        name: String,
    },
    ManyToOne(Relation),
    OneToMany(Relation),
    OneToOne(Relation),
    ManyToMany(Relation),
    Enumerated {
        #[serde(default)]
        encoding: EnumEncoding,
    },
    Temporal,
    Basic,
    Transient,
    Other(String),
}

fn default_discriminator_column() -> String {
    "DTYPE".to_string()
}

impl Marker {
    /// Simple annotation name, without the `@`.
    pub fn name(&self) -> &str {
        match self {
            Marker::Entity { .. } => "Entity",
            Marker::Table { .. } => "Table",
            Marker::Embeddable => "Embeddable",
            Marker::Inheritance { .. } => "Inheritance",
            Marker::DiscriminatorColumn { .. } => "DiscriminatorColumn",
            Marker::DiscriminatorValue { .. } => "DiscriminatorValue",
            Marker::Id => "Id",
            Marker::GeneratedValue => "GeneratedValue",
            Marker::Version => "Version",
            Marker::Column(_) => "Column",
            Marker::JoinColumn { .. } => "JoinColumn",
            Marker::ManyToOne(_) => "ManyToOne",
            Marker::OneToMany(_) => "OneToMany",
            Marker::OneToOne(_) => "OneToOne",
            Marker::ManyToMany(_) => "ManyToMany",
            Marker::Enumerated { .. } => "Enumerated",
            Marker::Temporal => "Temporal",
            Marker::Basic => "Basic",
            Marker::Transient => "Transient",
            Marker::Other(name) => name,
        }
    }

    /// Field markers that the extractor interprets itself rather than
    /// listing verbatim.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            Marker::Entity { .. }
                | Marker::Table { .. }
                | Marker::Embeddable
                | Marker::Inheritance { .. }
                | Marker::DiscriminatorColumn { .. }
                | Marker::DiscriminatorValue { .. }
                | Marker::Other(_)
        )
    }

    pub fn relation(&self) -> Option<(RelationKind, &Relation)> {
        match self {
            Marker::ManyToOne(r) => Some((RelationKind::ManyToOne, r)),
            Marker::OneToMany(r) => Some((RelationKind::OneToMany, r)),
            Marker::OneToOne(r) => Some((RelationKind::OneToOne, r)),
            Marker::ManyToMany(r) => Some((RelationKind::ManyToMany, r)),
            _ => None,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// Physical column attributes. Missing values take the annotation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub name: String,
    /// Custom SQL type text.
    pub definition: String,
    pub length: i32,
    pub precision: i32,
    pub scale: i32,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            name: String::new(),
            definition: String::new(),
            length: 255,
            precision: 0,
            scale: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Relation {
    pub fetch: Option<FetchType>,
    pub cascade: Vec<CascadeType>,
    /// Owning-side field name on a non-owning relationship.
    pub mapped_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    ManyToOne,
    OneToMany,
    OneToOne,
    ManyToMany,
}

impl RelationKind {
    pub fn default_fetch(&self) -> FetchType {
        match self {
            RelationKind::ManyToOne | RelationKind::OneToOne => FetchType::Eager,
            RelationKind::OneToMany | RelationKind::ManyToMany => FetchType::Lazy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::ManyToOne => "ManyToOne",
            RelationKind::OneToMany => "OneToMany",
            RelationKind::OneToOne => "OneToOne",
            RelationKind::ManyToMany => "ManyToMany",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchType {
    Lazy,
    Eager,
}

impl fmt::Display for FetchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchType::Lazy => f.write_str("LAZY"),
            FetchType::Eager => f.write_str("EAGER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadeType {
    All,
    Persist,
    Merge,
    Remove,
    Refresh,
    Detach,
}

impl fmt::Display for CascadeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CascadeType::All => "ALL",
            CascadeType::Persist => "PERSIST",
            CascadeType::Merge => "MERGE",
            CascadeType::Remove => "REMOVE",
            CascadeType::Refresh => "REFRESH",
            CascadeType::Detach => "DETACH",
        })
    }
}

/// How an enum value is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnumEncoding {
    #[default]
    Ordinal,
    String,
}

impl fmt::Display for EnumEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumEncoding::Ordinal => f.write_str("ORDINAL"),
            EnumEncoding::String => f.write_str("STRING"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InheritanceStrategy {
    #[default]
    SingleTable,
    Joined,
    TablePerClass,
}

impl fmt::Display for InheritanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InheritanceStrategy::SingleTable => "SINGLE_TABLE",
            InheritanceStrategy::Joined => "JOINED",
            InheritanceStrategy::TablePerClass => "TABLE_PER_CLASS",
        })
    }
}

/// A mapped type: its fully-qualified name, parent, class-level markers
/// and declared fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, rename = "enum")]
    pub is_enum: bool,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Fully-qualified value type.
    pub value_type: String,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

/// Last segment of a dotted (or `$`-nested) type name.
pub fn simple_name(type_name: &str) -> &str {
    type_name
        .rsplit(['.', '$'])
        .next()
        .unwrap_or(type_name)
}

/// Looks up type descriptors by fully-qualified name.
pub trait TypeResolver {
    fn resolve_type(&self, name: &str) -> Option<&TypeDescriptor>;

    /// The type and its ancestors, most derived first.
    fn ancestry(&self, handle: &str) -> Result<Vec<&TypeDescriptor>> {
        let mut chain: Vec<&TypeDescriptor> = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(handle);

        while let Some(name) = next {
            if !seen.insert(name) {
                return Err(Error::configuration(format!(
                    "inheritance cycle through type {name}"
                )));
            }
            let descriptor = self.resolve_type(name).ok_or_else(|| match chain.last() {
                Some(child) => Error::configuration(format!(
                    "type {} declares unknown parent {name}",
                    child.name
                )),
                None => Error::configuration(format!("unknown type {name}")),
            })?;
            chain.push(descriptor);
            next = descriptor.parent.as_deref();
        }
        Ok(chain)
    }

    /// First field with this name, searching the most derived type first.
    fn find_field(&self, handle: &str, field: &str) -> Result<Option<&FieldDescriptor>> {
        Ok(self
            .ancestry(handle)?
            .into_iter()
            .flat_map(|t| t.fields.iter())
            .find(|f| f.name == field))
    }

    /// Every declared field along the chain, most derived type first.
    fn all_fields(&self, handle: &str) -> Result<Vec<&FieldDescriptor>> {
        Ok(self
            .ancestry(handle)?
            .into_iter()
            .flat_map(|t| t.fields.iter())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Types(HashMap<String, TypeDescriptor>);

    impl Types {
        fn new(types: Vec<TypeDescriptor>) -> Self {
            Self(types.into_iter().map(|t| (t.name.clone(), t)).collect())
        }
    }

    impl TypeResolver for Types {
        fn resolve_type(&self, name: &str) -> Option<&TypeDescriptor> {
            self.0.get(name)
        }
    }

    fn ty(name: &str, parent: Option<&str>, fields: &[&str]) -> TypeDescriptor {
        TypeDescriptor {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            is_enum: false,
            markers: Vec::new(),
            fields: fields
                .iter()
                .map(|f| FieldDescriptor {
                    name: f.to_string(),
                    value_type: "java.lang.String".into(),
                    markers: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn ancestry_runs_most_derived_to_base() {
        let types = Types::new(vec![
            ty("app.Base", None, &["id"]),
            ty("app.Party", Some("app.Base"), &["name"]),
            ty("app.Customer", Some("app.Party"), &["email"]),
        ]);
        let chain = types.ancestry("app.Customer").unwrap();
        let names: Vec<_> = chain.iter().map(|t| t.simple_name()).collect();
        assert_eq!(names, vec!["Customer", "Party", "Base"]);

        let fields = types.all_fields("app.Customer").unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["email", "name", "id"]);
    }

    #[test]
    fn find_field_prefers_the_most_derived_declaration() {
        let mut child = ty("app.Child", Some("app.Base"), &["code"]);
        child.fields[0].value_type = "java.lang.Integer".into();
        let types = Types::new(vec![ty("app.Base", None, &["code", "id"]), child]);

        let code = types.find_field("app.Child", "code").unwrap().unwrap();
        assert_eq!(code.value_type, "java.lang.Integer");
        assert!(types.find_field("app.Child", "id").unwrap().is_some());
        assert!(types.find_field("app.Child", "missing").unwrap().is_none());
    }

    #[test]
    fn unknown_parent_and_cycles_are_configuration_errors() {
        let types = Types::new(vec![ty("app.Orphan", Some("app.Gone"), &[])]);
        let err = types.ancestry("app.Orphan").unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("app.Gone")));

        let types = Types::new(vec![
            ty("app.A", Some("app.B"), &[]),
            ty("app.B", Some("app.A"), &[]),
        ]);
        let err = types.ancestry("app.A").unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("cycle")));
    }

    #[test]
    fn markers_deserialize_from_manifest_shapes() {
        let markers: Vec<Marker> = serde_json::from_str(
            r#"["id", {"column": {"name": "EMAIL", "length": 120}},
                {"many_to_one": {"cascade": ["PERSIST"]}}, {"other": "Lob"}]"#,
        )
        .unwrap();

        assert_eq!(markers[0], Marker::Id);
        assert_eq!(
            markers[1],
            Marker::Column(ColumnMapping {
                name: "EMAIL".into(),
                length: 120,
                ..ColumnMapping::default()
            })
        );
        let (kind, relation) = markers[2].relation().unwrap();
        assert_eq!(kind, RelationKind::ManyToOne);
        assert_eq!(relation.fetch, None);
        assert_eq!(relation.cascade, vec![CascadeType::Persist]);
        assert_eq!(markers[3].to_string(), "@Lob");
        assert!(!markers[3].is_structural());
    }

    #[test]
    fn simple_names() {
        assert_eq!(simple_name("com.acme.Order"), "Order");
        assert_eq!(simple_name("com.acme.Order$Status"), "Status");
        assert_eq!(simple_name("Order"), "Order");
    }
}
