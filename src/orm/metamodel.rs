use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::descriptor::{TypeDescriptor, TypeResolver};
use crate::error::{Error, Result};

/// Logical kind of an entity property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyKind {
    Datatype,
    Enum,
    Association,
    Composition,
}

impl PropertyKind {
    /// Whether the property points at another entity.
    pub fn is_reference(&self) -> bool {
        matches!(self, PropertyKind::Association | PropertyKind::Composition)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PropertyKind::Datatype => "DATATYPE",
            PropertyKind::Enum => "ENUM",
            PropertyKind::Association => "ASSOCIATION",
            PropertyKind::Composition => "COMPOSITION",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaProperty {
    pub name: String,
    /// Fully-qualified declared type.
    #[serde(rename = "type")]
    pub type_name: String,
    pub kind: PropertyKind,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Logical name of the referenced entity, for associations and
    /// compositions.
    #[serde(default)]
    pub related_entity: Option<String>,
}

fn persistent_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaClass {
    pub name: String,
    /// Fully-qualified name of the backing type descriptor.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "persistent_by_default")]
    pub persistent: bool,
    #[serde(default)]
    pub soft_delete: bool,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub properties: Vec<MetaProperty>,
}

impl MetaClass {
    pub fn property(&self, name: &str) -> Option<&MetaProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Logical entity model, keyed by entity name.
pub trait Metamodel {
    fn find_class(&self, name: &str) -> Option<&MetaClass>;
}

/// On-disk shape of the metadata registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
    #[serde(default)]
    pub entities: Vec<MetaClass>,
}

/// In-memory metamodel and type table, validated once at load.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    types: HashMap<String, TypeDescriptor>,
    classes: BTreeMap<String, MetaClass>,
}

impl MetadataRegistry {
    pub fn from_manifest(manifest: Manifest) -> Result<Self> {
        let mut registry = Self::default();

        for descriptor in manifest.types {
            if registry.types.contains_key(&descriptor.name) {
                return Err(Error::configuration(format!(
                    "duplicate type {}",
                    descriptor.name
                )));
            }
            registry.types.insert(descriptor.name.clone(), descriptor);
        }
        for class in manifest.entities {
            if registry.classes.contains_key(&class.name) {
                return Err(Error::configuration(format!(
                    "duplicate entity {}",
                    class.name
                )));
            }
            registry.classes.insert(class.name.clone(), class);
        }

        registry.validate()?;
        debug!(
            types = registry.types.len(),
            entities = registry.classes.len(),
            "loaded metadata registry"
        );
        Ok(registry)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("invalid metadata manifest: {e}")))?;
        Self::from_manifest(manifest)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        for class in self.classes.values() {
            // Walks the whole chain, so unknown parents and cycles fail here.
            self.ancestry(&class.type_name)
                .map_err(|e| match e {
                    Error::Configuration(msg) => {
                        Error::configuration(format!("entity {}: {msg}", class.name))
                    }
                    other => other,
                })?;

            if let Some(pk) = &class.primary_key {
                if class.property(pk).is_none() {
                    return Err(Error::configuration(format!(
                        "entity {} names primary key {pk} but has no such property",
                        class.name
                    )));
                }
            }

            for property in &class.properties {
                if property.kind == PropertyKind::Enum {
                    match self.resolve_type(&property.type_name) {
                        Some(descriptor) if descriptor.is_enum => {}
                        _ => {
                            return Err(Error::configuration(format!(
                                "{}.{} is ENUM but {} is not a declared enum type",
                                class.name, property.name, property.type_name
                            )))
                        }
                    }
                    continue;
                }
                if !property.kind.is_reference() {
                    continue;
                }
                match &property.related_entity {
                    Some(related) if self.classes.contains_key(related) => {}
                    Some(related) => {
                        return Err(Error::configuration(format!(
                            "{}.{} refers to unknown entity {related}",
                            class.name, property.name
                        )))
                    }
                    None => {
                        return Err(Error::configuration(format!(
                            "{}.{} is {} but names no related entity",
                            class.name, property.name, property.kind
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

impl Metamodel for MetadataRegistry {
    fn find_class(&self, name: &str) -> Option<&MetaClass> {
        self.classes.get(name)
    }
}

impl TypeResolver for MetadataRegistry {
    fn resolve_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "types": [
            {"name": "app.Customer", "fields": [{"name": "id", "value_type": "java.util.UUID"}]},
            {"name": "app.Order", "fields": [{"name": "customer", "value_type": "app.Customer"}]}
        ],
        "entities": [
            {"name": "Customer", "type": "app.Customer", "primary_key": "id",
             "properties": [{"name": "id", "type": "java.util.UUID", "kind": "DATATYPE", "mandatory": true}]},
            {"name": "Order", "type": "app.Order",
             "properties": [
                {"name": "customer", "type": "app.Customer", "kind": "ASSOCIATION", "related_entity": "Customer"}
             ]}
        ]
    }"#;

    #[test]
    fn loads_a_consistent_manifest() {
        let registry = MetadataRegistry::from_json(MANIFEST).unwrap();

        let customer = registry.find_class("Customer").unwrap();
        assert!(customer.persistent);
        assert!(!customer.soft_delete);
        assert_eq!(customer.primary_key.as_deref(), Some("id"));
        assert!(registry.resolve_type("app.Order").is_some());
        assert!(registry.find_class("Invoice").is_none());
    }

    #[test]
    fn association_without_related_entity_is_rejected() {
        let json = MANIFEST.replace(r#", "related_entity": "Customer""#, "");
        let err = MetadataRegistry::from_json(&json).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("Order.customer")));
    }

    #[test]
    fn enum_property_needs_a_declared_enum_type() {
        let json = MANIFEST.replace(
            r#"{"name": "id", "type": "java.util.UUID", "kind": "DATATYPE", "mandatory": true}"#,
            r#"{"name": "id", "type": "java.util.UUID", "kind": "DATATYPE", "mandatory": true},
               {"name": "status", "type": "app.Status", "kind": "ENUM"}"#,
        );
        let err = MetadataRegistry::from_json(&json).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("Customer.status")));

        let declared = json.replace(
            r#"{"name": "app.Order","#,
            r#"{"name": "app.Status", "enum": true},
            {"name": "app.Order","#,
        );
        let registry = MetadataRegistry::from_json(&declared).unwrap();
        assert!(registry.find_class("Customer").unwrap().property("status").is_some());
    }

    #[test]
    fn duplicate_entities_are_rejected() {
        let manifest = Manifest {
            types: vec![TypeDescriptor {
                name: "app.A".into(),
                parent: None,
                is_enum: false,
                markers: Vec::new(),
                fields: Vec::new(),
            }],
            entities: vec![
                MetaClass {
                    name: "A".into(),
                    type_name: "app.A".into(),
                    persistent: true,
                    soft_delete: false,
                    primary_key: None,
                    properties: Vec::new(),
                };
                2
            ],
        };
        let err = MetadataRegistry::from_manifest(manifest).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("duplicate entity A")));
    }

    #[test]
    fn entity_with_unknown_type_is_rejected() {
        let json = MANIFEST.replace(r#""type": "app.Order""#, r#""type": "app.Missing""#);
        let err = MetadataRegistry::from_json(&json).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("app.Missing")));
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let err = MetadataRegistry::from_json("{\"entities\": 3}").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
