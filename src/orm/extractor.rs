use tracing::debug;

use super::{
    simple_name, EntityDefinition, FieldDescriptor, InheritanceInfo, Marker, MetaClass,
    MetaProperty, Metamodel, PrimaryKeyInfo, PropertyDefinition, RelationKind, TypeDescriptor,
    TypeResolver,
};
use crate::error::{Error, Result};

/// Builds [`EntityDefinition`]s by joining the metamodel with the mapping
/// markers found on each property's backing field.
pub struct EntityExtractor<'a, M: ?Sized> {
    metadata: &'a M,
}

impl<'a, M> EntityExtractor<'a, M>
where
    M: Metamodel + TypeResolver + ?Sized,
{
    pub fn new(metadata: &'a M) -> Self {
        Self { metadata }
    }

    pub fn entity_definition(&self, name: &str) -> Result<EntityDefinition> {
        let class = self
            .metadata
            .find_class(name)
            .ok_or_else(|| Error::entity_not_found(name))?;

        let chain = self.metadata.ancestry(&class.type_name)?;
        let declared = chain
            .first()
            .copied()
            .ok_or_else(|| Error::configuration(format!("unknown type {}", class.type_name)))?;

        let versioned = chain
            .iter()
            .flat_map(|t| t.fields.iter())
            .any(|f| f.markers.contains(&Marker::Version));

        let mut properties = class
            .properties
            .iter()
            .map(|prop| {
                let field = self.metadata.find_field(&class.type_name, &prop.name)?;
                self.property_definition(class, prop, field)
            })
            .collect::<Result<Vec<_>>>()?;
        properties.sort_by(|a, b| a.name.cmp(&b.name));

        let (table_name, schema_name) = table_mapping(declared);
        let inheritance = inheritance_info(declared);

        debug!(
            entity = name,
            properties = properties.len(),
            inheritance = inheritance.is_some(),
            "extracted entity"
        );

        Ok(EntityDefinition {
            name: class.name.clone(),
            simple_name: declared.simple_name().to_string(),
            type_name: declared.name.clone(),
            table_name,
            schema_name,
            persistent: class.persistent,
            embeddable: declared.markers.contains(&Marker::Embeddable),
            soft_delete: class.soft_delete,
            versioned,
            primary_key: self.primary_key_info(class)?,
            properties,
            markers: declared.markers.iter().map(Marker::to_string).collect(),
            inheritance,
        })
    }

    /// Human-readable definition of one entity.
    pub fn entity_report(&self, name: &str) -> Result<String> {
        let definition = self.entity_definition(name)?;
        Ok(super::render_entity_report(&definition))
    }

    fn primary_key_info(&self, class: &MetaClass) -> Result<Option<PrimaryKeyInfo>> {
        let Some(pk_name) = &class.primary_key else {
            return Ok(None);
        };
        let prop = class.property(pk_name).ok_or_else(|| {
            Error::configuration(format!(
                "entity {} names primary key {pk_name} but has no such property",
                class.name
            ))
        })?;

        let mut column_name = prop.name.clone();
        let mut generated = false;
        if let Some(field) = self.metadata.find_field(&class.type_name, &prop.name)? {
            for marker in &field.markers {
                match marker {
                    Marker::Column(column) if !column.name.is_empty() => {
                        column_name = column.name.clone();
                    }
                    Marker::GeneratedValue => generated = true,
                    _ => {}
                }
            }
        }

        Ok(Some(PrimaryKeyInfo {
            property_name: prop.name.clone(),
            type_name: simple_name(&prop.type_name).to_string(),
            column_name,
            generated,
        }))
    }

    fn property_definition(
        &self,
        class: &MetaClass,
        prop: &MetaProperty,
        field: Option<&FieldDescriptor>,
    ) -> Result<PropertyDefinition> {
        let mut def = PropertyDefinition {
            name: prop.name.clone(),
            type_name: simple_name(&prop.type_name).to_string(),
            kind: prop.kind,
            column_name: None,
            column_definition: None,
            length: None,
            precision: None,
            scale: None,
            mandatory: prop.mandatory,
            read_only: prop.read_only,
            relation: None,
            related_entity: prop.related_entity.clone(),
            mapped_by: None,
            fetch: None,
            cascade: None,
            enum_type: None,
            enum_encoding: None,
            markers: Vec::new(),
        };

        // Properties without a backing field keep only the metamodel view.
        let Some(field) = field else {
            return Ok(def);
        };

        let mut join_column = None;
        let mut encoding = None;
        let mut relation = None;

        for marker in &field.markers {
            match marker {
                Marker::Column(column) => {
                    let column_name = non_empty(&column.name).unwrap_or(prop.name.as_str());
                    def.column_name = Some(column_name.to_string());
                    def.column_definition = non_empty(&column.definition).map(str::to_string);
                    def.length = Some(column.length);
                    def.precision = Some(column.precision);
                    def.scale = Some(column.scale);
                }
                Marker::JoinColumn { name } => join_column = Some(name.as_str()),
                Marker::Enumerated { encoding: e } => encoding = Some(*e),
                other => {
                    if let Some((kind, mapping)) = other.relation() {
                        if let Some((previous, _)) = relation {
                            return Err(Error::configuration(format!(
                                "{}.{} is mapped as both {previous} and {kind}",
                                class.name, prop.name
                            )));
                        }
                        relation = Some((kind, mapping));
                    }
                }
            }
            if !marker.is_structural() {
                def.markers.push(marker.to_string());
            }
        }

        if let Some(name) = join_column {
            def.column_name = Some(match non_empty(name) {
                Some(name) => name.to_string(),
                None => foreign_key_column(&prop.name),
            });
        }

        if let Some((kind, mapping)) = relation {
            def.relation = Some(kind);
            def.fetch = Some(mapping.fetch.unwrap_or_else(|| kind.default_fetch()));
            def.cascade = Some(mapping.cascade.clone());
            if kind == RelationKind::ManyToOne {
                if def.column_name.is_none() {
                    def.column_name = Some(foreign_key_column(&prop.name));
                }
            } else {
                def.mapped_by = mapping.mapped_by.clone().filter(|m| !m.is_empty());
            }
        }

        if let Some(encoding) = encoding {
            let enum_type = self
                .metadata
                .resolve_type(&prop.type_name)
                .filter(|t| t.is_enum);
            if let Some(enum_type) = enum_type {
                def.enum_type = Some(enum_type.name.clone());
                def.enum_encoding = Some(encoding);
            }
        }

        Ok(def)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn foreign_key_column(property: &str) -> String {
    format!("{property}_id")
}

/// `Table.name`, then `Entity.name`, then the upper-cased simple name.
fn table_mapping(declared: &TypeDescriptor) -> (String, Option<String>) {
    let mut table = None;
    let mut entity = None;
    let mut schema = None;
    for marker in &declared.markers {
        match marker {
            Marker::Table { name, schema: s } => {
                table = non_empty(name);
                schema = non_empty(s);
            }
            Marker::Entity { name } => entity = non_empty(name),
            _ => {}
        }
    }

    let table_name = table
        .or(entity)
        .map(str::to_string)
        .unwrap_or_else(|| declared.simple_name().to_uppercase());
    (table_name, schema.map(str::to_string))
}

fn inheritance_info(declared: &TypeDescriptor) -> Option<InheritanceInfo> {
    let mut info = InheritanceInfo {
        strategy: None,
        discriminator_column: None,
        discriminator_value: None,
    };
    let mut found = false;
    for marker in &declared.markers {
        match marker {
            Marker::Inheritance { strategy } => info.strategy = Some(*strategy),
            Marker::DiscriminatorColumn { name } => info.discriminator_column = Some(name.clone()),
            Marker::DiscriminatorValue { value } => info.discriminator_value = Some(value.clone()),
            _ => continue,
        }
        found = true;
    }
    found.then_some(info)
}
