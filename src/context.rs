use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::CatalogAccessor;
use crate::error::Result;
use crate::orm::{EntityExtractor, Metamodel, TypeResolver};
use crate::schema::SchemaIntrospector;

/// How selected tables are rendered into a context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Ddl,
    Report,
}

/// Rendered text for a selection of tables or entities, one section per
/// selected item in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaContext {
    pub sections: Vec<ContextSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSection {
    pub name: String,
    pub body: String,
}

/// Selection order with repeats dropped.
fn dedup_selection<I, S>(selected: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();
    for name in selected {
        let name = name.as_ref();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

impl SchemaContext {
    pub async fn for_tables<C, I, S>(
        introspector: &SchemaIntrospector<C>,
        selected: I,
        format: TableFormat,
    ) -> Result<Self>
    where
        C: CatalogAccessor,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sections = Vec::new();
        for name in dedup_selection(selected) {
            let body = match format {
                TableFormat::Ddl => introspector.table_ddl(&name).await?,
                TableFormat::Report => introspector.table_report(&name).await?,
            };
            sections.push(ContextSection { name, body });
        }
        info!(tables = sections.len(), ?format, "built table context");
        Ok(Self { sections })
    }

    pub fn for_entities<M, I, S>(extractor: &EntityExtractor<'_, M>, selected: I) -> Result<Self>
    where
        M: Metamodel + TypeResolver + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sections = dedup_selection(selected)
            .into_iter()
            .map(|name| {
                let body = extractor.entity_report(&name)?;
                Ok(ContextSection { name, body })
            })
            .collect::<Result<Vec<_>>>()?;
        info!(entities = sections.len(), "built entity context");
        Ok(Self { sections })
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&format!("=== {} ===\n{}\n\n", section.name, section.body));
        }
        out
    }
}
