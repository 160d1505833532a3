use std::fmt;

use thiserror::Error;

use crate::db::CatalogError;

/// What kind of object a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Entity,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Table => write!(f, "table"),
            ObjectKind::Entity => write!(f, "entity"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} not found: {name}")]
    NotFound { kind: ObjectKind, name: String },

    #[error("failed to introspect table {table}: {source}")]
    Introspection {
        table: String,
        #[source]
        source: CatalogError,
    },

    #[error("metadata configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn table_not_found(name: &str) -> Self {
        Error::NotFound {
            kind: ObjectKind::Table,
            name: name.to_string(),
        }
    }

    pub(crate) fn entity_not_found(name: &str) -> Self {
        Error::NotFound {
            kind: ObjectKind::Entity,
            name: name.to_string(),
        }
    }

    pub(crate) fn introspection(table: &str, source: CatalogError) -> Self {
        Error::Introspection {
            table: table.to_string(),
            source,
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }
}

/// Result type for schemascope operations.
pub type Result<T> = std::result::Result<T, Error>;
