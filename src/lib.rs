//! Schema and ORM metadata introspection.
//!
//! [`SchemaIntrospector`] rebuilds table definitions from a live catalog and
//! renders them as DDL or as a report; [`EntityExtractor`] does the same for
//! entities described by a [`MetadataRegistry`].

pub mod context;
pub mod db;
pub mod error;
pub mod orm;
pub mod schema;

pub use context::{SchemaContext, TableFormat};
pub use db::{CatalogAccessor, ConnectionConfig, MemoryCatalog, PgCatalog};
pub use error::{Error, ObjectKind, Result};
pub use orm::{EntityDefinition, EntityExtractor, MetadataRegistry};
pub use schema::{SchemaIntrospector, TableDdlDefinition};
