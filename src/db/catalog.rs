use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("failed to create connection pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("tls error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Catalog and schema an acquired connection is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogScope {
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

/// One row of column metadata, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub column_name: String,
    pub type_name: String,
    pub type_code: i32,
    pub column_size: Option<i32>,
    pub decimal_digits: Option<i32>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub ordinal_position: i32,
    pub remarks: Option<String>,
    pub auto_increment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyRow {
    pub constraint_name: Option<String>,
    pub column_name: String,
    /// 1-based position within the key.
    pub key_seq: i32,
}

/// One column pair of a foreign key where the inspected table is the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRow {
    pub constraint_name: String,
    pub fk_column_name: String,
    pub pk_table_schema: Option<String>,
    pub pk_table_name: String,
    pub pk_column_name: String,
    pub delete_rule: Option<i16>,
    pub update_rule: Option<i16>,
}

/// One key column of an index.
///
/// `index_name` is `None` for table statistics rows, which some catalogs
/// report alongside real indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub index_name: Option<String>,
    pub column_name: String,
    pub non_unique: bool,
    /// `A`, `D`, or `None` when the index is unsorted.
    pub asc_or_desc: Option<String>,
}

/// Source of scoped catalog connections.
#[async_trait]
pub trait CatalogAccessor: Send + Sync {
    type Connection: CatalogConnection;

    /// Check out one connection. It is released when the returned value is
    /// dropped.
    async fn acquire(&self) -> Result<Self::Connection, CatalogError>;
}

/// Catalog metadata queries available on an acquired connection.
#[async_trait]
pub trait CatalogConnection: Send + Sync {
    async fn scope(&self) -> Result<CatalogScope, CatalogError>;

    /// Returns the stored name of the first table whose name equals `name`.
    async fn find_table(
        &self,
        scope: &CatalogScope,
        name: &str,
    ) -> Result<Option<String>, CatalogError>;

    async fn table_names(&self, schema: Option<&str>) -> Result<Vec<String>, CatalogError>;

    async fn columns(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<ColumnRow>, CatalogError>;

    async fn primary_keys(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<PrimaryKeyRow>, CatalogError>;

    async fn imported_keys(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<ForeignKeyRow>, CatalogError>;

    async fn index_info(
        &self,
        scope: &CatalogScope,
        table: &str,
        unique_only: bool,
    ) -> Result<Vec<IndexRow>, CatalogError>;
}
