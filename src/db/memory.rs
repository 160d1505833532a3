use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    CatalogAccessor, CatalogConnection, CatalogError, CatalogScope, ColumnRow, ForeignKeyRow,
    IndexRow, PrimaryKeyRow,
};

/// Rows describing one table in a [`MemoryCatalog`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnRow>,
    pub primary_keys: Vec<PrimaryKeyRow>,
    pub imported_keys: Vec<ForeignKeyRow>,
    pub indexes: Vec<IndexRow>,
}

impl MemoryTable {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        Self {
            schema: schema.map(str::to_string),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn column(mut self, row: ColumnRow) -> Self {
        self.columns.push(row);
        self
    }

    pub fn primary_key(mut self, row: PrimaryKeyRow) -> Self {
        self.primary_keys.push(row);
        self
    }

    pub fn imported_key(mut self, row: ForeignKeyRow) -> Self {
        self.imported_keys.push(row);
        self
    }

    pub fn index(mut self, row: IndexRow) -> Self {
        self.indexes.push(row);
        self
    }
}

#[derive(Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
    lookups: Mutex<Vec<String>>,
}

/// Catalog held entirely in memory.
///
/// Table names are matched case-sensitively, like a catalog that stores
/// identifiers verbatim. Useful for tests and for rendering definitions
/// that were captured earlier.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    scope: CatalogScope,
    tables: Arc<Vec<MemoryTable>>,
    failing_query: Option<&'static str>,
    counters: Arc<Counters>,
}

impl MemoryCatalog {
    pub fn new(catalog: Option<&str>, schema: Option<&str>) -> Self {
        Self {
            scope: CatalogScope {
                catalog: catalog.map(str::to_string),
                schema: schema.map(str::to_string),
            },
            ..Self::default()
        }
    }

    pub fn with_table(mut self, table: MemoryTable) -> Self {
        Arc::make_mut(&mut self.tables).push(table);
        self
    }

    /// Make the named query (`columns`, `primary_keys`, `imported_keys`,
    /// `index_info`, ...) fail on every connection.
    pub fn failing(mut self, query: &'static str) -> Self {
        self.failing_query = Some(query);
        self
    }

    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Names passed to `find_table`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.counters
            .lookups
            .lock()
            .map(|lookups| lookups.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CatalogAccessor for MemoryCatalog {
    type Connection = MemoryConnection;

    async fn acquire(&self) -> Result<MemoryConnection, CatalogError> {
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection {
            catalog: self.clone(),
        })
    }
}

pub struct MemoryConnection {
    catalog: MemoryCatalog,
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.catalog.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl MemoryConnection {
    fn check(&self, query: &str) -> Result<(), CatalogError> {
        match self.catalog.failing_query {
            Some(failing) if failing == query => Err(CatalogError::Unavailable(format!(
                "{query} query failed"
            ))),
            _ => Ok(()),
        }
    }

    fn table(&self, scope: &CatalogScope, name: &str) -> Option<&MemoryTable> {
        self.catalog.tables.iter().find(|table| {
            table.name == name && (scope.schema.is_none() || table.schema == scope.schema)
        })
    }
}

#[async_trait]
impl CatalogConnection for MemoryConnection {
    async fn scope(&self) -> Result<CatalogScope, CatalogError> {
        self.check("scope")?;
        Ok(self.catalog.scope.clone())
    }

    async fn find_table(
        &self,
        scope: &CatalogScope,
        name: &str,
    ) -> Result<Option<String>, CatalogError> {
        self.check("find_table")?;
        if let Ok(mut lookups) = self.catalog.counters.lookups.lock() {
            lookups.push(name.to_string());
        }
        Ok(self.table(scope, name).map(|table| table.name.clone()))
    }

    async fn table_names(&self, schema: Option<&str>) -> Result<Vec<String>, CatalogError> {
        self.check("table_names")?;
        let mut names: Vec<String> = self
            .catalog
            .tables
            .iter()
            .filter(|table| schema.is_none() || table.schema.as_deref() == schema)
            .map(|table| table.name.clone())
            .collect();
        names.sort_by_key(|name| name.to_lowercase());
        Ok(names)
    }

    async fn columns(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<ColumnRow>, CatalogError> {
        self.check("columns")?;
        Ok(self
            .table(scope, table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn primary_keys(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<PrimaryKeyRow>, CatalogError> {
        self.check("primary_keys")?;
        Ok(self
            .table(scope, table)
            .map(|t| t.primary_keys.clone())
            .unwrap_or_default())
    }

    async fn imported_keys(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<ForeignKeyRow>, CatalogError> {
        self.check("imported_keys")?;
        Ok(self
            .table(scope, table)
            .map(|t| t.imported_keys.clone())
            .unwrap_or_default())
    }

    async fn index_info(
        &self,
        scope: &CatalogScope,
        table: &str,
        unique_only: bool,
    ) -> Result<Vec<IndexRow>, CatalogError> {
        self.check("index_info")?;
        Ok(self
            .table(scope, table)
            .map(|t| {
                t.indexes
                    .iter()
                    .filter(|row| !unique_only || !row.non_unique)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
