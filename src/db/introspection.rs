use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use tracing::Instrument;

use super::{
    CatalogAccessor, CatalogConnection, CatalogError, CatalogScope, ColumnRow, ConnectionConfig,
    ForeignKeyRow, IndexRow, PrimaryKeyRow,
};

const FIND_TABLE_SQL: &str = "
    SELECT c.relname::text
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relkind IN ('r', 'p')
      AND c.relname = $2
      AND ($1::text IS NULL OR n.nspname = $1)
    ORDER BY n.nspname
    LIMIT 1";

const TABLE_NAMES_SQL: &str = "
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_type = 'BASE TABLE'
      AND table_schema NOT IN ('pg_catalog', 'information_schema')
      AND ($1::text IS NULL OR table_schema = $1)";

const COLUMNS_SQL: &str = "
    SELECT
        c.column_name::text,
        c.udt_name::text,
        a.atttypid::int4,
        COALESCE(c.character_maximum_length, c.numeric_precision)::int4,
        c.numeric_scale::int4,
        c.is_nullable = 'YES',
        c.column_default::text,
        c.ordinal_position::int4,
        col_description(a.attrelid, a.attnum),
        (c.is_identity = 'YES' OR COALESCE(c.column_default, '') LIKE 'nextval(%')
    FROM information_schema.columns c
    JOIN pg_namespace n ON n.nspname = c.table_schema
    JOIN pg_class t ON t.relname = c.table_name AND t.relnamespace = n.oid
    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attname = c.column_name
    WHERE c.table_name = $2
      AND ($1::text IS NULL OR c.table_schema = $1)";

const PRIMARY_KEYS_SQL: &str = "
    SELECT con.conname::text, a.attname::text, k.ord::int4
    FROM pg_constraint con
    JOIN pg_class t ON t.oid = con.conrelid
    JOIN pg_namespace n ON n.oid = t.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
    WHERE con.contype = 'p'
      AND t.relname = $2
      AND ($1::text IS NULL OR n.nspname = $1)";

// Referential actions are encoded with the standard metadata codes:
// CASCADE=0, RESTRICT=1, SET NULL=2, NO ACTION=3, SET DEFAULT=4.
const IMPORTED_KEYS_SQL: &str = "
    SELECT
        con.conname::text,
        a.attname::text,
        fn.nspname::text,
        ft.relname::text,
        fa.attname::text,
        (CASE con.confdeltype
            WHEN 'c' THEN 0 WHEN 'r' THEN 1 WHEN 'n' THEN 2 WHEN 'a' THEN 3 WHEN 'd' THEN 4
         END)::int2,
        (CASE con.confupdtype
            WHEN 'c' THEN 0 WHEN 'r' THEN 1 WHEN 'n' THEN 2 WHEN 'a' THEN 3 WHEN 'd' THEN 4
         END)::int2
    FROM pg_constraint con
    JOIN pg_class t ON t.oid = con.conrelid
    JOIN pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_class ft ON ft.oid = con.confrelid
    JOIN pg_namespace fn ON fn.oid = ft.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, fattnum, ord)
    JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
    JOIN pg_attribute fa ON fa.attrelid = con.confrelid AND fa.attnum = k.fattnum
    WHERE con.contype = 'f'
      AND t.relname = $2
      AND ($1::text IS NULL OR n.nspname = $1)
    ORDER BY fn.nspname, ft.relname, con.conname, k.ord";

const INDEX_INFO_SQL: &str = "
    SELECT
        ic.relname::text,
        COALESCE(a.attname::text, pg_get_indexdef(ix.indexrelid, k.ord::int4, true)),
        NOT ix.indisunique,
        CASE WHEN (ix.indoption[(k.ord - 1)::int4] & 1) = 1 THEN 'D' ELSE 'A' END
    FROM pg_index ix
    JOIN pg_class t ON t.oid = ix.indrelid
    JOIN pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_class ic ON ic.oid = ix.indexrelid
    CROSS JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord)
    LEFT JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
    WHERE t.relname = $2
      AND ($1::text IS NULL OR n.nspname = $1)
      AND (NOT $3 OR ix.indisunique)
      AND k.ord <= ix.indnkeyatts
    ORDER BY NOT ix.indisunique, ic.relname, k.ord";

/// Postgres catalog backed by a connection pool.
#[derive(Clone)]
pub struct PgCatalog {
    pool: Pool,
}

impl PgCatalog {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn connect(config: &ConnectionConfig) -> Result<Self, CatalogError> {
        Ok(Self::new(config.create_pool()?))
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl CatalogAccessor for PgCatalog {
    type Connection = PgCatalogConnection;

    async fn acquire(&self) -> Result<PgCatalogConnection, CatalogError> {
        let client = self.pool.get().await?;
        Ok(PgCatalogConnection { client })
    }
}

/// A pooled connection; returns to the pool on drop.
pub struct PgCatalogConnection {
    client: Object,
}

impl PgCatalogConnection {
    async fn query(
        &self,
        name: &'static str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, CatalogError> {
        let span = tracing::debug_span!("catalog.query", query = name, rows = tracing::field::Empty);
        let rows = self.client.query(sql, params).instrument(span.clone()).await?;
        span.record("rows", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl CatalogConnection for PgCatalogConnection {
    async fn scope(&self) -> Result<CatalogScope, CatalogError> {
        let rows = self
            .query(
                "scope",
                "SELECT current_database()::text, current_schema()::text",
                &[],
            )
            .await?;
        Ok(rows
            .first()
            .map(|row| CatalogScope {
                catalog: row.get(0),
                schema: row.get(1),
            })
            .unwrap_or_default())
    }

    async fn find_table(
        &self,
        scope: &CatalogScope,
        name: &str,
    ) -> Result<Option<String>, CatalogError> {
        let rows = self
            .query("find_table", FIND_TABLE_SQL, &[&scope.schema, &name])
            .await?;
        Ok(rows.first().map(|row| row.get(0)))
    }

    async fn table_names(&self, schema: Option<&str>) -> Result<Vec<String>, CatalogError> {
        let rows = self.query("table_names", TABLE_NAMES_SQL, &[&schema]).await?;
        let mut names: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
        names.sort_by_key(|name| name.to_lowercase());
        Ok(names)
    }

    async fn columns(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<ColumnRow>, CatalogError> {
        let rows = self
            .query("columns", COLUMNS_SQL, &[&scope.schema, &table])
            .await?;

        Ok(rows
            .iter()
            .map(|row| ColumnRow {
                column_name: row.get(0),
                type_name: row.get(1),
                type_code: row.get(2),
                column_size: row.get(3),
                decimal_digits: row.get(4),
                nullable: row.get(5),
                default_value: row.get(6),
                ordinal_position: row.get(7),
                remarks: row.get(8),
                auto_increment: row.get::<_, Option<bool>>(9).unwrap_or(false),
            })
            .collect())
    }

    async fn primary_keys(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<PrimaryKeyRow>, CatalogError> {
        let rows = self
            .query("primary_keys", PRIMARY_KEYS_SQL, &[&scope.schema, &table])
            .await?;

        Ok(rows
            .iter()
            .map(|row| PrimaryKeyRow {
                constraint_name: row.get(0),
                column_name: row.get(1),
                key_seq: row.get(2),
            })
            .collect())
    }

    async fn imported_keys(
        &self,
        scope: &CatalogScope,
        table: &str,
    ) -> Result<Vec<ForeignKeyRow>, CatalogError> {
        let rows = self
            .query("imported_keys", IMPORTED_KEYS_SQL, &[&scope.schema, &table])
            .await?;

        Ok(rows
            .iter()
            .map(|row| ForeignKeyRow {
                constraint_name: row.get(0),
                fk_column_name: row.get(1),
                pk_table_schema: row.get(2),
                pk_table_name: row.get(3),
                pk_column_name: row.get(4),
                delete_rule: row.get(5),
                update_rule: row.get(6),
            })
            .collect())
    }

    async fn index_info(
        &self,
        scope: &CatalogScope,
        table: &str,
        unique_only: bool,
    ) -> Result<Vec<IndexRow>, CatalogError> {
        let rows = self
            .query(
                "index_info",
                INDEX_INFO_SQL,
                &[&scope.schema, &table, &unique_only],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| IndexRow {
                index_name: row.get(0),
                column_name: row.get(1),
                non_unique: row.get(2),
                asc_or_desc: row.get(3),
            })
            .collect())
    }
}
