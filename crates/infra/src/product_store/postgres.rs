//! Postgres-backed product store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Constraint` |
//! | Database (not-null violation) | `23502` | `Constraint` |
//! | Database (check constraint violation) | `23514` | `Constraint` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / PoolTimedOut | N/A | `Unavailable` |
//! | ColumnDecode / Decode | N/A | `Decode` |
//! | Other | N/A | `Backend` |
//!
//! ## Thread Safety
//!
//! `PostgresProductStore` is `Send + Sync`; all access goes through the SQLx
//! connection pool.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::{Span, instrument};

use catalog_core::ProductId;
use catalog_products::{NewProduct, Product, ProductChanges};

use super::r#trait::{ProductFilter, ProductStore, StoreError, StoreResult, require_id};
use crate::config::DatabaseConfig;

const PRODUCT_COLUMNS: &str =
    "id, name, price, description, is_available, created_at, updated_at";

// Optional filters: `$1` id, `$2` id set, `$3` availability.
const FILTER_CLAUSE: &str = r#"
    ($1::bigint IS NULL OR id = $1)
    AND ($2::bigint[] IS NULL OR id = ANY($2))
    AND ($3::boolean IS NULL OR is_available = $3)
"#;

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL,
        description TEXT,
        is_available BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS products_is_available_idx ON products (is_available)",
];

/// Postgres-backed product table.
///
/// Every filter is bound as a parameter; `update_where` is a single
/// `UPDATE ... WHERE ... RETURNING` statement, so the availability check and
/// the write cannot interleave with a concurrent soft-delete.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    /// Create a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool from configuration. Fails if no database URL is configured.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool))
    }

    /// Create the `products` table and its index if they don't exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Release all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

struct FilterParams {
    id: Option<i64>,
    ids: Option<Vec<i64>>,
    available: Option<bool>,
}

impl From<&ProductFilter> for FilterParams {
    fn from(filter: &ProductFilter) -> Self {
        Self {
            id: filter.id.map(ProductId::get),
            ids: filter
                .ids
                .as_ref()
                .map(|ids| ids.iter().map(|id| id.get()).collect()),
            available: filter.available,
        }
    }
}

fn to_sql_bound(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), err)]
    async fn count(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let params = FilterParams::from(filter);
        let sql = format!("SELECT COUNT(*) AS total FROM products WHERE {FILTER_CLAUSE}");

        let row = sqlx::query(&sql)
            .bind(params.id)
            .bind(params.ids)
            .bind(params.available)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| StoreError::Decode(format!("failed to read count: {e}")))?;

        Ok(total.max(0) as u64)
    }

    #[instrument(skip(self), fields(row_count), err)]
    async fn find_many(
        &self,
        filter: &ProductFilter,
        skip: u64,
        take: u64,
    ) -> StoreResult<Vec<Product>> {
        let params = FilterParams::from(filter);
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {FILTER_CLAUSE} \
             ORDER BY id ASC LIMIT $4 OFFSET $5"
        );

        let rows = sqlx::query(&sql)
            .bind(params.id)
            .bind(params.ids)
            .bind(params.available)
            .bind(to_sql_bound(take))
            .bind(to_sql_bound(skip))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_many", e))?;

        let products = rows
            .iter()
            .map(decode_product)
            .collect::<StoreResult<Vec<_>>>()?;

        Span::current().record("row_count", products.len());
        Ok(products)
    }

    #[instrument(skip(self), err)]
    async fn find_unique(&self, filter: &ProductFilter) -> StoreResult<Option<Product>> {
        require_id(filter, "find_unique")?;
        let params = FilterParams::from(filter);
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE {FILTER_CLAUSE} LIMIT 1");

        let row = sqlx::query(&sql)
            .bind(params.id)
            .bind(params.ids)
            .bind(params.available)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_unique", e))?;

        row.as_ref().map(decode_product).transpose()
    }

    #[instrument(skip(self, new), fields(name = %new.name), err)]
    async fn insert(&self, new: NewProduct) -> StoreResult<Product> {
        let sql = format!(
            "INSERT INTO products (name, price, description, is_available) \
             VALUES ($1, $2, $3, COALESCE($4, TRUE)) \
             RETURNING {PRODUCT_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(&new.name)
            .bind(new.price)
            .bind(&new.description)
            .bind(new.is_available)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        decode_product(&row)
    }

    #[instrument(skip(self, changes), err)]
    async fn update_where(
        &self,
        filter: &ProductFilter,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        require_id(filter, "update_where")?;
        let params = FilterParams::from(filter);
        let set_description = changes.description.is_some();
        let sql = format!(
            "UPDATE products SET \
                 name = COALESCE($4, name), \
                 price = COALESCE($5, price), \
                 description = CASE WHEN $6 THEN $7 ELSE description END, \
                 is_available = COALESCE($8, is_available), \
                 updated_at = NOW() \
             WHERE {FILTER_CLAUSE} \
             RETURNING {PRODUCT_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(params.id)
            .bind(params.ids)
            .bind(params.available)
            .bind(changes.name)
            .bind(changes.price)
            .bind(set_description)
            .bind(changes.description.flatten())
            .bind(changes.is_available)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_where", e))?;

        row.as_ref().map(decode_product).transpose()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23502") | Some("23514") => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Decode(format!("{operation}: {err}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: i64,
    name: String,
    price: f64,
    description: Option<String>,
    is_available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            description: row.try_get("description")?,
            is_available: row.try_get("is_available")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            description: row.description,
            is_available: row.is_available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn decode_product(row: &PgRow) -> StoreResult<Product> {
    ProductRow::from_row(row)
        .map(Product::from)
        .map_err(|e| StoreError::Decode(format!("failed to deserialize product row: {e}")))
}
