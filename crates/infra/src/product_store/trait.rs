use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use catalog_core::{CatalogError, ProductId};
use catalog_products::{NewProduct, Product, ProductChanges};

/// Selection criteria understood by every [`ProductStore`].
///
/// All set criteria are ANDed. `None` means "don't filter on this column".
/// An `ids` set that is present but empty matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub id: Option<ProductId>,
    pub ids: Option<BTreeSet<ProductId>>,
    pub available: Option<bool>,
}

impl ProductFilter {
    /// Every record with `is_available = true`.
    pub fn available() -> Self {
        Self {
            available: Some(true),
            ..Self::default()
        }
    }

    /// A single record regardless of availability.
    pub fn by_id(id: ProductId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// A single record, only while it is available.
    pub fn live(id: ProductId) -> Self {
        Self {
            id: Some(id),
            available: Some(true),
            ..Self::default()
        }
    }

    /// Every record whose id is in `ids`, regardless of availability.
    pub fn by_ids(ids: BTreeSet<ProductId>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(id) = self.id {
            if product.id != id {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&product.id) {
                return false;
            }
        }
        if let Some(available) = self.available {
            if product.is_available != available {
                return false;
            }
        }
        true
    }
}

/// Store operation error.
///
/// These are **infrastructure errors**; the catalog never retries them and
/// surfaces them as an opaque [`CatalogError::Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("failed to decode row: {0}")]
    Decode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        CatalogError::store(err.to_string())
    }
}

/// Persistent product table, as seen by the catalog.
///
/// Implementations must:
/// - assign ids on insert and enforce their uniqueness
/// - default `is_available` to `true` when the insert payload leaves it unset
/// - return records in a stable order (both shipped stores use ascending id)
/// - apply `update_where` as a single conditional write: the row is changed
///   only if it still matches the filter at write time
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Number of records matching `filter`.
    async fn count(&self, filter: &ProductFilter) -> StoreResult<u64>;

    /// At most `take` matching records after skipping `skip`.
    async fn find_many(
        &self,
        filter: &ProductFilter,
        skip: u64,
        take: u64,
    ) -> StoreResult<Vec<Product>>;

    /// The single record matching `filter`. The filter must carry an `id`.
    async fn find_unique(&self, filter: &ProductFilter) -> StoreResult<Option<Product>>;

    async fn insert(&self, new: NewProduct) -> StoreResult<Product>;

    /// Apply `changes` to the record matching `filter` and return it, or
    /// `None` if nothing matched. The filter must carry an `id`.
    async fn update_where(
        &self,
        filter: &ProductFilter,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>>;
}

#[async_trait::async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn count(&self, filter: &ProductFilter) -> StoreResult<u64> {
        (**self).count(filter).await
    }

    async fn find_many(
        &self,
        filter: &ProductFilter,
        skip: u64,
        take: u64,
    ) -> StoreResult<Vec<Product>> {
        (**self).find_many(filter, skip, take).await
    }

    async fn find_unique(&self, filter: &ProductFilter) -> StoreResult<Option<Product>> {
        (**self).find_unique(filter).await
    }

    async fn insert(&self, new: NewProduct) -> StoreResult<Product> {
        (**self).insert(new).await
    }

    async fn update_where(
        &self,
        filter: &ProductFilter,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        (**self).update_where(filter, changes).await
    }
}

pub(crate) fn require_id(filter: &ProductFilter, operation: &str) -> StoreResult<ProductId> {
    filter
        .id
        .ok_or_else(|| StoreError::InvalidFilter(format!("{operation} requires an id filter")))
}
