//! Catalog query engine (application-level orchestration).
//!
//! `CatalogService` composes the [`ProductStore`] primitives into the six
//! catalog operations:
//!
//! ```text
//! create          -> insert
//! list            -> count(available) + find_many(available, skip, take)
//! get_one         -> find_unique(id, available)
//! update / remove -> update_where(id, available)   (single conditional write)
//! validate_batch  -> find_many(id in set)           (availability NOT filtered)
//! ```
//!
//! Availability is the logical-existence flag for every path except
//! `validate_batch`, which answers "do these ids exist at all". Callers that
//! need sellability must check `is_available` on the returned records.
//!
//! This module contains no IO itself; it composes the injected store.

use tracing::instrument;

use catalog_core::{CatalogError, CatalogResult, PageRequest, Paginated, ProductId};
use catalog_products::{NewProduct, Product, ProductChanges, UpdateProduct, distinct_ids};

use crate::product_store::{ProductFilter, ProductStore};

pub const BATCH_NOT_FOUND_MESSAGE: &str = "Some products were not found";

pub fn product_not_found(id: ProductId) -> CatalogError {
    CatalogError::not_found(format!("Product with id #{id} not found"))
}

#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> CatalogService<S>
where
    S: ProductStore,
{
    /// Insert a new product. The store assigns the id.
    #[instrument(skip(self, payload), fields(name = %payload.name), err)]
    pub async fn create(&self, payload: NewProduct) -> CatalogResult<Product> {
        let product = self.store.insert(payload).await?;
        tracing::debug!(id = %product.id, "product created");
        Ok(product)
    }

    /// One page of available products plus `{ page, total, lastPage }`.
    ///
    /// A page past the end yields empty `data`; it is not an error.
    #[instrument(skip(self, page), fields(page = page.page(), limit = page.limit()), err)]
    pub async fn list(&self, page: PageRequest) -> CatalogResult<Paginated<Product>> {
        let filter = ProductFilter::available();
        let total = self.store.count(&filter).await?;
        let data = self
            .store
            .find_many(&filter, page.offset(), page.limit())
            .await?;

        Ok(Paginated {
            data,
            meta: page.meta(total),
        })
    }

    /// The product with `id`, if it exists and is available.
    #[instrument(skip(self), fields(id = %id), err)]
    pub async fn get_one(&self, id: ProductId) -> CatalogResult<Product> {
        match self.store.find_unique(&ProductFilter::live(id)).await? {
            Some(product) => Ok(product),
            None => {
                tracing::debug!("no available product");
                Err(product_not_found(id))
            }
        }
    }

    /// Partially update an available product. Any `id` inside `payload` is ignored.
    #[instrument(skip(self, payload), fields(id = %id), err)]
    pub async fn update(&self, id: ProductId, payload: UpdateProduct) -> CatalogResult<Product> {
        let changes = payload.into_changes();
        self.write_live(id, changes).await
    }

    /// Soft-delete: flip `is_available` to `false`.
    ///
    /// Removing an already removed product fails with `NotFound`.
    #[instrument(skip(self), fields(id = %id), err)]
    pub async fn remove(&self, id: ProductId) -> CatalogResult<Product> {
        self.write_live(id, ProductChanges::mark_unavailable()).await
    }

    /// Confirm every id refers to an existing record, ignoring availability.
    ///
    /// Duplicates are collapsed before counting. Result order is store order,
    /// not request order.
    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    pub async fn validate_batch(&self, ids: Vec<ProductId>) -> CatalogResult<Vec<Product>> {
        let ids = distinct_ids(ids);
        let wanted = ids.len();

        let products = self
            .store
            .find_many(&ProductFilter::by_ids(ids), 0, wanted as u64)
            .await?;

        if products.len() < wanted {
            tracing::warn!(
                distinct = wanted,
                found = products.len(),
                "batch validation failed"
            );
            return Err(CatalogError::bad_request(BATCH_NOT_FOUND_MESSAGE));
        }

        Ok(products)
    }

    // Existence check and write in one conditional store call.
    async fn write_live(&self, id: ProductId, changes: ProductChanges) -> CatalogResult<Product> {
        self.store
            .update_where(&ProductFilter::live(id), changes)
            .await?
            .ok_or_else(|| product_not_found(id))
    }
}
