use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use catalog_core::ProductId;
use catalog_products::{NewProduct, Product, ProductChanges};

use super::r#trait::{ProductFilter, ProductStore, StoreError, StoreResult, require_id};

/// In-memory product table.
///
/// Intended for tests/dev. Ids start at 1; iteration is in ascending id order.
#[derive(Debug)]
pub struct InMemoryProductStore {
    rows: RwLock<BTreeMap<ProductId, Product>>,
    next_id: AtomicI64,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        // Rows stay readable after a poisoning panic; trait methods report it instead.
        match self.rows.read() {
            Ok(rows) => rows.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[async_trait::async_trait]
impl ProductStore for InMemoryProductStore {
    async fn count(&self, filter: &ProductFilter) -> StoreResult<u64> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn find_many(
        &self,
        filter: &ProductFilter,
        skip: u64,
        take: u64,
    ) -> StoreResult<Vec<Product>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let take = usize::try_from(take).unwrap_or(usize::MAX);

        Ok(rows
            .values()
            .filter(|p| filter.matches(p))
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn find_unique(&self, filter: &ProductFilter) -> StoreResult<Option<Product>> {
        let id = require_id(filter, "find_unique")?;
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&id).filter(|p| filter.matches(p)).cloned())
    }

    async fn insert(&self, new: NewProduct) -> StoreResult<Product> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let id = ProductId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        if rows.contains_key(&id) {
            return Err(StoreError::Constraint(format!("duplicate product id {id}")));
        }

        let product = Product::from_new(id, new, Utc::now());
        rows.insert(id, product.clone());
        Ok(product)
    }

    async fn update_where(
        &self,
        filter: &ProductFilter,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        let id = require_id(filter, "update_where")?;

        // Match and write under the same lock.
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let Some(product) = rows.get_mut(&id).filter(|p| filter.matches(p)) else {
            return Ok(None);
        };

        product.apply(changes, Utc::now());
        Ok(Some(product.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    async fn seeded(n: usize) -> InMemoryProductStore {
        let store = InMemoryProductStore::new();
        for i in 0..n {
            store
                .insert(NewProduct::new(format!("Product {i}"), i as f64))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = seeded(3).await;
        let all = store.find_many(&ProductFilter::default(), 0, 10).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn count_and_find_many_respect_availability() {
        let store = seeded(4).await;
        store
            .update_where(&ProductFilter::by_id(ProductId::new(2)), ProductChanges::mark_unavailable())
            .await
            .unwrap();

        assert_eq!(store.count(&ProductFilter::available()).await.unwrap(), 3);
        assert_eq!(store.count(&ProductFilter::default()).await.unwrap(), 4);

        let page = store.find_many(&ProductFilter::available(), 1, 2).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn len_survives_a_poisoned_lock() {
        let store = seeded(2).await;
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.rows.write().unwrap();
            panic!("writer panicked");
        }));

        assert!(store.rows.is_poisoned());
        assert_eq!(store.len(), 2);
        let err = store.count(&ProductFilter::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn find_unique_requires_an_id() {
        let store = seeded(1).await;
        let err = store.find_unique(&ProductFilter::available()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidFilter(_)));
    }

    #[tokio::test]
    async fn live_filter_hides_unavailable_rows() {
        let store = seeded(1).await;
        let id = ProductId::new(1);
        store
            .update_where(&ProductFilter::live(id), ProductChanges::mark_unavailable())
            .await
            .unwrap();

        assert!(store.find_unique(&ProductFilter::live(id)).await.unwrap().is_none());
        assert!(store.find_unique(&ProductFilter::by_id(id)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn conditional_update_skips_non_matching_row() {
        let store = seeded(1).await;
        let id = ProductId::new(1);
        store
            .update_where(&ProductFilter::by_id(id), ProductChanges::mark_unavailable())
            .await
            .unwrap();

        let changes = ProductChanges {
            name: Some("ghost".to_string()),
            ..ProductChanges::default()
        };
        let updated = store.update_where(&ProductFilter::live(id), changes).await.unwrap();
        assert!(updated.is_none());

        let row = store.find_unique(&ProductFilter::by_id(id)).await.unwrap().unwrap();
        assert_eq!(row.name, "Product 0");
    }

    #[tokio::test]
    async fn empty_id_set_matches_nothing() {
        let store = seeded(2).await;
        let filter = ProductFilter::by_ids(BTreeSet::new());
        assert_eq!(store.count(&filter).await.unwrap(), 0);
        assert!(store.find_many(&filter, 0, 10).await.unwrap().is_empty());
    }
}
