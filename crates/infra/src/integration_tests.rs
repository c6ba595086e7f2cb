//! Property tests for the catalog engine over the in-memory store.
//!
//! Verifies:
//! - `lastPage == ceil(available / limit)` for every page request
//! - listing never yields unavailable records
//! - `get_one` succeeds exactly for available ids
//! - batch validation counts distinct ids and ignores availability

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use proptest::prelude::*;

    use catalog_core::{ErrorKind, PageRequest, ProductId, last_page};
    use catalog_products::NewProduct;

    use crate::catalog_service::CatalogService;
    use crate::product_store::InMemoryProductStore;

    type Service = CatalogService<Arc<InMemoryProductStore>>;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("failed to build test runtime")
    }

    /// Insert `n` products (ids 1..=n) and soft-delete the ids in `removed`.
    async fn populate(n: usize, removed: &BTreeSet<i64>) -> Service {
        let svc = CatalogService::new(Arc::new(InMemoryProductStore::new()));
        for i in 1..=n {
            svc.create(NewProduct::new(format!("p{i}"), 1.0)).await.unwrap();
        }
        for id in removed {
            svc.remove(ProductId::new(*id)).await.unwrap();
        }
        svc
    }

    /// A random subset of `1..=n`, as a removal mask.
    fn removal_set(n: usize) -> impl Strategy<Value = BTreeSet<i64>> {
        proptest::collection::vec(any::<bool>(), n).prop_map(|mask| {
            mask.into_iter()
                .enumerate()
                .filter(|(_, removed)| *removed)
                .map(|(idx, _)| idx as i64 + 1)
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 200,
            ..ProptestConfig::default()
        })]

        /// Property: listing metadata and contents agree with the available count.
        #[test]
        fn list_meta_matches_available_count(
            (n, removed) in (0usize..40).prop_flat_map(|n| (Just(n), removal_set(n))),
            page in 1u64..8,
            limit in 1u64..12,
        ) {
            let rt = runtime();
            let (listing, available) = rt.block_on(async {
                let svc = populate(n, &removed).await;
                let listing = svc.list(PageRequest::new(page, limit).unwrap()).await.unwrap();
                (listing, (n - removed.len()) as u64)
            });

            prop_assert_eq!(listing.meta.total, available);
            prop_assert_eq!(listing.meta.last_page, last_page(available, limit));
            prop_assert_eq!(listing.meta.page, page);
            prop_assert!(listing.data.len() as u64 <= limit);
            prop_assert!(listing.data.iter().all(|p| p.is_available));
            prop_assert!(listing.data.iter().all(|p| !removed.contains(&p.id.get())));

            let expected = available.saturating_sub((page - 1) * limit).min(limit);
            prop_assert_eq!(listing.data.len() as u64, expected);
        }

        /// Property: get_one succeeds iff the id exists and is available.
        #[test]
        fn get_one_succeeds_only_for_available_ids(
            (n, removed) in (1usize..20).prop_flat_map(|n| (Just(n), removal_set(n))),
            probe in 0i64..25,
        ) {
            let rt = runtime();
            let result = rt.block_on(async {
                let svc = populate(n, &removed).await;
                svc.get_one(ProductId::new(probe)).await
            });

            let live = probe >= 1 && probe as usize <= n && !removed.contains(&probe);
            match result {
                Ok(p) => {
                    prop_assert!(live);
                    prop_assert_eq!(p.id.get(), probe);
                }
                Err(e) => {
                    prop_assert!(!live);
                    prop_assert_eq!(e.kind(), ErrorKind::NotFound);
                }
            }
        }

        /// Property: validate_batch passes iff every distinct id exists, whatever its availability.
        #[test]
        fn validate_batch_counts_distinct_existing_ids(
            (n, removed) in (1usize..15).prop_flat_map(|n| (Just(n), removal_set(n))),
            ids in proptest::collection::vec(1i64..20, 0..10),
        ) {
            let rt = runtime();
            let result = rt.block_on(async {
                let svc = populate(n, &removed).await;
                svc.validate_batch(ids.iter().copied().map(ProductId::new).collect()).await
            });

            let distinct: BTreeSet<i64> = ids.iter().copied().collect();
            let all_exist = distinct.iter().all(|id| *id as usize <= n);
            match result {
                Ok(products) => {
                    prop_assert!(all_exist);
                    prop_assert_eq!(products.len(), distinct.len());
                }
                Err(e) => {
                    prop_assert!(!all_exist);
                    prop_assert_eq!(e.kind(), ErrorKind::BadRequest);
                }
            }
        }
    }
}
