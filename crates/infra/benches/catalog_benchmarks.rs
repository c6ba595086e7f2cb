use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use catalog_core::{PageRequest, ProductId};
use catalog_infra::CatalogService;
use catalog_infra::product_store::InMemoryProductStore;
use catalog_products::NewProduct;

type Service = CatalogService<Arc<InMemoryProductStore>>;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn seeded(rt: &tokio::runtime::Runtime, n: usize) -> Service {
    let svc = CatalogService::new(Arc::new(InMemoryProductStore::new()));
    rt.block_on(async {
        for i in 0..n {
            svc.create(NewProduct::new(format!("Product {i}"), i as f64))
                .await
                .unwrap();
        }
    });
    svc
}

fn bench_list_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_pages");
    let rt = runtime();

    for catalog_size in [100usize, 1_000, 10_000].iter() {
        let svc = seeded(&rt, *catalog_size);
        group.bench_with_input(
            BenchmarkId::new("last_page_of_10", catalog_size),
            catalog_size,
            |b, &size| {
                let last = (size as u64).div_ceil(10);
                let page = PageRequest::new(last, 10).unwrap();
                b.iter(|| black_box(rt.block_on(svc.list(page)).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_validate_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_batch");
    let rt = runtime();
    let svc = seeded(&rt, 10_000);

    for batch_size in [1usize, 10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("with_duplicates", batch_size),
            batch_size,
            |b, &size| {
                // Every id twice, so dedup is part of the measured path.
                let ids: Vec<ProductId> = (1..=size as i64)
                    .flat_map(|id| [ProductId::new(id), ProductId::new(id)])
                    .collect();
                b.iter(|| black_box(rt.block_on(svc.validate_batch(ids.clone())).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_soft_delete(c: &mut Criterion) {
    let rt = runtime();

    c.bench_function("create_then_remove", |b| {
        let svc = seeded(&rt, 0);
        b.iter(|| {
            rt.block_on(async {
                let p = svc.create(NewProduct::new("bench", 1.0)).await.unwrap();
                black_box(svc.remove(p.id).await.unwrap());
            })
        });
    });
}

criterion_group!(benches, bench_list_pages, bench_validate_batch, bench_soft_delete);
criterion_main!(benches);
