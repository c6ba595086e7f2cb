use std::sync::Arc;

use catalog_infra::{
    CatalogService, DatabaseConfig, InMemoryProductStore, PostgresProductStore, ProductStore,
    StoreError,
};

/// Catalog engine over a type-erased store, so both backends share one router.
pub type Catalog = CatalogService<Arc<dyn ProductStore>>;

#[derive(Debug, Clone)]
enum Backend {
    InMemory,
    Postgres(PostgresProductStore),
}

/// Process-wide services shared by every request.
///
/// Built once at startup and released by [`AppServices::shutdown`].
#[derive(Clone)]
pub struct AppServices {
    catalog: Catalog,
    backend: Backend,
}

impl AppServices {
    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        let store: Arc<dyn ProductStore> = Arc::new(InMemoryProductStore::new());
        Self {
            catalog: CatalogService::new(store),
            backend: Backend::InMemory,
        }
    }

    /// Postgres wiring over an already-connected store.
    pub fn postgres(store: PostgresProductStore) -> Self {
        let shared: Arc<dyn ProductStore> = Arc::new(store.clone());
        Self {
            catalog: CatalogService::new(shared),
            backend: Backend::Postgres(store),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::InMemory => "in-memory",
            Backend::Postgres(_) => "postgres",
        }
    }

    /// Close pooled connections, if any.
    pub async fn shutdown(&self) {
        if let Backend::Postgres(store) = &self.backend {
            store.close().await;
        }
    }
}

/// Pick the store from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise.
pub async fn build_services(config: &DatabaseConfig) -> Result<AppServices, StoreError> {
    if config.url.is_none() {
        tracing::warn!("DATABASE_URL not set; using in-memory product store");
        return Ok(AppServices::in_memory());
    }

    let store = PostgresProductStore::connect(config).await?;
    store.ensure_schema().await?;
    tracing::info!(max_connections = config.max_connections, "connected to postgres");
    Ok(AppServices::postgres(store))
}
