//! Infrastructure layer: product stores, configuration, and the catalog engine.

pub mod catalog_service;
pub mod config;
pub mod product_store;

mod integration_tests;

pub use catalog_service::CatalogService;
pub use config::{ConfigError, DatabaseConfig};
pub use product_store::{
    InMemoryProductStore, PostgresProductStore, ProductFilter, ProductStore, StoreError,
};
