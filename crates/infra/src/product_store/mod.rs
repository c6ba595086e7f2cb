//! Product table boundary.
//!
//! This module defines the store primitives the catalog is composed from
//! (count, find-many, find-unique, insert, conditional update) and two
//! implementations: in-memory for tests/dev and Postgres for deployments.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;
pub use r#trait::{ProductFilter, ProductStore, StoreError, StoreResult};
