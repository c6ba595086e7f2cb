//! `catalog-core`: shared catalog primitives.
//!
//! This crate contains **pure** building blocks (no infrastructure concerns):
//! identifiers, the error model, and pagination.

pub mod error;
pub mod id;
pub mod page;

pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use id::ProductId;
pub use page::{PageMeta, PageRequest, Paginated, last_page};
