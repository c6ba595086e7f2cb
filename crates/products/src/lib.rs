//! Products domain module.
//!
//! This crate contains the catalog record and its payload types, implemented as
//! plain data plus deterministic helpers (no IO, no HTTP, no storage).

pub mod product;

pub use product::{
    Availability, NewProduct, Product, ProductChanges, UpdateProduct, distinct_ids,
};
