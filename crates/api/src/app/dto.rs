use axum::http::StatusCode;
use serde::Deserialize;

use catalog_core::{CatalogError, CatalogResult, PageRequest, ProductId};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// `?page=&limit=`; kept as strings so bad values get a JSON error body.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListProductsQuery {
    pub fn into_page_request(self) -> CatalogResult<PageRequest> {
        let page = parse_positive("page", self.page)?;
        let limit = parse_positive("limit", self.limit)?;
        PageRequest::from_optional(page, limit)
    }
}

/// Body of `POST /products/validate`: either `{"ids": [..]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ValidateProductsRequest {
    Wrapped { ids: Vec<ProductId> },
    Bare(Vec<ProductId>),
}

impl ValidateProductsRequest {
    pub fn into_ids(self) -> Vec<ProductId> {
        match self {
            ValidateProductsRequest::Wrapped { ids } | ValidateProductsRequest::Bare(ids) => ids,
        }
    }
}

// -------------------------
// Parsing helpers
// -------------------------

fn parse_positive(name: &str, raw: Option<String>) -> CatalogResult<Option<u64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| CatalogError::validation(format!("{name} must be a positive integer")))
}

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse::<ProductId>().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
    })
}
