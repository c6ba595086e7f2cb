use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use catalog_core::{CatalogError, CatalogResult, ProductId};

/// Availability lifecycle of a product.
///
/// Persisted as the `is_available` flag; `Unavailable` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub fn is_available(self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl From<bool> for Availability {
    fn from(value: bool) -> Self {
        if value {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }
}

/// A catalog record as persisted and returned to callers.
///
/// `name`, `price` and `description` are opaque payload: the catalog stores and
/// returns them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Materialize a freshly inserted record.
    pub fn from_new(id: ProductId, new: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            price: new.price,
            description: new.description,
            is_available: new.is_available.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn availability(&self) -> Availability {
        Availability::from(self.is_available)
    }

    /// Apply a partial update in place. `id` and `created_at` never change.
    pub fn apply(&mut self, changes: ProductChanges, now: DateTime<Utc>) {
        let ProductChanges {
            name,
            price,
            description,
            is_available,
        } = changes;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(is_available) = is_available {
            self.is_available = is_available;
        }
        self.updated_at = now;
    }
}

/// Payload for creating a product. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to `true` when absent.
    #[serde(default)]
    pub is_available: Option<bool>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            description: None,
            is_available: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> CatalogResult<()> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Partial update applied by the store. Absent fields are left untouched.
///
/// `description` is tri-state: `None` keeps it, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub is_available: Option<bool>,
}

impl ProductChanges {
    /// The soft-delete write.
    pub fn mark_unavailable() -> Self {
        Self {
            is_available: Some(false),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.is_available.is_none()
    }
}

/// Update payload as received from callers.
///
/// Callers may echo the record id back inside the payload; it is accepted and
/// discarded by [`UpdateProduct::into_changes`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Absent keeps the stored value; explicit `null` clears it.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

impl UpdateProduct {
    pub fn validate(&self) -> CatalogResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Strip the id and keep only the writable fields.
    pub fn into_changes(self) -> ProductChanges {
        let UpdateProduct {
            id: _,
            name,
            price,
            description,
        } = self;

        ProductChanges {
            name,
            price,
            description,
            is_available: None,
        }
    }
}

// Any present value, `null` included, becomes `Some`; `default` covers absence.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Collapse duplicate ids; the set is what batch validation counts against.
pub fn distinct_ids<I>(ids: I) -> BTreeSet<ProductId>
where
    I: IntoIterator<Item = ProductId>,
{
    ids.into_iter().collect()
}

fn validate_name(name: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::validation("name must not be empty"));
    }
    Ok(())
}

fn validate_price(price: f64) -> CatalogResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::validation(
            "price must be a finite, non-negative number",
        ));
    }
    Ok(())
}
