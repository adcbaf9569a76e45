//! Product catalog data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Product database model
#[derive(FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: String,
    pub category: String,
    pub is_featured: bool,
    pub created_at: Option<String>,
}

/// POST /api/products request body. `image` is an optional base64 data
/// URL persisted to the media host before the row is written.
#[derive(Deserialize, Debug)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub category: Option<String>,
}

/// GET /api/products/search query string
#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// List responses wrap the array, matching the storefront client
#[derive(Serialize, Debug)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
}
