// src/products/routes.rs

use axum::{
    routing::{get, patch},
    Router,
};

use super::handlers;

/// Creates and returns the product catalog router
///
/// # Routes
/// - `GET /api/products` - List the whole catalog
/// - `GET /api/products/featured` - List featured products
/// - `GET /api/products/category/:category` - List one category
/// - `GET /api/products/search?q=` - Substring search
/// - `GET /api/products/recommendations` - Random sample
/// - `POST /api/products` - Create a product (admin)
/// - `PATCH /api/products/:id` - Flip the featured flag (admin)
/// - `DELETE /api/products/:id` - Delete a product (admin)
/// - `GET /api/media/products/:filename` - Serve stored product images
pub fn products_routes() -> Router {
    Router::new()
        .route(
            "/api/products",
            get(handlers::get_all_products).post(handlers::create_product),
        )
        .route("/api/products/featured", get(handlers::get_featured_products))
        .route(
            "/api/products/category/:category",
            get(handlers::get_products_by_category),
        )
        .route("/api/products/search", get(handlers::search_products))
        .route(
            "/api/products/recommendations",
            get(handlers::get_recommended_products),
        )
        .route(
            "/api/products/:id",
            patch(handlers::toggle_featured_product).delete(handlers::delete_product),
        )
        .route(
            "/api/media/products/:filename",
            get(handlers::serve_product_image),
        )
}
