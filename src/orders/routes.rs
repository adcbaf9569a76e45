// src/orders/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers;

/// Creates and returns the order router
///
/// # Routes
/// - `POST /api/auth/orders` - Create an order from a cart snapshot
/// - `GET /api/auth/orders` - List all orders (admin)
/// - `GET /api/auth/orders/:id` - Fetch one order (admin)
/// - `DELETE /api/auth/orders/:id` - Delete an order (admin)
/// - `PATCH /api/auth/orders/:id/paid` - Overwrite the paid flag (admin)
/// - `PATCH /api/auth/orders/:id/delivered` - Overwrite the delivered flag (admin)
/// - `GET /api/auth/my-orders` - List the caller's own orders
pub fn orders_routes() -> Router {
    Router::new()
        .route(
            "/api/auth/orders",
            post(handlers::create_order).get(handlers::list_orders),
        )
        .route(
            "/api/auth/orders/:id",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route(
            "/api/auth/orders/:id/paid",
            patch(handlers::update_paid_status),
        )
        .route(
            "/api/auth/orders/:id/delivered",
            patch(handlers::update_delivered_status),
        )
        .route("/api/auth/my-orders", get(handlers::my_orders))
}
