// src/admin/routes.rs

use axum::{
    routing::{delete, get, patch},
    Router,
};

use super::handlers;

/// Creates and returns the user administration router
///
/// # Routes
/// - `GET /api/auth/users` - List every user account
/// - `DELETE /api/auth/users/:id` - Delete a user account
/// - `PATCH /api/auth/users/:id/make-admin` - Promote a user to admin
pub fn admin_routes() -> Router {
    Router::new()
        .route("/api/auth/users", get(handlers::list_users))
        .route("/api/auth/users/:id", delete(handlers::delete_user))
        .route(
            "/api/auth/users/:id/make-admin",
            patch(handlers::make_user_admin),
        )
}
