//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/signup` - Create an account and start a session
/// - `POST /api/auth/login` - Verify credentials and start a session
/// - `POST /api/auth/logout` - Revoke the session and clear cookies
/// - `POST /api/auth/refresh-token` - Reissue the access token
/// - `POST /api/auth/forgot-password` - Issue a password reset ticket
/// - `POST /api/auth/reset-password/:token` - Consume a reset ticket
/// - `GET /api/auth/profile` - Get the caller's user record
/// - `PATCH /api/auth/profile` - Update profile fields and picture
/// - `GET /api/media/avatars/:filename` - Serve stored profile pictures
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/refresh-token", post(handlers::refresh_token))
        .route("/api/auth/forgot-password", post(handlers::forgot_password))
        .route(
            "/api/auth/reset-password/:token",
            post(handlers::reset_password),
        )
        .route(
            "/api/auth/profile",
            get(handlers::get_profile).patch(handlers::update_profile),
        )
        .route(
            "/api/media/avatars/:filename",
            get(handlers::serve_profile_picture),
        )
}
