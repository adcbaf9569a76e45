//! # Auth Module
//!
//! This module handles all session and account functionality including:
//! - Signup, login, logout and the refresh-token flow
//! - JWT minting and validation with cookie delivery
//! - The password-reset ticket flow
//! - AuthedUser/AdminUser extractors for protected routes

pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use extractors::{AdminUser, AuthedUser};
pub use models::{Role, User};
pub use routes::auth_routes;
