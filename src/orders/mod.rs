//! # Orders Module
//!
//! This module handles the order lifecycle:
//! - Order creation from a checkout cart snapshot
//! - Admin listing, inspection and deletion
//! - Paid/delivered status transitions

pub mod handlers;
pub mod models;
pub mod routes;


pub use routes::orders_routes;
