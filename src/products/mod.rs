//! # Products Module
//!
//! This module handles the product catalog:
//! - Public listing, featured, category, search and recommendation reads
//! - Admin product creation with image upload, featured toggling and deletion

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use routes::products_routes;
