// src/products/handlers.rs

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{CreateProductRequest, Product, ProductListResponse, SearchQuery};
use crate::auth::models::MessageResponse;
use crate::auth::AdminUser;
use crate::common::{generate_product_id, ApiError, AppState, Validator};
use crate::services::media::{
    content_type_for_extension, extension_from_filename, sanitize_filename, PREFIX_PRODUCTS,
};

/// GET /api/products - List the whole catalog
pub async fn get_all_products(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let products =
        sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    Ok(Json(ProductListResponse { products }))
}

/// GET /api/products/featured - List featured products
pub async fn get_featured_products(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let state = state_lock.read().await.clone();

    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_featured = 1 ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(products))
}

/// GET /api/products/category/:category - List products in one category
pub async fn get_products_by_category(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(category): Path<String>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE category = ? ORDER BY created_at DESC",
    )
    .bind(&category)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(ProductListResponse { products }))
}

/// GET /api/products/search?q= - Substring search over name and description
pub async fn search_products(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let q = match query.q {
        Some(q) if !q.trim().is_empty() => q,
        _ => {
            return Err(ApiError::BadRequest("Search query is required".to_string()));
        }
    };

    // LIKE is case-insensitive for ASCII in SQLite; wildcards in the
    // query are escaped so they match literally
    let pattern = format!("%{}%", escape_like(q.trim()));
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE name LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\' ORDER BY created_at DESC",
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    info!(query = %q, result_count = products.len(), "Product search executed");

    Ok(Json(ProductListResponse { products }))
}

/// GET /api/products/recommendations - Random sample of the catalog
pub async fn get_recommended_products(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let state = state_lock.read().await.clone();

    let products =
        sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY RANDOM() LIMIT 4")
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    Ok(Json(products))
}

/// POST /api/products - Create a product
pub async fn create_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = payload.validate();
    if !validation_result.is_valid {
        warn!(
            admin_user_id = %admin.id,
            error_count = validation_result.errors.len(),
            "Product creation validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    // Persist the uploaded image first so the row stores the final URL
    let image_url = match payload.image.as_deref() {
        Some(data_url) if !data_url.is_empty() => {
            let (bytes, extension) = decode_image_data_url(data_url)?;
            state
                .media_service
                .store_image(PREFIX_PRODUCTS, &bytes, extension)
                .await?
        }
        _ => String::new(),
    };

    let product_id = generate_product_id();

    sqlx::query(
        "INSERT INTO products (id, name, description, price, image, category) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&product_id)
    .bind(payload.name.trim())
    .bind(payload.description.as_deref().unwrap_or(""))
    .bind(payload.price)
    .bind(&image_url)
    .bind(payload.category.as_deref().unwrap_or(""))
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let product = fetch_product(&state, &product_id).await?;

    info!(
        admin_user_id = %admin.id,
        product_id = %product.id,
        name = %product.name,
        "Product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /api/products/:id - Flip the featured flag
pub async fn toggle_featured_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let state = state_lock.read().await.clone();

    let product = fetch_product(&state, &id).await?;

    sqlx::query("UPDATE products SET is_featured = ? WHERE id = ?")
        .bind(!product.is_featured)
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let updated = fetch_product(&state, &id).await?;

    info!(
        admin_user_id = %admin.id,
        product_id = %id,
        is_featured = updated.is_featured,
        "Product featured flag toggled"
    );

    Ok(Json(updated))
}

/// DELETE /api/products/:id - Delete a product and its stored image
pub async fn delete_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let product = fetch_product(&state, &id).await?;

    // Media cleanup is best effort; a stale file never blocks the delete
    if !product.image.is_empty() {
        if let Err(e) = state.media_service.delete_image(&product.image).await {
            warn!(error = %e, product_id = %id, "Failed to delete product image");
        }
    }

    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, product_id = %id, "Database error deleting product");
            ApiError::DatabaseError(e)
        })?;

    info!(admin_user_id = %admin.id, product_id = %id, "Product deleted");

    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}

/// GET /api/media/products/:filename - Serve locally stored product images
pub async fn serve_product_image(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let safe_filename = sanitize_filename(&filename);
    let file_content = state
        .media_service
        .read_local(PREFIX_PRODUCTS, &safe_filename)
        .await?;

    let extension = extension_from_filename(&safe_filename).unwrap_or("jpg");
    let content_type = content_type_for_extension(extension);

    Ok((
        StatusCode::OK,
        [
            ("Content-Type", content_type),
            ("Cache-Control", "public, max-age=31536000"),
        ],
        file_content,
    ))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape `%`, `_` and the escape character itself for a LIKE pattern
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Load a product row by id, or 404
async fn fetch_product(state: &AppState, product_id: &str) -> Result<Product, ApiError> {
    let product: Option<Product> = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = ?",
    )
    .bind(product_id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    product.ok_or_else(|| {
        warn!(product_id = %product_id, "Product not found");
        ApiError::NotFound("Product not found".to_string())
    })
}

/// Decode a `data:image/...;base64,` URL into raw bytes plus an extension
fn decode_image_data_url(data_url: &str) -> Result<(Vec<u8>, &'static str), ApiError> {
    if !data_url.starts_with("data:image/") {
        return Err(ApiError::BadRequest(
            "Image must be a base64 data URL".to_string(),
        ));
    }

    let payload = data_url
        .split(',')
        .nth(1)
        .ok_or_else(|| ApiError::BadRequest("Invalid base64 image data".to_string()))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|_| ApiError::BadRequest("Invalid base64 image data".to_string()))?;

    let extension = if data_url.starts_with("data:image/png") {
        "png"
    } else if data_url.starts_with("data:image/gif") {
        "gif"
    } else if data_url.starts_with("data:image/webp") {
        "webp"
    } else {
        "jpg"
    };

    Ok((bytes, extension))
}
