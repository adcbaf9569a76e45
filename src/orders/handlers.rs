// src/orders/handlers.rs

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{
    CreateOrderRequest, OrderItemResponse, OrderResponse, OrderRow, UpdateDeliveredRequest,
    UpdatePaidRequest,
};
use crate::auth::models::MessageResponse;
use crate::auth::{AdminUser, AuthedUser};
use crate::common::{generate_line_item_id, generate_order_id, ApiError, AppState};

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.user_id, u.name AS user_name, o.total_amount,
           o.is_paid, o.is_delivered, o.stripe_session_id, o.created_at
    FROM orders o
    LEFT JOIN users u ON u.id = o.user_id
"#;

/// POST /api/auth/orders - Create an order from a cart snapshot
///
/// The total amount comes from the client and is stored as-is; it is not
/// recomputed from current catalog prices.
pub async fn create_order(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let products = match payload.products {
        Some(p) if !p.is_empty() => p,
        _ => {
            warn!(user_id = %authed.id, "Order creation failed: no products");
            return Err(ApiError::BadRequest(
                "Please provide products and a total amount".to_string(),
            ));
        }
    };
    let total_amount = match payload.total_amount {
        Some(t) => t,
        None => {
            warn!(user_id = %authed.id, "Order creation failed: no total amount");
            return Err(ApiError::BadRequest(
                "Please provide products and a total amount".to_string(),
            ));
        }
    };

    let order_id = generate_order_id();

    // The order and its line items land atomically
    let mut tx = state.db.begin().await.map_err(ApiError::DatabaseError)?;

    sqlx::query(
        "INSERT INTO orders (id, user_id, total_amount, stripe_session_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&order_id)
    .bind(&authed.id)
    .bind(total_amount)
    .bind(payload.stripe_session_id.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(ApiError::DatabaseError)?;

    for item in &products {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, quantity, price) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(generate_line_item_id())
        .bind(&order_id)
        .bind(&item.product)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;
    }

    tx.commit().await.map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %authed.id,
        order_id = %order_id,
        item_count = products.len(),
        total_amount = total_amount,
        "Order created"
    );

    let order = load_order(&state, &order_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/auth/my-orders - List the caller's own orders
pub async fn my_orders(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let state = state_lock.read().await.clone();

    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
        "{} WHERE o.user_id = ? ORDER BY o.created_at DESC",
        ORDER_SELECT
    ))
    .bind(&authed.id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let orders = attach_items(&state, rows).await?;
    Ok(Json(orders))
}

/// GET /api/auth/orders - List all orders
pub async fn list_orders(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let state = state_lock.read().await.clone();

    let rows: Vec<OrderRow> =
        sqlx::query_as(&format!("{} ORDER BY o.created_at DESC", ORDER_SELECT))
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    info!(admin_user_id = %admin.id, order_count = rows.len(), "Order list fetched");

    let orders = attach_items(&state, rows).await?;
    Ok(Json(orders))
}

/// GET /api/auth/orders/:id - Fetch one order
pub async fn get_order(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let order = load_order(&state, &id).await?;
    Ok(Json(order))
}

/// DELETE /api/auth/orders/:id - Delete an order and its line items
pub async fn delete_order(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    ensure_order_exists(&state, &id).await?;

    sqlx::query("DELETE FROM order_items WHERE order_id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, order_id = %id, "Database error deleting order");
            ApiError::DatabaseError(e)
        })?;

    info!(admin_user_id = %admin.id, order_id = %id, "Order deleted");

    Ok(Json(MessageResponse {
        message: "Order deleted successfully".to_string(),
    }))
}

/// PATCH /api/auth/orders/:id/paid - Overwrite the paid flag
pub async fn update_paid_status(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePaidRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    ensure_order_exists(&state, &id).await?;

    sqlx::query("UPDATE orders SET is_paid = ? WHERE id = ?")
        .bind(payload.is_paid)
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        admin_user_id = %admin.id,
        order_id = %id,
        is_paid = payload.is_paid,
        "Order paid status updated"
    );

    let order = load_order(&state, &id).await?;
    Ok(Json(order))
}

/// PATCH /api/auth/orders/:id/delivered - Overwrite the delivered flag
///
/// Delivery is independent of payment; an unpaid order can be marked
/// delivered and a delivered order can be unmarked.
pub async fn update_delivered_status(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDeliveredRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    ensure_order_exists(&state, &id).await?;

    sqlx::query("UPDATE orders SET is_delivered = ? WHERE id = ?")
        .bind(payload.is_delivered)
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        admin_user_id = %admin.id,
        order_id = %id,
        is_delivered = payload.is_delivered,
        "Order delivered status updated"
    );

    let order = load_order(&state, &id).await?;
    Ok(Json(order))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Load one order with its joined line items, or 404
async fn load_order(state: &AppState, order_id: &str) -> Result<OrderResponse, ApiError> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("{} WHERE o.id = ?", ORDER_SELECT))
        .bind(order_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let row = match row {
        Some(r) => r,
        None => {
            warn!(order_id = %order_id, "Order not found");
            return Err(ApiError::NotFound("Order not found".to_string()));
        }
    };

    let items = fetch_items(state, order_id).await?;
    Ok(row.into_response(items))
}

async fn ensure_order_exists(state: &AppState, order_id: &str) -> Result<(), ApiError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if count == 0 {
        warn!(order_id = %order_id, "Order not found");
        return Err(ApiError::NotFound("Order not found".to_string()));
    }

    Ok(())
}

/// Fetch line items with product display fields joined in. Deleted
/// products leave name and image NULL rather than dropping the line.
async fn fetch_items(state: &AppState, order_id: &str) -> Result<Vec<OrderItemResponse>, ApiError> {
    sqlx::query_as::<_, OrderItemResponse>(
        r#"
        SELECT oi.product_id, p.name AS product_name, p.image AS product_image,
               oi.quantity, oi.price
        FROM order_items oi
        LEFT JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = ?
        "#,
    )
    .bind(order_id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)
}

async fn attach_items(
    state: &AppState,
    rows: Vec<OrderRow>,
) -> Result<Vec<OrderResponse>, ApiError> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = fetch_items(state, &row.id).await?;
        orders.push(row.into_response(items));
    }
    Ok(orders)
}
