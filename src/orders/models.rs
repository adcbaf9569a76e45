//! Order data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// POST /api/auth/orders request body. The fields mirror the checkout
/// cart snapshot; `products` and `totalAmount` are required, the payment
/// session reference is optional.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub products: Option<Vec<OrderItemInput>>,
    pub total_amount: Option<f64>,
    pub stripe_session_id: Option<String>,
}

/// One cart line: product reference, quantity and the unit price the
/// client saw at checkout time.
#[derive(Deserialize, Debug)]
pub struct OrderItemInput {
    pub product: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaidRequest {
    pub is_paid: bool,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeliveredRequest {
    pub is_delivered: bool,
}

/// Order row joined with the owning user's name
#[derive(FromRow, Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub total_amount: f64,
    pub is_paid: bool,
    pub is_delivered: bool,
    pub stripe_session_id: Option<String>,
    pub created_at: Option<String>,
}

impl OrderRow {
    pub fn into_response(self, products: Vec<OrderItemResponse>) -> OrderResponse {
        OrderResponse {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            products,
            total_amount: self.total_amount,
            is_paid: self.is_paid,
            is_delivered: self.is_delivered,
            stripe_session_id: self.stripe_session_id,
            created_at: self.created_at,
        }
    }
}

/// Line item joined with the product's display fields. Name and image are
/// looked up at read time; only the price is frozen at purchase.
#[derive(FromRow, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
    pub quantity: i64,
    pub price: f64,
}

/// Full order as returned by the API
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub products: Vec<OrderItemResponse>,
    pub total_amount: f64,
    pub is_paid: bool,
    pub is_delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_session_id: Option<String>,
    pub created_at: Option<String>,
}
