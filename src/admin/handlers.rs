// src/admin/handlers.rs

use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::auth::models::MessageResponse;
use crate::auth::{AdminUser, User};
use crate::common::{ApiError, AppState};

/// GET /api/auth/users - List every user account
pub async fn list_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let state = state_lock.read().await.clone();

    let users = fetch_all_users(&state).await?;

    info!(
        admin_user_id = %admin.id,
        user_count = users.len(),
        "User list fetched"
    );

    Ok(Json(users))
}

/// DELETE /api/auth/users/:id - Delete a user account
///
/// Admins cannot delete their own account.
pub async fn delete_user(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let target: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let target = match target {
        Some(u) => u,
        None => {
            warn!(admin_user_id = %admin.id, target_user_id = %id, "User deletion failed: not found");
            return Err(ApiError::NotFound("User not found".to_string()));
        }
    };

    if target.id == admin.id {
        warn!(admin_user_id = %admin.id, "User deletion rejected: self-deletion");
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&target.id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, target_user_id = %target.id, "Database error deleting user");
            ApiError::DatabaseError(e)
        })?;

    info!(
        admin_user_id = %admin.id,
        target_user_id = %target.id,
        "User deleted"
    );

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

/// PATCH /api/auth/users/:id/make-admin - Promote a user to admin
///
/// Responds with the full updated user list rather than just the target.
pub async fn make_user_admin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<User>>, ApiError> {
    let state = state_lock.read().await.clone();

    let target: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let target = match target {
        Some(u) => u,
        None => {
            warn!(admin_user_id = %admin.id, target_user_id = %id, "Promotion failed: not found");
            return Err(ApiError::NotFound("User not found".to_string()));
        }
    };

    if target.id == admin.id {
        warn!(admin_user_id = %admin.id, "Promotion rejected: cannot change own role");
        return Err(ApiError::BadRequest(
            "You cannot change your own role".to_string(),
        ));
    }

    if target.role.is_admin() {
        warn!(
            admin_user_id = %admin.id,
            target_user_id = %target.id,
            "Promotion rejected: already an admin"
        );
        return Err(ApiError::BadRequest(
            "User is already an admin".to_string(),
        ));
    }

    sqlx::query("UPDATE users SET role = 'admin' WHERE id = ?")
        .bind(&target.id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, target_user_id = %target.id, "Database error promoting user");
            ApiError::DatabaseError(e)
        })?;

    info!(
        admin_user_id = %admin.id,
        target_user_id = %target.id,
        "User promoted to admin"
    );

    let users = fetch_all_users(&state).await?;
    Ok(Json(users))
}

/// Load all users, newest first
async fn fetch_all_users(state: &AppState) -> Result<Vec<User>, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching user list");
            ApiError::DatabaseError(e)
        })
}
