//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::cookies::ACCESS_TOKEN_COOKIE;
use super::models::{Role, User};
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated user extractor
///
/// Reads the access-token cookie, verifies the JWT and loads the user row.
/// Handlers that only need a signed-in caller declare this parameter.
#[derive(Debug)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the Extension containing the AppState
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        // Session tokens travel in cookies, not Authorization headers
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(ACCESS_TOKEN_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => {
                warn!("Authentication failed: no access token cookie");
                return Err(ApiError::Unauthorized(
                    "No access token provided".to_string(),
                ));
            }
        };

        let claims = match app_state.tokens.verify_access_token(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Access token validation failed");
                let message =
                    if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature) {
                        "Access token expired"
                    } else {
                        "Invalid access token"
                    };
                return Err(ApiError::Unauthorized(message.to_string()));
            }
        };

        let user_id = claims.sub;

        // Look up user in database
        let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_optional(&app_state.db)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    user_id = %user_id,
                    "Database error during user lookup in authentication"
                );
                ApiError::DatabaseError(e)
            })?;

        match user {
            Some(u) => {
                debug!(
                    user_id = %u.id,
                    email = %safe_email_log(&u.email),
                    role = %u.role,
                    "User authentication successful via extractor"
                );
                Ok(AuthedUser {
                    id: u.id,
                    email: u.email,
                    role: u.role,
                })
            }
            None => {
                warn!(user_id = %user_id, "Authentication failed: user not found in database");
                Err(ApiError::Unauthorized("User not found".to_string()))
            }
        }
    }
}

/// Admin-only extractor
///
/// The authorization policy for admin routes lives here: a route declares
/// `AdminUser` in its handler signature and the role check runs exactly
/// once, before the handler body.
#[derive(Debug)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authed = AuthedUser::from_request_parts(parts, state).await?;

        if !authed.role.is_admin() {
            warn!(
                user_id = %authed.id,
                email = %safe_email_log(&authed.email),
                "Admin access denied"
            );
            return Err(ApiError::Forbidden("Access denied - Admin only".to_string()));
        }

        Ok(AdminUser {
            id: authed.id,
            email: authed.email,
        })
    }
}
