// src/auth/handlers.rs

use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::cookies::{
    access_token_cookie, refresh_token_cookie, removal_cookie, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use super::extractors::AuthedUser;
use super::models::{
    ForgotPasswordRequest, LoginRequest, MessageResponse, ResetPasswordRequest, SignupRequest,
    User, UserResponse,
};
use super::validators::validate_new_password;
use crate::common::{
    generate_user_id, safe_email_log, safe_token_log, ApiError, AppState, Validator,
};
use crate::services::email::{generate_password_reset_email, PASSWORD_RESET_SUBJECT};
use crate::services::media::{
    content_type_for_extension, extension_from_filename, is_valid_image_type, sanitize_filename,
    MAX_IMAGE_SIZE, PREFIX_AVATARS,
};
use crate::services::password::{hash_password, verify_password};

/// Reset tickets stay valid for 10 minutes
const RESET_TOKEN_TTL_SECONDS: i64 = 600;

/// POST /api/auth/signup - Create an account and start a session
pub async fn signup(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = payload.validate();
    if !validation_result.is_valid {
        warn!(
            email = %safe_email_log(&payload.email),
            error_count = validation_result.errors.len(),
            "Signup validation failed"
        );
        return Err(ApiError::from(validation_result));
    }

    let email = payload.email.trim().to_lowercase();

    // Email uniqueness is enforced at write time
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if existing.is_some() {
        warn!(email = %safe_email_log(&email), "Signup rejected: email already registered");
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed during signup");
        ApiError::InternalServer("Failed to create user".to_string())
    })?;

    let user_id = generate_user_id();

    sqlx::query("INSERT INTO users (id, name, email, password_hash) VALUES (?, ?, ?, ?)")
        .bind(&user_id)
        .bind(payload.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let jar = issue_session(&state, jar, &user_id).await?;
    let user = fetch_user(&state, &user_id).await?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User signed up successfully"
    );

    Ok((StatusCode::CREATED, jar, Json(UserResponse::from(user))))
}

/// POST /api/auth/login - Verify credentials and start a session
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let email = payload.email.trim().to_lowercase();

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    // Unknown email and wrong password get the same answer
    let user = match user {
        Some(u) => u,
        None => {
            warn!(email = %safe_email_log(&email), "Login failed: unknown email");
            return Err(ApiError::BadRequest(
                "Invalid email or password".to_string(),
            ));
        }
    };

    let password_ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = %user.id, "Password verification failed");
        ApiError::InternalServer("Login failed".to_string())
    })?;

    if !password_ok {
        warn!(
            user_id = %user.id,
            email = %safe_email_log(&email),
            "Login failed: wrong password"
        );
        return Err(ApiError::BadRequest(
            "Invalid email or password".to_string(),
        ));
    }

    // A new login overwrites the stored refresh token, ending earlier sessions
    let jar = issue_session(&state, jar, &user.id).await?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "User logged in successfully"
    );

    Ok((jar, Json(UserResponse::from(user))))
}

/// POST /api/auth/logout - Revoke the session and clear cookies
pub async fn logout(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    // Best effort revocation: an absent or garbled cookie still logs out
    if let Some(cookie) = jar.get(REFRESH_TOKEN_COOKIE) {
        match state.tokens.verify_refresh_token(cookie.value()) {
            Ok(claims) => {
                state.refresh_tokens.revoke(&claims.sub).await;
                info!(user_id = %claims.sub, "Refresh token revoked on logout");
            }
            Err(e) => {
                debug!(error = %e, "Ignoring invalid refresh token on logout");
            }
        }
    }

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// POST /api/auth/refresh-token - Reissue the access token
///
/// The cookie's refresh token must exactly match the stored copy for the
/// user; a later login elsewhere overwrites that copy and strands older
/// sessions. The refresh token itself is not rotated.
pub async fn refresh_token(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let state = state_lock.read().await.clone();

    let presented = match jar.get(REFRESH_TOKEN_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => {
            warn!("Token refresh failed: no refresh token cookie");
            return Err(ApiError::Unauthorized(
                "No refresh token provided".to_string(),
            ));
        }
    };

    let claims = state.tokens.verify_refresh_token(&presented).map_err(|e| {
        warn!(error = %e, "Token refresh failed: refresh token did not verify");
        ApiError::Unauthorized("Invalid refresh token".to_string())
    })?;

    let stored = state.refresh_tokens.get(&claims.sub).await;
    if stored.as_deref() != Some(presented.as_str()) {
        warn!(
            user_id = %claims.sub,
            token = %safe_token_log(&presented),
            "Token refresh failed: stored token missing or superseded"
        );
        return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
    }

    let access_token = state.tokens.sign_access_token(&claims.sub).map_err(|e| {
        error!(error = %e, user_id = %claims.sub, "Failed to sign access token");
        ApiError::InternalServer("Failed to refresh token".to_string())
    })?;

    let jar = jar.add(access_token_cookie(access_token, state.is_production()));

    debug!(user_id = %claims.sub, "Access token reissued");

    Ok((
        jar,
        Json(MessageResponse {
            message: "Token refreshed successfully".to_string(),
        }),
    ))
}

/// GET /api/auth/profile - Return the caller's user record
pub async fn get_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<User>, ApiError> {
    let state = state_lock.read().await.clone();
    let user = fetch_user(&state, &authed.id).await?;
    Ok(Json(user))
}

/// PATCH /api/auth/profile - Update profile fields and optional picture
///
/// Multipart form with optional `name`, `email`, `password` and
/// `profilePicture` parts; absent parts leave the column untouched.
pub async fn update_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let mut new_name: Option<String> = None;
    let mut new_email: Option<String> = None;
    let mut new_password_hash: Option<String> = None;
    let mut new_picture: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "name" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("Failed to read name field".to_string()))?;
                if value.trim().is_empty() {
                    return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
                }
                new_name = Some(value.trim().to_string());
            }
            "email" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("Failed to read email field".to_string()))?;
                let email = value.trim().to_lowercase();
                if !email.contains('@') {
                    return Err(ApiError::BadRequest(
                        "Email must be a valid email address".to_string(),
                    ));
                }

                let taken: Option<(String,)> =
                    sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
                        .bind(&email)
                        .bind(&authed.id)
                        .fetch_optional(&state.db)
                        .await
                        .map_err(ApiError::DatabaseError)?;
                if taken.is_some() {
                    warn!(
                        user_id = %authed.id,
                        email = %safe_email_log(&email),
                        "Profile update rejected: email already in use"
                    );
                    return Err(ApiError::BadRequest("Email is already in use".to_string()));
                }

                new_email = Some(email);
            }
            "password" => {
                let value = field.text().await.map_err(|_| {
                    ApiError::BadRequest("Failed to read password field".to_string())
                })?;
                let validation_result = validate_new_password(&value);
                if !validation_result.is_valid {
                    return Err(ApiError::from(validation_result));
                }
                let hash = hash_password(&value).map_err(|e| {
                    error!(error = %e, user_id = %authed.id, "Password hashing failed");
                    ApiError::InternalServer("Failed to update password".to_string())
                })?;
                new_password_hash = Some(hash);
            }
            "profilePicture" => {
                let filename = field
                    .file_name()
                    .map(sanitize_filename)
                    .unwrap_or_else(|| "upload.jpg".to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest("Failed to read file data".to_string()))?;

                if data.len() > MAX_IMAGE_SIZE {
                    return Err(ApiError::BadRequest(
                        "File size exceeds 5MB limit".to_string(),
                    ));
                }

                if !is_valid_image_type(&data) {
                    return Err(ApiError::BadRequest(
                        "Invalid image type. Only JPEG, PNG, GIF, and WebP are supported"
                            .to_string(),
                    ));
                }

                let extension = extension_from_filename(&filename).unwrap_or("jpg");
                let url = state
                    .media_service
                    .store_image(PREFIX_AVATARS, &data, extension)
                    .await?;
                new_picture = Some(url);
            }
            _ => {
                debug!(field = %field_name, "Ignoring unknown multipart field");
            }
        }
    }

    // Remember the picture being replaced so its file can be cleaned up
    let old_picture = if new_picture.is_some() {
        fetch_user(&state, &authed.id).await?.profile_picture
    } else {
        None
    };

    sqlx::query(
        r#"UPDATE users SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            password_hash = COALESCE(?, password_hash),
            profile_picture = COALESCE(?, profile_picture)
        WHERE id = ?"#,
    )
    .bind(new_name.as_deref())
    .bind(new_email.as_deref())
    .bind(new_password_hash.as_deref())
    .bind(new_picture.as_deref())
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    if let Some(old_url) = old_picture {
        if let Err(e) = state.media_service.delete_image(&old_url).await {
            warn!(error = %e, url = %old_url, "Failed to delete replaced profile picture");
        }
    }

    let user = fetch_user(&state, &authed.id).await?;

    info!(user_id = %user.id, "Profile updated successfully");

    Ok(Json(UserResponse::from(user)))
}

/// POST /api/auth/forgot-password - Issue a password reset ticket
pub async fn forgot_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let email = payload.email.trim().to_lowercase();

    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let user = match user {
        Some(u) => u,
        None => {
            warn!(email = %safe_email_log(&email), "Password reset requested for unknown email");
            return Err(ApiError::NotFound("User not found".to_string()));
        }
    };

    let raw_token = create_reset_ticket(&state, &user.id).await?;
    let reset_url = format!("{}/reset-password/{}", state.client_url, raw_token);

    info!(
        user_id = %user.id,
        token = %safe_token_log(&raw_token),
        "Password reset ticket created"
    );

    // The ticket stays valid even if delivery fails; the caller just sees
    // a server error and may retry, which mints a fresh ticket.
    let body = generate_password_reset_email(&user.name, &reset_url);
    state
        .aws_service
        .send_email(&user.email, PASSWORD_RESET_SUBJECT, &body)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                user_id = %user.id,
                "Failed to send password reset email"
            );
            ApiError::InternalServer("Failed to send password reset email".to_string())
        })?;

    info!(
        user_id = %user.id,
        email = %safe_email_log(&user.email),
        "Password reset email sent"
    );

    Ok(Json(MessageResponse {
        message: "Password reset link sent to your email".to_string(),
    }))
}

/// POST /api/auth/reset-password/:token - Consume a reset ticket
pub async fn reset_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let validation_result = validate_new_password(&payload.password);
    if !validation_result.is_valid {
        return Err(ApiError::from(validation_result));
    }

    // Wrong token and expired ticket are deliberately indistinguishable
    let token_hash = hash_reset_token(&token);
    let now = Utc::now().timestamp();

    let user: Option<User> = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE reset_token_hash = ? AND reset_token_expires > ?",
    )
    .bind(&token_hash)
    .bind(now)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let user = match user {
        Some(u) => u,
        None => {
            warn!(
                token = %safe_token_log(&token),
                "Password reset failed: no matching unexpired ticket"
            );
            return Err(ApiError::BadRequest(
                "Invalid or expired reset token".to_string(),
            ));
        }
    };

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, user_id = %user.id, "Password hashing failed during reset");
        ApiError::InternalServer("Failed to reset password".to_string())
    })?;

    // Consuming the ticket clears both fields, making it single-use
    sqlx::query(
        "UPDATE users SET password_hash = ?, reset_token_hash = NULL, reset_token_expires = NULL WHERE id = ?",
    )
    .bind(&password_hash)
    .bind(&user.id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    info!(user_id = %user.id, "Password reset successful");

    Ok(Json(MessageResponse {
        message: "Password reset successful".to_string(),
    }))
}

/// GET /api/media/avatars/:filename - Serve locally stored profile pictures
pub async fn serve_profile_picture(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let safe_filename = sanitize_filename(&filename);
    let file_content = state
        .media_service
        .read_local(PREFIX_AVATARS, &safe_filename)
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

/// Mint a token pair, persist the refresh copy and set both cookies
async fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user_id: &str,
) -> Result<CookieJar, ApiError> {
    let pair = state.tokens.issue_pair(user_id).map_err(|e| {
        error!(error = %e, user_id = %user_id, "Failed to sign session tokens");
        ApiError::InternalServer("Failed to create session".to_string())
    })?;

    state
        .refresh_tokens
        .store(user_id, &pair.refresh_token)
        .await;

    let secure = state.is_production();
    Ok(jar
        .add(access_token_cookie(pair.access_token, secure))
        .add(refresh_token_cookie(pair.refresh_token, secure)))
}

/// Generate a reset ticket for a user and return the raw token.
///
/// Only the sha256 of the raw token is persisted; the raw value goes out
/// once, inside the emailed link.
pub(super) async fn create_reset_ticket(
    state: &AppState,
    user_id: &str,
) -> Result<String, ApiError> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw_token = hex::encode(bytes);

    let token_hash = hash_reset_token(&raw_token);
    let expires = Utc::now().timestamp() + RESET_TOKEN_TTL_SECONDS;

    sqlx::query("UPDATE users SET reset_token_hash = ?, reset_token_expires = ? WHERE id = ?")
        .bind(&token_hash)
        .bind(expires)
        .bind(user_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(raw_token)
}

/// sha256 of the raw token string, hex encoded
fn hash_reset_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Load a user row by id
async fn fetch_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    let user: Option<User> = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    user.ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}
