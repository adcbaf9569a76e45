//! Tests for auth module
//!
//! These tests verify core session functionality including:
//! - Signup, login and logout handler behavior
//! - The refresh-token exact-match check
//! - The password-reset ticket flow
//! - AuthedUser/AdminUser extractor rejections

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::extract::{Extension, FromRequestParts, Json, Path};
    use axum::http::{Request, StatusCode};
    use axum_extra::extract::cookie::Cookie;
    use axum_extra::extract::CookieJar;
    use chrono::Utc;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::common::{migrations, ApiError, AppState};
    use crate::services::{AwsService, MediaService, RefreshTokenStore, TokenService};

    use super::super::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
    use super::super::models::{
        ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest, UserResponse,
    };

    async fn setup_test_state() -> Arc<RwLock<AppState>> {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        migrations::run_migrations(&pool).await.unwrap();

        let aws_service = Arc::new(AwsService::new(None));
        let media_dir = std::env::temp_dir().join(format!(
            "store_auth_test_{}",
            crate::common::generate_raw_id(8)
        ));

        let state = AppState {
            db: pool,
            media_dir: media_dir.clone(),
            client_url: "http://localhost:3000".to_string(),
            environment: "test".to_string(),
            tokens: TokenService::new(
                "test_access_secret".to_string(),
                "test_refresh_secret".to_string(),
            ),
            refresh_tokens: Arc::new(RefreshTokenStore::new()),
            aws_service: aws_service.clone(),
            media_service: Arc::new(MediaService::new(aws_service, media_dir)),
        };

        Arc::new(RwLock::new(state))
    }

    fn signup_payload(email: &str) -> SignupRequest {
        SignupRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
        }
    }

    async fn signup_user(state: &Arc<RwLock<AppState>>, email: &str) -> (UserResponse, CookieJar) {
        let (status, jar, Json(user)) = handlers::signup(
            Extension(state.clone()),
            CookieJar::new(),
            Json(signup_payload(email)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        (user, jar)
    }

    fn cookie_value(jar: &CookieJar, name: &str) -> String {
        jar.get(name).map(|c| c.value().to_string()).unwrap()
    }

    /// Builds request parts carrying the app state and an optional cookie header
    fn request_parts(
        state: &Arc<RwLock<AppState>>,
        cookie_header: Option<String>,
    ) -> axum::http::request::Parts {
        let mut builder = Request::builder().uri("/api/auth/profile");
        if let Some(header) = cookie_header {
            builder = builder.header("cookie", header);
        }
        let mut request = builder.body(()).unwrap();
        request.extensions_mut().insert(state.clone());
        let (parts, _) = request.into_parts();
        parts
    }

    #[tokio::test]
    async fn test_signup_sets_cookies_and_hides_password() {
        let state = setup_test_state().await;
        let (user, jar) = signup_user(&state, "a@x.com").await;

        assert!(user.id.starts_with("U_"));
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, Role::Customer);
        assert!(jar.get(ACCESS_TOKEN_COOKIE).is_some());
        assert!(jar.get(REFRESH_TOKEN_COOKIE).is_some());

        // No password material in the serialized body
        let body = serde_json::to_value(&user).unwrap();
        assert!(body.get("password").is_none());
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("resetTokenHash").is_none());
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_rejected() {
        let state = setup_test_state().await;
        signup_user(&state, "dup@x.com").await;

        // Same address with different case still collides
        let result = handlers::signup(
            Extension(state.clone()),
            CookieJar::new(),
            Json(signup_payload("DUP@x.com")),
        )
        .await;

        match result {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "User already exists"),
            other => panic!("Expected BadRequest, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let state = setup_test_state().await;
        let mut payload = signup_payload("short@x.com");
        payload.password = "abc".to_string();

        let result =
            handlers::signup(Extension(state.clone()), CookieJar::new(), Json(payload)).await;

        match result {
            Err(ApiError::ValidationError(msg)) => {
                assert!(msg.contains("at least 6 characters"));
            }
            other => panic!("Expected ValidationError, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_login_returns_user_and_cookies() {
        let state = setup_test_state().await;
        let (created, _) = signup_user(&state, "login@x.com").await;

        let (jar, Json(user)) = handlers::login(
            Extension(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                email: "login@x.com".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(user.id, created.id);
        assert!(jar.get(ACCESS_TOKEN_COOKIE).is_some());
        assert!(jar.get(REFRESH_TOKEN_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let state = setup_test_state().await;
        signup_user(&state, "victim@x.com").await;

        let wrong_password = handlers::login(
            Extension(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                email: "victim@x.com".to_string(),
                password: "not-the-password".to_string(),
            }),
        )
        .await;

        let unknown_email = handlers::login(
            Extension(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                email: "nobody@x.com".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await;

        for result in [wrong_password, unknown_email] {
            match result {
                Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Invalid email or password"),
                other => panic!("Expected BadRequest, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[tokio::test]
    async fn test_refresh_reissues_access_token() {
        let state = setup_test_state().await;
        let (_, jar) = signup_user(&state, "refresh@x.com").await;

        let refresh = cookie_value(&jar, REFRESH_TOKEN_COOKIE);
        let request_jar = CookieJar::new().add(Cookie::new(REFRESH_TOKEN_COOKIE, refresh));

        let (new_jar, Json(response)) =
            handlers::refresh_token(Extension(state.clone()), request_jar)
                .await
                .unwrap();

        assert_eq!(response.message, "Token refreshed successfully");
        assert!(new_jar.get(ACCESS_TOKEN_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_refresh_rejected_without_cookie() {
        let state = setup_test_state().await;

        let result = handlers::refresh_token(Extension(state.clone()), CookieJar::new()).await;

        match result {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "No refresh token provided"),
            other => panic!("Expected Unauthorized, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_refresh_rejected_after_later_login() {
        let state = setup_test_state().await;
        let (_, first_jar) = signup_user(&state, "stale@x.com").await;
        let stale_refresh = cookie_value(&first_jar, REFRESH_TOKEN_COOKIE);

        // A second login overwrites the stored refresh token
        handlers::login(
            Extension(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                email: "stale@x.com".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await
        .unwrap();

        let request_jar = CookieJar::new().add(Cookie::new(REFRESH_TOKEN_COOKIE, stale_refresh));
        let result = handlers::refresh_token(Extension(state.clone()), request_jar).await;

        // Signature-valid and unexpired, but no longer the stored copy
        match result {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "Invalid refresh token"),
            other => panic!("Expected Unauthorized, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_logout_revokes_and_clears_cookies() {
        let state = setup_test_state().await;
        let (user, jar) = signup_user(&state, "logout@x.com").await;

        let (result_jar, Json(response)) = handlers::logout(Extension(state.clone()), jar)
            .await
            .unwrap();

        assert_eq!(response.message, "Logged out successfully");

        // Store entry gone, so the old refresh token can no longer be honored
        let app_state = state.read().await.clone();
        assert!(app_state.refresh_tokens.get(&user.id).await.is_none());

        // Removal cookies carry empty values
        for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
            if let Some(cookie) = result_jar.get(name) {
                assert!(cookie.value().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_logout_without_cookies_still_succeeds() {
        let state = setup_test_state().await;

        let (_, Json(response)) = handlers::logout(Extension(state.clone()), CookieJar::new())
            .await
            .unwrap();

        assert_eq!(response.message, "Logged out successfully");
    }

    #[tokio::test]
    async fn test_get_profile_returns_caller() {
        let state = setup_test_state().await;
        let (user, _) = signup_user(&state, "profile@x.com").await;

        let authed = AuthedUser {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        };
        let Json(profile) = handlers::get_profile(Extension(state.clone()), authed)
            .await
            .unwrap();

        assert_eq!(profile.id, user.id);
        assert_eq!(profile.email, "profile@x.com");
    }

    #[tokio::test]
    async fn test_reset_flow_end_to_end() {
        let state = setup_test_state().await;
        let (user, _) = signup_user(&state, "reset@x.com").await;

        let app_state = state.read().await.clone();
        let raw_token = handlers::create_reset_ticket(&app_state, &user.id)
            .await
            .unwrap();

        let Json(response) = handlers::reset_password(
            Extension(state.clone()),
            Path(raw_token.clone()),
            Json(ResetPasswordRequest {
                password: "newsecret456".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.message, "Password reset successful");

        // New password works, old one does not
        assert!(handlers::login(
            Extension(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                email: "reset@x.com".to_string(),
                password: "newsecret456".to_string(),
            }),
        )
        .await
        .is_ok());

        assert!(handlers::login(
            Extension(state.clone()),
            CookieJar::new(),
            Json(LoginRequest {
                email: "reset@x.com".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await
        .is_err());

        // The ticket is single-use
        let second = handlers::reset_password(
            Extension(state.clone()),
            Path(raw_token),
            Json(ResetPasswordRequest {
                password: "thirdsecret789".to_string(),
            }),
        )
        .await;
        match second {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, "Invalid or expired reset token"),
            other => panic!("Expected BadRequest, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_reset_wrong_and_expired_tokens_same_error() {
        let state = setup_test_state().await;
        let (user, _) = signup_user(&state, "expired@x.com").await;

        let app_state = state.read().await.clone();
        let raw_token = handlers::create_reset_ticket(&app_state, &user.id)
            .await
            .unwrap();

        // Force the ticket past its expiry
        sqlx::query("UPDATE users SET reset_token_expires = ? WHERE id = ?")
            .bind(Utc::now().timestamp() - 60)
            .bind(&user.id)
            .execute(&app_state.db)
            .await
            .unwrap();

        let expired = handlers::reset_password(
            Extension(state.clone()),
            Path(raw_token),
            Json(ResetPasswordRequest {
                password: "newsecret456".to_string(),
            }),
        )
        .await;

        let wrong = handlers::reset_password(
            Extension(state.clone()),
            Path("0".repeat(64)),
            Json(ResetPasswordRequest {
                password: "newsecret456".to_string(),
            }),
        )
        .await;

        for result in [expired, wrong] {
            match result {
                Err(ApiError::BadRequest(msg)) => {
                    assert_eq!(msg, "Invalid or expired reset token")
                }
                other => panic!("Expected BadRequest, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_is_not_found() {
        let state = setup_test_state().await;

        let result = handlers::forgot_password(
            Extension(state.clone()),
            Json(ForgotPasswordRequest {
                email: "ghost@x.com".to_string(),
            }),
        )
        .await;

        match result {
            Err(ApiError::NotFound(msg)) => assert_eq!(msg, "User not found"),
            other => panic!("Expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_forgot_password_keeps_ticket_when_email_fails() {
        // AWS is unconfigured in tests, so delivery fails after the ticket
        // was written; the ticket must survive.
        let state = setup_test_state().await;
        let (user, _) = signup_user(&state, "mailfail@x.com").await;

        let result = handlers::forgot_password(
            Extension(state.clone()),
            Json(ForgotPasswordRequest {
                email: "mailfail@x.com".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::InternalServer(_))));

        let app_state = state.read().await.clone();
        let row: (Option<String>, Option<i64>) = sqlx::query_as(
            "SELECT reset_token_hash, reset_token_expires FROM users WHERE id = ?",
        )
        .bind(&user.id)
        .fetch_one(&app_state.db)
        .await
        .unwrap();

        assert!(row.0.is_some());
        assert!(row.1.unwrap() > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_authed_user_extractor_rejects_missing_and_bad_tokens() {
        let state = setup_test_state().await;

        // No cookie at all
        let mut parts = request_parts(&state, None);
        match AuthedUser::from_request_parts(&mut parts, &()).await {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "No access token provided"),
            other => panic!("Expected Unauthorized, got {:?}", other.map(|_| ())),
        }

        // Garbage token
        let mut parts = request_parts(
            &state,
            Some(format!("{}=not-a-jwt", ACCESS_TOKEN_COOKIE)),
        );
        match AuthedUser::from_request_parts(&mut parts, &()).await {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "Invalid access token"),
            other => panic!("Expected Unauthorized, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_authed_user_extractor_rejects_expired_token() {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let state = setup_test_state().await;

        // Sign an access token whose exp is well past the validation leeway
        let claims = crate::services::tokens::Claims {
            sub: "U_GHOST1".to_string(),
            exp: (Utc::now() - chrono::Duration::hours(2)).timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test_access_secret".as_bytes()),
        )
        .unwrap();

        let mut parts = request_parts(
            &state,
            Some(format!("{}={}", ACCESS_TOKEN_COOKIE, token)),
        );
        match AuthedUser::from_request_parts(&mut parts, &()).await {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "Access token expired"),
            other => panic!("Expected Unauthorized, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_authed_user_extractor_rejects_deleted_user() {
        let state = setup_test_state().await;
        let (user, jar) = signup_user(&state, "deleted@x.com").await;
        let access = cookie_value(&jar, ACCESS_TOKEN_COOKIE);

        let app_state = state.read().await.clone();
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&user.id)
            .execute(&app_state.db)
            .await
            .unwrap();

        let mut parts = request_parts(
            &state,
            Some(format!("{}={}", ACCESS_TOKEN_COOKIE, access)),
        );
        match AuthedUser::from_request_parts(&mut parts, &()).await {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "User not found"),
            other => panic!("Expected Unauthorized, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_admin_extractor_forbids_customers() {
        let state = setup_test_state().await;
        let (_, jar) = signup_user(&state, "customer@x.com").await;
        let access = cookie_value(&jar, ACCESS_TOKEN_COOKIE);

        let mut parts = request_parts(
            &state,
            Some(format!("{}={}", ACCESS_TOKEN_COOKIE, access)),
        );
        match AdminUser::from_request_parts(&mut parts, &()).await {
            Err(ApiError::Forbidden(msg)) => assert_eq!(msg, "Access denied - Admin only"),
            other => panic!("Expected Forbidden, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_admin_extractor_allows_admins() {
        let state = setup_test_state().await;
        let (user, jar) = signup_user(&state, "admin@x.com").await;
        let access = cookie_value(&jar, ACCESS_TOKEN_COOKIE);

        let app_state = state.read().await.clone();
        sqlx::query("UPDATE users SET role = 'admin' WHERE id = ?")
            .bind(&user.id)
            .execute(&app_state.db)
            .await
            .unwrap();

        let mut parts = request_parts(
            &state,
            Some(format!("{}={}", ACCESS_TOKEN_COOKIE, access)),
        );
        let admin = AdminUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(admin.id, user.id);
        assert_eq!(admin.email, "admin@x.com");
    }
}
