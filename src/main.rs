// src/main.rs
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod admin;
mod auth;
mod common;
mod logging_middleware;
mod orders;
mod products;
mod services;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::AppState;
use services::{AwsService, MediaService, RefreshTokenStore, TokenService};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://store_api.db".to_string());
    let media_dir =
        PathBuf::from(env::var("MEDIA_DIR").unwrap_or_else(|_| "./uploads/media".to_string()));
    let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
        .unwrap_or_else(|_| "replace_with_strong_access_secret".to_string());
    let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
        .unwrap_or_else(|_| "replace_with_strong_refresh_secret".to_string());
    let client_url =
        env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    // ========================================================================
    // ERROR TRACKING AND LOGGING
    // ========================================================================

    // The guard must live for the whole process so events flush on exit
    let _sentry_guard = env::var("SENTRY_DSN")
        .ok()
        .filter(|dsn| !dsn.is_empty())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    environment: Some(environment.clone().into()),
                    ..Default::default()
                },
            ))
        });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer())
        .init();

    if _sentry_guard.is_some() {
        info!("Sentry error tracking enabled");
    }

    // ========================================================================
    // DIRECTORY SETUP
    // ========================================================================

    tokio::fs::create_dir_all(media_dir.join(services::media::PREFIX_AVATARS)).await?;
    tokio::fs::create_dir_all(media_dir.join(services::media::PREFIX_PRODUCTS)).await?;

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    // Run database migrations
    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let tokens = TokenService::new(access_token_secret, refresh_token_secret);
    info!("TokenService initialized");

    let refresh_tokens = Arc::new(RefreshTokenStore::new());
    info!("RefreshTokenStore initialized");

    let aws_service = Arc::new(AwsService::from_env());
    if aws_service.is_configured() {
        info!("AwsService initialized with credentials");
    } else {
        info!("AwsService not configured; media stays local and outbound email is disabled");
    }

    let media_service = Arc::new(MediaService::new(aws_service.clone(), media_dir.clone()));
    info!("MediaService initialized");

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState {
        db: pool,
        media_dir,
        client_url,
        environment,
        tokens,
        refresh_tokens,
        aws_service,
        media_service,
    };

    let shared = Arc::new(RwLock::new(app_state));

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES (Signup, Login, Sessions, Password Reset)
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // PRODUCT CATALOG ROUTES (Public and Admin)
        // ====================================================================
        .merge(products::products_routes())
        // ====================================================================
        // ORDER ROUTES (Checkout Records and Fulfilment)
        // ====================================================================
        .merge(orders::orders_routes())
        // ====================================================================
        // ADMIN ROUTES (User Administration)
        // ====================================================================
        .merge(admin::admin_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        // Add request/response body logging in debug mode
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared.clone()))
        .layer({
            // Get CORS origins from environment variable
            let cors_origins = std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

            let origins: Vec<axum::http::HeaderValue> = cors_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();

            // Cookies carry the session, so credentialed requests must be allowed
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::PATCH,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ])
                .allow_credentials(true)
        })
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(5000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
