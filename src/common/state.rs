// Application state shared across all modules

use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

use crate::services::{AwsService, MediaService, RefreshTokenStore, TokenService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub media_dir: PathBuf,
    pub client_url: String,
    pub environment: String,
    pub tokens: TokenService,
    pub refresh_tokens: Arc<RefreshTokenStore>,
    pub aws_service: Arc<AwsService>,
    pub media_service: Arc<MediaService>,
}

impl AppState {
    /// True when running with production hardening (secure cookies).
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
