// src/services/token_store.rs
//
// Server-side refresh token store. The authoritative copy of every refresh
// token lives here under `refresh_token:{userId}`; the cookie copy is only
// honored when it matches byte for byte. One entry per user id, so a new
// login overwrites the previous session's token and invalidates it.

use std::time::Duration;

use moka::future::Cache;

use super::tokens::REFRESH_TOKEN_TTL_DAYS;

const KEY_PREFIX: &str = "refresh_token";
const MAX_TRACKED_SESSIONS: u64 = 10_000;

/// TTL-bounded key-value store for refresh tokens
pub struct RefreshTokenStore {
    cache: Cache<String, String>,
}

impl RefreshTokenStore {
    pub fn new() -> Self {
        // Entries expire together with the token they hold
        let ttl = Duration::from_secs((REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60) as u64);
        let cache = Cache::builder()
            .max_capacity(MAX_TRACKED_SESSIONS)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    fn key(user_id: &str) -> String {
        format!("{}:{}", KEY_PREFIX, user_id)
    }

    /// Persist the refresh token for a user, overwriting any prior entry
    pub async fn store(&self, user_id: &str, token: &str) {
        self.cache.insert(Self::key(user_id), token.to_string()).await;
    }

    /// Fetch the stored token for a user, if any
    pub async fn get(&self, user_id: &str) -> Option<String> {
        self.cache.get(&Self::key(user_id)).await
    }

    /// Delete the entry for a user; called on logout
    pub async fn revoke(&self, user_id: &str) {
        self.cache.invalidate(&Self::key(user_id)).await;
    }
}

impl Default for RefreshTokenStore {
    fn default() -> Self {
        Self::new()
    }
}
