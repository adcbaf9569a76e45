// src/services/tokens.rs
//
// Session token service. Mints the access/refresh JWT pair and verifies
// presented tokens. The two token kinds are signed with distinct secrets so
// one can never be replayed as the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token lifetime. Kept short; clients re-issue via the refresh flow.
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

/// Refresh token lifetime. Matches the TTL of the server-side store entry.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// JWT claims carried by both token kinds
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Signed access/refresh pair for one user
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints and verifies session JWTs (HS256)
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
}

impl TokenService {
    pub fn new(access_secret: String, refresh_secret: String) -> Self {
        Self {
            access_secret,
            refresh_secret,
        }
    }

    /// Mint both tokens for a user id
    pub fn issue_pair(&self, user_id: &str) -> Result<TokenPair, jsonwebtoken::errors::Error> {
        Ok(TokenPair {
            access_token: self.sign_access_token(user_id)?,
            refresh_token: self.sign_refresh_token(user_id)?,
        })
    }

    /// Mint a short-lived access token
    pub fn sign_access_token(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (Utc::now() + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.access_secret.as_bytes()),
        )
    }

    /// Mint a long-lived refresh token
    pub fn sign_refresh_token(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS)).timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.refresh_secret.as_bytes()),
        )
    }

    /// Verify an access token's signature and expiry, returning its claims
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.access_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(token_data.claims)
    }

    /// Verify a refresh token's signature and expiry, returning its claims
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test_access_secret".to_string(),
            "test_refresh_secret".to_string(),
        )
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = service();
        let token = tokens.sign_access_token("U_TEST01").unwrap();
        let claims = tokens.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "U_TEST01");
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let tokens = service();
        let token = tokens.sign_refresh_token("U_TEST02").unwrap();
        let claims = tokens.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, "U_TEST02");
    }

    #[test]
    fn test_tokens_not_interchangeable() {
        // An access token must not verify as a refresh token and vice versa
        let tokens = service();
        let access = tokens.sign_access_token("U_TEST03").unwrap();
        let refresh = tokens.sign_refresh_token("U_TEST03").unwrap();

        assert!(tokens.verify_refresh_token(&access).is_err());
        assert!(tokens.verify_access_token(&refresh).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let tokens = service();
        let other = TokenService::new("other_a".to_string(), "other_r".to_string());

        let token = tokens.sign_access_token("U_TEST04").unwrap();
        assert!(other.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        // Encode with an exp well past the default validation leeway
        let exp = (Utc::now() - Duration::hours(2)).timestamp() as usize;
        let claims = Claims {
            sub: "U_TEST05".to_string(),
            exp,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("test_access_secret".as_bytes()),
        )
        .unwrap();

        assert!(tokens.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_issue_pair_covers_both_kinds() {
        let tokens = service();
        let pair = tokens.issue_pair("U_TEST06").unwrap();
        assert_eq!(
            tokens.verify_access_token(&pair.access_token).unwrap().sub,
            "U_TEST06"
        );
        assert_eq!(
            tokens
                .verify_refresh_token(&pair.refresh_token)
                .unwrap()
                .sub,
            "U_TEST06"
        );
    }
}
