//! Session cookie construction
//!
//! Both session cookies are http-only and SameSite=Strict; the `secure`
//! flag is set only in production so local development over plain HTTP
//! still works. Max-age always matches the embedded token's validity.

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::services::tokens::{ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_TTL_DAYS};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Cookie carrying the short-lived access token
pub fn access_token_cookie(token: String, secure: bool) -> Cookie<'static> {
    build_session_cookie(
        ACCESS_TOKEN_COOKIE,
        token,
        time::Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
        secure,
    )
}

/// Cookie carrying the long-lived refresh token
pub fn refresh_token_cookie(token: String, secure: bool) -> Cookie<'static> {
    build_session_cookie(
        REFRESH_TOKEN_COOKIE,
        token,
        time::Duration::days(REFRESH_TOKEN_TTL_DAYS),
        secure,
    )
}

/// Name-and-path cookie used to clear a session cookie on logout
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::from(name);
    cookie.set_path("/");
    cookie
}

fn build_session_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie.set_path("/");
    cookie.set_max_age(max_age);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_cookie_flags() {
        let cookie = access_token_cookie("jwt-value".to_string(), false);

        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.value(), "jwt-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(15)));
    }

    #[test]
    fn test_refresh_cookie_lives_seven_days() {
        let cookie = refresh_token_cookie("jwt-value".to_string(), true);

        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }

    #[test]
    fn test_removal_cookie_matches_path() {
        let cookie = removal_cookie(ACCESS_TOKEN_COOKIE);
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.path(), Some("/"));
    }
}
