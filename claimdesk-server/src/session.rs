//! Session cookie handling
//!
//! The cookie holds the backend access token as-is; the backend decides
//! whether it is still valid on every request.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

use claimdesk_core::AccessToken;

pub const COOKIE_NAME: &str = "claimdesk_session";

/// Session token from the request's `Cookie` headers, if any.
pub fn token_from_headers(headers: &HeaderMap) -> Option<AccessToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| AccessToken::new(value))
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &AccessToken, max_age: Option<u64>, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        COOKIE_NAME,
        token.as_str()
    );
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session.
pub fn clear_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", COOKIE_NAME);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
