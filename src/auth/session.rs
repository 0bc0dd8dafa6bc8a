//! Session tokens and the session cookie.

use axum_extra::extract::cookie::Cookie;
use rand::RngCore;

pub const SESSION_COOKIE_NAME: &str = "sessCookie";

/// Random bytes per token (hex encoded to twice as many chars)
const TOKEN_BYTES: usize = 32;

/// Generate a new opaque session token
pub fn generate_session_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  rand::rng().fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// Site-wide session cookie without Max-Age, so it lives as long as the browser session
pub fn session_cookie(token: String) -> Cookie<'static> {
  Cookie::build((SESSION_COOKIE_NAME, token))
    .path("/")
    .http_only(true)
    .secure(false) // Set to true in production with HTTPS
    .build()
}

/// Replacement cookie that makes the browser drop the session immediately
pub fn cleared_session_cookie() -> Cookie<'static> {
  Cookie::build((SESSION_COOKIE_NAME, ""))
    .path("/")
    .max_age(time::Duration::seconds(-1))
    .build()
}
