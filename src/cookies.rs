use axum::http::header::SET_COOKIE;
use axum::response::AppendHeaders;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::AppState;

pub const TOKEN_COOKIE: &str = "token";

const EXPIRED_TOKEN: &str = "token=expired; Path=/; Expires=Thu, 1 Jan 1970 00:00:00 GMT";
pub const APPEND_EXPIRED_TOKEN: AppendHeaders<Option<(axum::http::header::HeaderName, &str)>> =
    AppendHeaders(Some((SET_COOKIE, EXPIRED_TOKEN)));
pub const APPEND_NO_TOKEN: AppendHeaders<Option<(axum::http::header::HeaderName, &str)>> =
    AppendHeaders(None);

/// Signed-in site administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin;

/// Returns the cookie that signs in an administrator.
pub fn admin_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

/// Checks the admin token cookie. A stale cookie is cleared.
pub fn process_cookies(
    state: &AppState,
    jar: &CookieJar,
) -> (
    Option<Admin>,
    AppendHeaders<Option<(axum::http::HeaderName, &'static str)>>,
) {
    match jar.get(TOKEN_COOKIE).map(|cookie| cookie.value()) {
        None => (None, APPEND_NO_TOKEN),
        Some(token) if state.config.accepts_admin_token(token) => (Some(Admin), APPEND_NO_TOKEN),
        Some(_) => (None, APPEND_EXPIRED_TOKEN),
    }
}
