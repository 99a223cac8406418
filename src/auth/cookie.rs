//! Refresh-token cookie parsing and formatting.

use axum::http::header;

/// Cookie name for the refresh token (long-lived, 2 weeks).
pub const REFRESH_COOKIE_NAME: &str = "refreshtoken";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Format the Set-Cookie value carrying a refresh token.
/// SameSite=Lax so the cookie rides along on top-level navigations while
/// staying out of cross-site subrequests.
pub fn refresh_cookie(token: &str, max_age: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        REFRESH_COOKIE_NAME, token, max_age, secure
    )
}

/// Format the Set-Cookie value that clears the refresh token.
pub fn clear_refresh_cookie(secure: bool) -> String {
    refresh_cookie("", 0, secure)
}
