//! Session cookie construction and parsing.
//!
//! The session token travels in an HTTP-only cookie named `token`, valid for
//! the whole site, SameSite=Lax, and marked Secure in production.

pub const SESSION_COOKIE_NAME: &str = "token";
pub const SESSION_COOKIE_PATH: &str = "/";

pub fn build_session_cookie(token: &str, max_age_seconds: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE_NAME, token, SESSION_COOKIE_PATH, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expires the session cookie on the client. Logout clears only this copy;
/// the token itself stays valid until its embedded expiry.
pub fn build_clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{}=; Path={}; Max-Age=0; HttpOnly; SameSite=Lax",
        SESSION_COOKIE_NAME, SESSION_COOKIE_PATH
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn extract_cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}
