//! Session module
//!
//! Filesystem-backed sessions keyed by an opaque cookie. The application
//! defines no session fields of its own; the store only tracks liveness so
//! the cookie survives across requests.

mod store;

pub use store::SessionStore;

/// Outcome of resolving the session for one request
pub struct SessionHandle {
    /// Session id, existing or freshly minted
    pub id: String,
    /// Set-Cookie header value to attach, when a new session was created
    pub set_cookie: Option<String>,
}

/// Extract the session id from a Cookie header value
///
/// Cookie headers are `name=value; name2=value2` lists; the first pair
/// matching `cookie_name` wins.
pub fn parse_cookie(header: Option<&str>, cookie_name: &str) -> Option<String> {
    let header = header?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == cookie_name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Build the Set-Cookie header value for a new session
pub fn build_cookie(cookie_name: &str, id: &str, lifetime_days: u64) -> String {
    let max_age = lifetime_days * 24 * 60 * 60;
    format!("{cookie_name}={id}; Path=/; Max-Age={max_age}; HttpOnly")
}
