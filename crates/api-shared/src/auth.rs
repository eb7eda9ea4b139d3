//! Bearer-token extraction.
//!
//! Resolving a token to an actor is the core crate's job (`ActorDirectory`); this module only
//! pulls the token out of an `Authorization` header value.

/// Name of the header carrying credentials.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Extract the token from `Bearer <token>`. The scheme is matched case-insensitively.
///
/// Returns `None` for a missing header, another scheme, or an empty token.
pub fn bearer_token(header_value: Option<&str>) -> Option<&str> {
    let value = header_value?.trim();
    let (scheme, token) = value.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
