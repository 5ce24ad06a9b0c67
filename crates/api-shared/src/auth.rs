//! Token authentication shared by the REST client and the stub server.
//!
//! Requests carry `Authorization: Token <key>`. The expected key is resolved once at startup and
//! passed in; nothing here reads the environment.

/// Header carrying the API token.
pub const AUTH_HEADER: &str = "authorization";

/// Scheme prefix of the header value.
pub const TOKEN_SCHEME: &str = "Token";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing API token")]
    Missing,
    #[error("malformed authorization header")]
    Malformed,
    #[error("invalid API token")]
    Invalid,
}

/// Render the header value for `token`.
pub fn header_value(token: &str) -> String {
    format!("{TOKEN_SCHEME} {token}")
}

/// Validates an `Authorization` header value against the expected token.
///
/// Returns `Ok(())` if the key is valid, or the reason it was rejected.
pub fn validate_api_token(header: Option<&str>, expected: &str) -> Result<(), AuthError> {
    let header = header.ok_or(AuthError::Missing)?;
    let provided = header
        .strip_prefix(TOKEN_SCHEME)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
        .ok_or(AuthError::Malformed)?;

    if provided == expected {
        Ok(())
    } else {
        Err(AuthError::Invalid)
    }
}
