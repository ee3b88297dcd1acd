//! Extraction of access tokens from `Authorization` headers

use thiserror::Error;
use tokengate::Jwt;

const BEARER_PREFIX: &str = "Bearer ";

/// The `Authorization` header does not carry a bearer token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MalformedAuthorization {
    /// No header, or an empty one
    #[error("authorization header is missing")]
    Missing,

    /// The header does not use the `Bearer` scheme
    #[error("authorization header does not use the Bearer scheme")]
    UnsupportedScheme,

    /// Nothing follows the `Bearer` scheme
    #[error("authorization header carries an empty bearer token")]
    EmptyToken,
}

/// Pulls the raw access token out of an `Authorization` header value
///
/// The scheme is matched case-sensitively as `Bearer` followed by a single
/// space. Whitespace around the token itself is ignored.
///
/// ```
/// use tokengate_oidc::bearer::extract_access_token;
///
/// let token = extract_access_token(Some("Bearer abc.def.ghi")).unwrap();
/// assert_eq!(token.as_str(), "abc.def.ghi");
///
/// assert!(extract_access_token(Some("Basic dXNlcjpwYXNz")).is_err());
/// ```
///
/// # Errors
///
/// The header is absent or empty, does not start with `Bearer `, or has
/// nothing after the scheme.
pub fn extract_access_token(header: Option<&str>) -> Result<Jwt, MalformedAuthorization> {
    let header = match header {
        Some(h) if !h.trim().is_empty() => h,
        _ => return Err(MalformedAuthorization::Missing),
    };

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(MalformedAuthorization::UnsupportedScheme)?
        .trim();

    if token.is_empty() {
        return Err(MalformedAuthorization::EmptyToken);
    }

    Ok(Jwt::new(token.to_owned()))
}
