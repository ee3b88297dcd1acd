//! Endpoint construction relative to the provider base URI

use url::Url;

/// Appends `path` to the path of `base`
///
/// Exactly one `/` separates the two, however many slashes trail `base` or
/// lead `path`. The query and fragment of `base` are dropped.
///
/// ```
/// use url::Url;
///
/// let base = Url::parse("https://idp.example/realms/demo/?x=1").unwrap();
/// let joined = tokengate_oidc::uri::join(&base, "/protocol/openid-connect/token");
///
/// assert_eq!(
///     joined.as_str(),
///     "https://idp.example/realms/demo/protocol/openid-connect/token"
/// );
/// ```
#[must_use]
pub fn join(base: &Url, path: &str) -> Url {
    let mut joined = base.clone();
    joined.set_query(None);
    joined.set_fragment(None);

    let full_path = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    joined.set_path(&full_path);

    joined
}
