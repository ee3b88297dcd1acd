//! Relying-party client credentials

use std::fmt;

use aliri_braid::braid;
use serde::{Deserialize, Serialize};

/// An OAuth2 client identifier
#[braid(serde, ref_doc = "A borrowed reference to a [`ClientId`]")]
pub struct ClientId;

/// An OAuth2 client secret
///
/// The value is hidden from `Debug` and `Display` unless the alternate
/// flag is given. A width limits how many characters are revealed.
///
/// ```
/// use tokengate_oidc::credentials::ClientSecretRef;
///
/// let secret = ClientSecretRef::from_str("s3cr3t-value");
///
/// assert_eq!(format!("{:?}", secret), "***CLIENT SECRET***");
/// assert_eq!(format!("{:#}", secret), "s3cr3t-value");
/// ```
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ref_doc = "A borrowed reference to a [`ClientSecret`]"
)]
pub struct ClientSecret;

impl fmt::Debug for ClientSecretRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            limited_reveal(self.as_str(), &mut *f, 5)?;
            f.write_str("\"")
        } else {
            f.write_str("***CLIENT SECRET***")
        }
    }
}

impl fmt::Display for ClientSecretRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            limited_reveal(self.as_str(), &mut *f, usize::MAX)
        } else {
            f.write_str("***CLIENT SECRET***")
        }
    }
}

fn limited_reveal(unprotected: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if max_len <= 1 {
        f.write_str("…")
    } else if max_len > unprotected.len() {
        f.write_str(unprotected)
    } else {
        match unprotected.char_indices().nth(max_len - 2) {
            Some((idx, c)) if idx + c.len_utf8() < unprotected.len() => {
                f.write_str(&unprotected[0..idx + c.len_utf8()])?;
                f.write_str("…")
            }
            _ => f.write_str(unprotected),
        }
    }
}

/// The credentials a relying party presents to the provider's
/// introspection endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    client_id: ClientId,
    client_secret: ClientSecret,
}

impl ClientCredentials {
    /// Pairs a client ID with its secret
    #[must_use]
    pub fn new(client_id: ClientId, client_secret: ClientSecret) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    /// The client ID
    #[must_use]
    pub fn client_id(&self) -> &ClientIdRef {
        &self.client_id
    }

    /// The client secret
    #[must_use]
    pub fn client_secret(&self) -> &ClientSecretRef {
        &self.client_secret
    }
}
