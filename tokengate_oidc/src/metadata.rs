//! Identity provider metadata
//!
//! Metadata is either read from the provider's OpenID Connect discovery
//! document or assembled by hand from paths relative to the provider URI.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokengate::jwt::{Issuer, IssuerRef};
use url::Url;

use crate::{http, uri};

/// Where the discovery document lives, relative to the provider URI
pub const DEFAULT_DISCOVERY_PATH: &str = ".well-known/openid-configuration";

/// Subject identifier type assumed when a provider does not list any
pub const PUBLIC_SUBJECT_TYPE: &str = "public";

/// Endpoints and properties of an OpenID Connect identity provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct ProviderMetadata {
    issuer: Issuer,
    authorization_endpoint: Url,
    token_endpoint: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    introspection_endpoint: Option<Url>,
    jwks_uri: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    userinfo_endpoint: Option<Url>,
    #[serde(default = "default_subject_types")]
    subject_types_supported: Vec<String>,
}

fn default_subject_types() -> Vec<String> {
    vec![PUBLIC_SUBJECT_TYPE.to_owned()]
}

/// The provider URI as written, without the `/` that parsing adds to a bare host
fn issuer_of(base: &Url) -> Issuer {
    let uri = base.as_str();
    let bare_host = base.path() == "/" && base.query().is_none() && base.fragment().is_none();

    match uri.strip_suffix('/') {
        Some(trimmed) if bare_host => Issuer::new(trimmed.to_owned()),
        _ => Issuer::new(uri.to_owned()),
    }
}

impl ProviderMetadata {
    /// Retrieves the provider's discovery document
    ///
    /// # Errors
    ///
    /// The document could not be fetched, or it lacks one of `issuer`,
    /// `authorization_endpoint`, `token_endpoint`, or `jwks_uri`.
    #[tracing::instrument(skip(client, base), fields(base = %base))]
    pub async fn from_discovery(
        client: &Client,
        base: &Url,
        discovery_path: &str,
    ) -> Result<Self, DiscoveryError> {
        let url = uri::join(base, discovery_path);

        let metadata: Self = http::get_json(client, &url).await?;

        tracing::info!(
            issuer = %metadata.issuer,
            jwks_uri = %metadata.jwks_uri,
            introspection = metadata.introspection_endpoint.is_some(),
            "resolved provider metadata from discovery document"
        );

        Ok(metadata)
    }

    /// Assembles metadata without contacting the provider
    ///
    /// Each path is joined onto `base`, which also serves as the issuer. A
    /// bare-host `base` yields an issuer without a trailing `/`; use
    /// [`with_issuer`](Self::with_issuer) when the provider's `iss` differs.
    pub fn manual(
        base: &Url,
        authorization_path: &str,
        token_path: &str,
        jwk_set_path: &str,
    ) -> Self {
        Self {
            issuer: issuer_of(base),
            authorization_endpoint: uri::join(base, authorization_path),
            token_endpoint: uri::join(base, token_path),
            introspection_endpoint: None,
            jwks_uri: uri::join(base, jwk_set_path),
            userinfo_endpoint: None,
            subject_types_supported: default_subject_types(),
        }
    }

    /// Sets the introspection endpoint to `path` under `base`
    pub fn with_introspection_endpoint(self, base: &Url, path: &str) -> Self {
        Self {
            introspection_endpoint: Some(uri::join(base, path)),
            ..self
        }
    }

    /// Sets the userinfo endpoint to `path` under `base`
    pub fn with_userinfo_endpoint(self, base: &Url, path: &str) -> Self {
        Self {
            userinfo_endpoint: Some(uri::join(base, path)),
            ..self
        }
    }

    /// Overrides the expected token issuer
    pub fn with_issuer(self, issuer: Issuer) -> Self {
        Self { issuer, ..self }
    }

    /// The issuer that tokens from this provider carry in `iss`
    #[must_use]
    pub fn issuer(&self) -> &IssuerRef {
        &self.issuer
    }

    /// The authorization endpoint
    #[must_use]
    pub fn authorization_endpoint(&self) -> &Url {
        &self.authorization_endpoint
    }

    /// The token endpoint
    #[must_use]
    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    /// The token introspection endpoint, if the provider has one
    #[must_use]
    pub fn introspection_endpoint(&self) -> Option<&Url> {
        self.introspection_endpoint.as_ref()
    }

    /// The JWK Set endpoint
    #[must_use]
    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }

    /// The userinfo endpoint, if known
    #[must_use]
    pub fn userinfo_endpoint(&self) -> Option<&Url> {
        self.userinfo_endpoint.as_ref()
    }

    /// The subject identifier types the provider supports
    #[must_use]
    pub fn subject_types_supported(&self) -> &[String] {
        &self.subject_types_supported
    }
}

/// The discovery document could not be obtained
#[derive(Debug, Error)]
#[error("unable to discover provider metadata")]
pub struct DiscoveryError {
    #[from]
    source: http::FetchError,
}

impl DiscoveryError {
    /// Whether the provider could not be reached at all
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        self.source.is_connectivity()
    }

    /// The underlying fetch failure
    #[must_use]
    pub fn fetch_error(&self) -> &http::FetchError {
        &self.source
    }
}
