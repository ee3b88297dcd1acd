//! Relying-party configuration
//!
//! A [`RelyingPartyConfig`] says where the identity provider lives, how its
//! metadata and signing key are obtained, and which credentials the relying
//! party introspects with. [`RelyingParty::connect`] resolves all of it once
//! up front.
//!
//! ```
//! use tokengate_oidc::config::{KeySource, MetadataMode, RelyingPartyConfig};
//!
//! let config: RelyingPartyConfig = serde_json::from_str(r#"{
//!     "provider_uri": "https://idp.example/realms/demo",
//!     "client_id": "relying-party",
//!     "client_secret": "hunter2",
//!     "metadata": {
//!         "mode": "manual",
//!         "authorization_path": "protocol/openid-connect/auth",
//!         "token_path": "protocol/openid-connect/token",
//!         "jwk_set_path": "protocol/openid-connect/certs"
//!     },
//!     "http": { "timeout_ms": 5000 }
//! }"#).unwrap();
//!
//! assert!(matches!(config.metadata(), MetadataMode::Manual { .. }));
//! assert_eq!(config.key_source(), &KeySource::JwkSet);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokengate::jwt::Issuer;
use url::Url;

use crate::{
    credentials::{ClientId, ClientSecret},
    http::{HttpClientError, HttpConfig},
    keys::KeyResolutionError,
    metadata::{DiscoveryError, DEFAULT_DISCOVERY_PATH},
    ClaimMap, ClientCredentials, ProviderMetadata, SigningKey, TokenValidator, ValidationError,
};

/// How provider metadata is obtained
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case", deny_unknown_fields)]
pub enum MetadataMode {
    /// Read the provider's discovery document
    Discovery {
        /// Location of the document relative to the provider URI
        #[serde(default = "default_discovery_path")]
        discovery_path: String,
    },

    /// Join fixed paths onto the provider URI
    Manual {
        /// Path of the authorization endpoint
        authorization_path: String,
        /// Path of the token endpoint
        token_path: String,
        /// Path of the JWK Set endpoint
        jwk_set_path: String,
        /// Path of the introspection endpoint
        #[serde(default)]
        introspection_path: Option<String>,
        /// Expected `iss` of tokens, when it differs from the provider URI
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issuer: Option<Issuer>,
    },
}

fn default_discovery_path() -> String {
    DEFAULT_DISCOVERY_PATH.to_owned()
}

impl Default for MetadataMode {
    fn default() -> Self {
        Self::Discovery {
            discovery_path: default_discovery_path(),
        }
    }
}

/// Where the key for local validation comes from
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// The last signing key in the provider's JWK Set
    #[default]
    JwkSet,

    /// A base64-encoded X.509 public key, as shown by the provider
    KeyString(String),

    /// No key; only introspection is available
    None,
}

/// Everything a relying party needs to validate tokens from one provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[must_use]
pub struct RelyingPartyConfig {
    provider_uri: Url,
    client_id: ClientId,
    client_secret: ClientSecret,
    #[serde(default)]
    metadata: MetadataMode,
    #[serde(default)]
    key_source: KeySource,
    #[serde(default)]
    http: HttpConfig,
}

impl RelyingPartyConfig {
    /// Discovers metadata and the JWK Set for the provider at `provider_uri`
    pub fn new(provider_uri: Url, client_id: ClientId, client_secret: ClientSecret) -> Self {
        Self {
            provider_uri,
            client_id,
            client_secret,
            metadata: MetadataMode::default(),
            key_source: KeySource::default(),
            http: HttpConfig::default(),
        }
    }

    /// Sets how provider metadata is obtained
    pub fn with_metadata(self, metadata: MetadataMode) -> Self {
        Self { metadata, ..self }
    }

    /// Sets where the signing key comes from
    pub fn with_key_source(self, key_source: KeySource) -> Self {
        Self { key_source, ..self }
    }

    /// Sets the transport settings
    pub fn with_http(self, http: HttpConfig) -> Self {
        Self { http, ..self }
    }

    /// The provider URI
    #[must_use]
    pub fn provider_uri(&self) -> &Url {
        &self.provider_uri
    }

    /// How provider metadata is obtained
    #[must_use]
    pub fn metadata(&self) -> &MetadataMode {
        &self.metadata
    }

    /// Where the signing key comes from
    #[must_use]
    pub fn key_source(&self) -> &KeySource {
        &self.key_source
    }

    /// The transport settings
    #[must_use]
    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    /// The credentials presented to the introspection endpoint
    #[must_use]
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials::new(self.client_id.clone(), self.client_secret.clone())
    }
}

/// Which strategy [`RelyingParty::validate`] uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Verify the token offline with the resolved signing key
    Local,

    /// Ask the provider's introspection endpoint
    Introspection,
}

/// A relying party bound to one identity provider
#[derive(Clone, Debug)]
pub struct RelyingParty {
    metadata: ProviderMetadata,
    signing_key: Option<SigningKey>,
    credentials: ClientCredentials,
    validator: TokenValidator,
}

impl RelyingParty {
    /// Resolves provider metadata and the signing key described by `config`
    ///
    /// # Errors
    ///
    /// The HTTP client could not be built, or the metadata or key could not
    /// be resolved.
    #[tracing::instrument(skip_all, fields(provider = %config.provider_uri))]
    pub async fn connect(config: RelyingPartyConfig) -> Result<Self, ConnectError> {
        let client = config.http.build_client()?;
        let base = &config.provider_uri;

        let metadata = match &config.metadata {
            MetadataMode::Discovery { discovery_path } => {
                ProviderMetadata::from_discovery(&client, base, discovery_path).await?
            }
            MetadataMode::Manual {
                authorization_path,
                token_path,
                jwk_set_path,
                introspection_path,
                issuer,
            } => {
                let mut metadata =
                    ProviderMetadata::manual(base, authorization_path, token_path, jwk_set_path);
                if let Some(path) = introspection_path {
                    metadata = metadata.with_introspection_endpoint(base, path);
                }
                if let Some(issuer) = issuer {
                    metadata = metadata.with_issuer(issuer.clone());
                }
                metadata
            }
        };

        let signing_key = match &config.key_source {
            KeySource::JwkSet => Some(SigningKey::from_jwk_set(&client, &metadata).await?),
            KeySource::KeyString(encoded) => Some(SigningKey::from_key_string(encoded)?),
            KeySource::None => None,
        };

        tracing::info!(
            issuer = %metadata.issuer(),
            local = signing_key.is_some(),
            introspection = metadata.introspection_endpoint().is_some(),
            "relying party ready"
        );

        Ok(Self {
            credentials: config.credentials(),
            metadata,
            signing_key,
            validator: TokenValidator::new(client),
        })
    }

    /// Assembles a relying party from already resolved parts
    pub fn from_parts(
        metadata: ProviderMetadata,
        signing_key: Option<SigningKey>,
        credentials: ClientCredentials,
        client: reqwest::Client,
    ) -> Self {
        Self {
            metadata,
            signing_key,
            credentials,
            validator: TokenValidator::new(client),
        }
    }

    /// Validates the bearer token in `authorization` using `mode`
    ///
    /// # Errors
    ///
    /// See [`TokenValidator`]. Local validation without a signing key is a
    /// validation failure.
    pub async fn validate(
        &self,
        authorization: Option<&str>,
        mode: ValidationMode,
    ) -> Result<ClaimMap, ValidationError> {
        match mode {
            ValidationMode::Local => {
                let key = self
                    .signing_key
                    .as_ref()
                    .ok_or_else(|| ValidationError::Validation {
                        description: "no signing key is configured for local validation".into(),
                    })?;
                self.validator
                    .validate_locally(authorization, self.metadata.issuer(), key)
            }
            ValidationMode::Introspection => {
                self.validator
                    .validate_by_introspection(authorization, &self.metadata, &self.credentials)
                    .await
            }
        }
    }

    /// The provider's metadata
    #[must_use]
    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    /// The key used for local validation, if one was resolved
    #[must_use]
    pub fn signing_key(&self) -> Option<&SigningKey> {
        self.signing_key.as_ref()
    }

    /// The credentials presented to the introspection endpoint
    #[must_use]
    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }
}

/// A relying party could not be set up
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The HTTP client could not be built
    #[error(transparent)]
    HttpClient(#[from] HttpClientError),

    /// Provider metadata could not be discovered
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The signing key could not be resolved
    #[error(transparent)]
    KeyResolution(#[from] KeyResolutionError),
}

impl ConnectError {
    /// Whether the provider could not be reached at all
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::HttpClient(_) => false,
            Self::Discovery(e) => e.is_connectivity(),
            Self::KeyResolution(e) => e.is_connectivity(),
        }
    }
}
