//! Remote validation through the provider's token introspection endpoint

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokengate::JwtRef;
use url::Url;

use crate::{ClaimMap, ClientCredentials, ProviderMetadata};

const ACTIVE_CLAIM: &str = "active";

/// Asks the identity provider whether an access token is active
///
/// Each call makes a single attempt. The provider's answer is trusted as-is.
#[derive(Clone, Debug, Default)]
pub struct IntrospectionValidator {
    client: Client,
}

impl IntrospectionValidator {
    /// Uses `client` for every introspection request
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Introspects `token` and returns the provider's claims about it
    ///
    /// The returned map always holds `"active": true`.
    ///
    /// # Errors
    ///
    /// The provider could not be reached, has no introspection endpoint,
    /// rejected the request, reported the token inactive, or answered with
    /// something that is not an introspection response.
    #[tracing::instrument(
        skip_all,
        fields(endpoint = ?metadata.introspection_endpoint().map(Url::as_str))
    )]
    pub async fn introspect(
        &self,
        token: &JwtRef,
        metadata: &ProviderMetadata,
        credentials: &ClientCredentials,
    ) -> Result<ClaimMap, IntrospectionError> {
        let endpoint = metadata
            .introspection_endpoint()
            .ok_or(IntrospectionError::MissingEndpoint)?;

        tracing::debug!("sending introspection request to identity provider");

        let connectivity = |source| IntrospectionError::Connectivity {
            provider: endpoint.clone(),
            source,
        };

        let response = self
            .client
            .post(endpoint.clone())
            .basic_auth(
                credentials.client_id().as_str(),
                Some(credentials.client_secret().as_str()),
            )
            .form(&[
                ("token", token.as_str()),
                ("token_type_hint", "access_token"),
            ])
            .send()
            .await
            .map_err(connectivity)?;

        let status = response.status();
        let body = response.bytes().await.map_err(connectivity)?;

        // The body is read as JSON whatever the content type says.
        let outcome: IntrospectionOutcome = serde_json::from_slice(&body).map_err(|source| {
            tracing::warn!(%status, "unreadable introspection response from identity provider");
            IntrospectionError::MalformedResponse { source }
        })?;

        match outcome {
            IntrospectionOutcome::Error {
                error,
                error_description,
            } => {
                tracing::warn!(%status, %error, "identity provider rejected introspection request");
                Err(IntrospectionError::Rejected {
                    error,
                    description: error_description,
                })
            }
            IntrospectionOutcome::Success { active: false, .. } => {
                Err(IntrospectionError::Inactive)
            }
            IntrospectionOutcome::Success {
                active: true,
                mut claims,
            } => {
                claims.insert(ACTIVE_CLAIM.to_owned(), serde_json::Value::Bool(true));
                Ok(claims)
            }
        }
    }
}

/// A parsed introspection response
///
/// Providers answer either with an OAuth2 error object or with a claim set
/// carrying the mandatory `active` flag. A boolean `active` member makes the
/// response a claim set even when it also holds an `error` member.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IntrospectionOutcome {
    /// The provider introspected the token
    Success {
        /// Whether the token is currently active
        active: bool,
        /// Every other member of the response
        #[serde(flatten)]
        claims: ClaimMap,
    },

    /// The provider refused to introspect the token
    Error {
        /// The OAuth2 error code
        error: String,
        /// A human-readable explanation
        #[serde(default)]
        error_description: Option<String>,
    },
}

/// Introspection did not confirm the token
#[derive(Debug, Error)]
pub enum IntrospectionError {
    /// The provider could not be reached or the response was cut short
    #[error("could not connect to the identity provider {provider}")]
    Connectivity {
        /// The introspection endpoint
        provider: Url,
        /// The transport failure
        #[source]
        source: reqwest::Error,
    },

    /// The provider metadata has no introspection endpoint
    #[error("identity provider has no introspection endpoint")]
    MissingEndpoint,

    /// The provider answered with an OAuth2 error object
    #[error("{}", rejection_message(.error, .description))]
    Rejected {
        /// The OAuth2 error code
        error: String,
        /// The provider's explanation, if any
        description: Option<String>,
    },

    /// The provider reported the token as inactive
    #[error("token is not active")]
    Inactive,

    /// The response is not an introspection response
    #[error("identity provider returned a malformed introspection response")]
    MalformedResponse {
        /// The parse failure
        #[source]
        source: serde_json::Error,
    },
}

fn rejection_message<'a>(error: &'a str, description: &'a Option<String>) -> &'a str {
    description.as_deref().unwrap_or(error)
}

impl IntrospectionError {
    /// Whether the provider could not be reached at all
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}
