//! HTTP transport shared by every call to the identity provider

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// The `User-Agent` sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("tokengate_oidc/", env!("CARGO_PKG_VERSION"));

/// Transport settings for requests to the identity provider
///
/// Requests are attempted once. Timeouts are the only bound on how long a
/// call may block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct HttpConfig {
    /// Total time allowed for a request, including reading the body
    pub timeout_ms: Option<u64>,

    /// Time allowed for establishing the connection
    pub connect_timeout_ms: Option<u64>,

    /// Overrides [`DEFAULT_USER_AGENT`]
    pub user_agent: Option<String>,
}

impl HttpConfig {
    /// Sets the total request timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout_ms: Some(duration_to_millis(timeout)),
            ..self
        }
    }

    /// Sets the connection timeout
    pub fn with_connect_timeout(self, timeout: Duration) -> Self {
        Self {
            connect_timeout_ms: Some(duration_to_millis(timeout)),
            ..self
        }
    }

    /// Sets the `User-Agent` header value
    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: Some(user_agent.into()),
            ..self
        }
    }

    /// Builds the client used for discovery, key retrieval, and introspection
    ///
    /// # Errors
    ///
    /// The TLS backend or the system resolver could not be initialized, or
    /// the user agent is not a valid header value.
    pub fn build_client(&self) -> Result<Client, HttpClientError> {
        let mut builder = Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        if let Some(ms) = self.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }

        Ok(builder.build()?)
    }
}

fn duration_to_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// The HTTP client could not be constructed
#[derive(Debug, Error)]
#[error("unable to build HTTP client")]
pub struct HttpClientError {
    #[from]
    source: reqwest::Error,
}

/// A document could not be retrieved from the identity provider
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider could not be reached or the response body was cut short
    #[error("could not connect to the identity provider {url}")]
    Connectivity {
        /// The requested URL
        url: Url,
        /// The transport failure
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status
    #[error("identity provider returned {status} for {url}")]
    Status {
        /// The requested URL
        url: Url,
        /// The returned status
        status: StatusCode,
    },

    /// The body was not the expected JSON document
    #[error("identity provider returned a malformed document from {url}")]
    Malformed {
        /// The requested URL
        url: Url,
        /// The parse failure
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Whether the failure was in reaching the provider rather than in what it returned
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

pub(crate) async fn get_json<T>(client: &Client, url: &Url) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    tracing::debug!(%url, "sending request to identity provider");

    let connectivity = |source| FetchError::Connectivity {
        url: url.clone(),
        source,
    };

    let response = client.get(url.clone()).send().await.map_err(connectivity)?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%url, %status, "identity provider returned an error status");
        return Err(FetchError::Status {
            url: url.clone(),
            status,
        });
    }

    let body = response.bytes().await.map_err(connectivity)?;

    serde_json::from_slice(&body).map_err(|source| FetchError::Malformed {
        url: url.clone(),
        source,
    })
}
