//! The single entry point for validating access tokens

use std::{error::Error as StdError, future::Future, pin::Pin};

use reqwest::Client;
use thiserror::Error;
use tokengate::{
    clock::{Clock, System},
    jwt::{Issuer, IssuerRef},
};

use crate::{
    bearer::{self, MalformedAuthorization},
    introspection::{IntrospectionError, IntrospectionValidator},
    keys::KeyResolutionError,
    local::{LocalVerifier, LocalVerifyError},
    ClientCredentials, ProviderMetadata, SigningKey,
};

/// The claims of a validated token, as a JSON object
pub type ClaimMap = serde_json::Map<String, serde_json::Value>;

/// A token could not be validated
///
/// Callers only ever need to distinguish a bad token from a provider that
/// could not be asked.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The token, or the request carrying it, is not acceptable
    #[error("{description}")]
    Validation {
        /// Why the token was refused
        description: String,
    },

    /// The identity provider could not be reached
    #[error("could not connect to the identity provider {provider}")]
    Connectivity {
        /// The address that was contacted
        provider: String,
        /// The transport failure
        #[source]
        cause: Box<dyn StdError + Send + Sync + 'static>,
    },
}

impl ValidationError {
    fn validation(err: &dyn StdError) -> Self {
        Self::Validation {
            description: err.to_string(),
        }
    }

    /// Whether validation failed because the provider was unreachable
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

impl From<MalformedAuthorization> for ValidationError {
    fn from(err: MalformedAuthorization) -> Self {
        Self::validation(&err)
    }
}

impl From<LocalVerifyError> for ValidationError {
    fn from(err: LocalVerifyError) -> Self {
        Self::validation(&err)
    }
}

impl From<KeyResolutionError> for ValidationError {
    fn from(err: KeyResolutionError) -> Self {
        Self::validation(&err)
    }
}

impl From<IntrospectionError> for ValidationError {
    fn from(err: IntrospectionError) -> Self {
        match err {
            IntrospectionError::Connectivity { provider, source } => Self::Connectivity {
                provider: provider.into(),
                cause: Box::new(source),
            },
            other => Self::validation(&other),
        }
    }
}

/// Validates access tokens presented in `Authorization` headers
///
/// Local validation judges token lifetimes by the validator's clock, which
/// is the system clock unless replaced with [`TokenValidator::with_clock`].
#[derive(Clone, Debug, Default)]
pub struct TokenValidator<C = System> {
    introspection: IntrospectionValidator,
    clock: C,
}

impl TokenValidator {
    /// Uses `client` for introspection requests
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            introspection: IntrospectionValidator::new(client),
            clock: System,
        }
    }
}

impl<C: Clock> TokenValidator<C> {
    /// Replaces the clock used for local validation
    #[must_use]
    pub fn with_clock<D: Clock>(self, clock: D) -> TokenValidator<D> {
        TokenValidator {
            introspection: self.introspection,
            clock,
        }
    }

    /// Verifies the bearer token's signature, issuer, and lifetime offline
    ///
    /// # Errors
    ///
    /// Always [`ValidationError::Validation`]: the header carries no bearer
    /// token, or the token fails verification.
    pub fn validate_locally(
        &self,
        authorization: Option<&str>,
        issuer: &IssuerRef,
        key: &SigningKey,
    ) -> Result<ClaimMap, ValidationError> {
        let result = bearer::extract_access_token(authorization)
            .map_err(ValidationError::from)
            .and_then(|token| {
                LocalVerifier::verify_with_clock(&token, key, issuer, &self.clock)
                    .map_err(ValidationError::from)
            })
            .map(|claims| claims.into_map());

        trace_failure(result)
    }

    /// Asks the provider's introspection endpoint about the bearer token
    ///
    /// # Errors
    ///
    /// [`ValidationError::Connectivity`] if the provider could not be
    /// reached. [`ValidationError::Validation`] for everything else.
    pub async fn validate_by_introspection(
        &self,
        authorization: Option<&str>,
        metadata: &ProviderMetadata,
        credentials: &ClientCredentials,
    ) -> Result<ClaimMap, ValidationError> {
        let result = match bearer::extract_access_token(authorization) {
            Ok(token) => self
                .introspection
                .introspect(&token, metadata, credentials)
                .await
                .map_err(ValidationError::from),
            Err(err) => Err(err.into()),
        };

        trace_failure(result)
    }
}

fn trace_failure(result: Result<ClaimMap, ValidationError>) -> Result<ClaimMap, ValidationError> {
    if let Err(err) = &result {
        tracing::debug!(
            error = %err,
            connectivity = err.is_connectivity(),
            "token validation failed"
        );
    }
    result
}

/// A boxed validation in flight
pub type ValidationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ClaimMap, ValidationError>> + Send + 'a>>;

/// One way of validating an access token
///
/// Strategies carry whatever they need beyond the header, so callers can
/// pick one at configuration time and hold it as a trait object.
pub trait TokenValidationStrategy<C = System> {
    /// Validates the token carried in `authorization`
    fn validate<'a>(
        &'a self,
        validator: &'a TokenValidator<C>,
        authorization: Option<&'a str>,
    ) -> ValidationFuture<'a>;
}

/// Offline validation against a known issuer and signing key
#[derive(Clone, Debug)]
pub struct LocalStrategy {
    issuer: Issuer,
    key: SigningKey,
}

impl LocalStrategy {
    /// Accepts tokens from `issuer` signed by `key`
    #[must_use]
    pub fn new(issuer: Issuer, key: SigningKey) -> Self {
        Self { issuer, key }
    }
}

impl<C: Clock> TokenValidationStrategy<C> for LocalStrategy {
    fn validate<'a>(
        &'a self,
        validator: &'a TokenValidator<C>,
        authorization: Option<&'a str>,
    ) -> ValidationFuture<'a> {
        let result = validator.validate_locally(authorization, &self.issuer, &self.key);
        Box::pin(async move { result })
    }
}

/// Validation through the provider's introspection endpoint
#[derive(Clone, Debug)]
pub struct IntrospectionStrategy {
    metadata: ProviderMetadata,
    credentials: ClientCredentials,
}

impl IntrospectionStrategy {
    /// Introspects at the endpoint named in `metadata`, authenticating with
    /// `credentials`
    #[must_use]
    pub fn new(metadata: ProviderMetadata, credentials: ClientCredentials) -> Self {
        Self {
            metadata,
            credentials,
        }
    }
}

impl<C: Clock + Sync> TokenValidationStrategy<C> for IntrospectionStrategy {
    fn validate<'a>(
        &'a self,
        validator: &'a TokenValidator<C>,
        authorization: Option<&'a str>,
    ) -> ValidationFuture<'a> {
        Box::pin(validator.validate_by_introspection(
            authorization,
            &self.metadata,
            &self.credentials,
        ))
    }
}
