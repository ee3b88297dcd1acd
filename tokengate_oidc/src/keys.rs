//! Resolution of the provider's token signing key

use std::sync::Arc;

use aliri_base64::Base64;
use reqwest::Client;
use thiserror::Error;
use tokengate::{error::SignatureMismatch, jwa, jwk, jws::Verifier, Jwks};

use crate::{http, ProviderMetadata};

/// The RSA public key that verifies the provider's token signatures
///
/// Cloning is cheap and clones share the key material.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct SigningKey {
    key: Arc<jwa::rsa::PublicKey>,
    key_id: Option<jwk::KeyId>,
}

impl SigningKey {
    /// Fetches the provider's JWK Set and selects its signing key
    ///
    /// See [`SigningKey::from_jwks`] for how the key is selected.
    ///
    /// # Errors
    ///
    /// The set could not be fetched or parsed, or contains no RSA signing key.
    #[tracing::instrument(skip_all, fields(jwks_uri = %metadata.jwks_uri()))]
    pub async fn from_jwk_set(
        client: &Client,
        metadata: &ProviderMetadata,
    ) -> Result<Self, KeyResolutionError> {
        let jwks: Jwks = http::get_json(client, metadata.jwks_uri()).await?;

        let key = Self::from_jwks(&jwks)?;

        tracing::info!(
            kid = ?key.key_id(),
            bits = key.public_key().bits(),
            "resolved signing key from JWK Set"
        );

        Ok(key)
    }

    /// Selects the signing key from a JWK Set
    ///
    /// The chosen key is the last RSA key, in document order, declared with
    /// `"use": "sig"`.
    ///
    /// # Errors
    ///
    /// No key in the set qualifies.
    pub fn from_jwks(jwks: &Jwks) -> Result<Self, KeyResolutionError> {
        let jwk = jwks
            .last_signing_key()
            .ok_or(KeyResolutionError::NoSigningKey)?;

        Ok(Self {
            key: Arc::new(jwk.rsa_public_key().clone()),
            key_id: jwk.key_id().map(ToOwned::to_owned),
        })
    }

    /// Decodes a base64-encoded X.509 `SubjectPublicKeyInfo` RSA key
    ///
    /// This is the form identity providers usually show as the realm's
    /// "public key". Whitespace anywhere in the string is ignored.
    ///
    /// # Errors
    ///
    /// The string is not standard base64, or does not hold an RSA public key.
    pub fn from_key_string(encoded: &str) -> Result<Self, KeyResolutionError> {
        let compact: String = encoded.split_whitespace().collect();

        let der = Base64::from_encoded(&compact)
            .map_err(|e| KeyResolutionError::MalformedKeyString(Box::new(e)))?;

        let key = jwa::rsa::PublicKey::from_x509_der(der.as_slice())?;

        Ok(Self::from(key))
    }

    /// Imports a PEM-armored RSA public key
    ///
    /// # Errors
    ///
    /// The PEM does not hold an RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self, KeyResolutionError> {
        Ok(Self::from(jwa::rsa::PublicKey::from_pem(pem)?))
    }

    /// The key ID advertised in the JWK Set, if any
    #[must_use]
    pub fn key_id(&self) -> Option<&jwk::KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The RSA public key
    #[must_use]
    pub fn public_key(&self) -> &jwa::rsa::PublicKey {
        &self.key
    }
}

impl From<jwa::rsa::PublicKey> for SigningKey {
    fn from(key: jwa::rsa::PublicKey) -> Self {
        Self {
            key: Arc::new(key),
            key_id: None,
        }
    }
}

impl Verifier for SigningKey {
    type Algorithm = jwa::Algorithm;
    type Error = SignatureMismatch;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.key.can_verify(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        self.key.verify(alg, data, signature)
    }
}

/// The signing key could not be resolved
#[derive(Debug, Error)]
pub enum KeyResolutionError {
    /// The JWK Set could not be retrieved or parsed
    #[error("unable to retrieve JWK Set")]
    Fetch(#[from] http::FetchError),

    /// The JWK Set holds no RSA key marked for signatures
    #[error("JWK Set contains no RSA signing key")]
    NoSigningKey,

    /// The key string is not valid base64
    #[error("public key string is not valid base64")]
    MalformedKeyString(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// The key material is not a usable RSA public key
    #[error(transparent)]
    KeyRejected(#[from] tokengate::error::KeyRejected),
}

impl KeyResolutionError {
    /// Whether the provider could not be reached at all
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_connectivity())
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use serde_json::json;
    use url::Url;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::test;

    #[test]
    fn selects_last_signing_key() -> Result<()> {
        let first = test::rsa_jwk(&test::PRIVATE_KEY, "first", jwa::Usage::Signing);
        let second = test::rsa_jwk(&test::OTHER_PRIVATE_KEY, "second", jwa::Usage::Signing);
        let encryption = test::rsa_jwk(&test::PRIVATE_KEY, "enc", jwa::Usage::Encryption);
        let jwks: Jwks = serde_json::from_value(json!({ "keys": [first, second, encryption] }))?;

        let key = SigningKey::from_jwks(&jwks)?;

        assert_eq!(key.key_id(), Some(jwk::KeyIdRef::from_str("second")));
        assert_eq!(key.public_key(), test::OTHER_PRIVATE_KEY.public_key());
        Ok(())
    }

    #[test]
    fn skips_non_rsa_entries() -> Result<()> {
        let rsa = test::rsa_jwk(&test::PRIVATE_KEY, "rsa", jwa::Usage::Signing);
        let jwks: Jwks = serde_json::from_value(json!({
            "keys": [
                rsa,
                { "kty": "EC", "use": "sig", "crv": "P-256", "x": "AA", "y": "AA" },
            ]
        }))?;

        let key = SigningKey::from_jwks(&jwks)?;

        assert_eq!(key.key_id(), Some(jwk::KeyIdRef::from_str("rsa")));
        Ok(())
    }

    #[test]
    fn no_signing_key_is_an_error() -> Result<()> {
        let enc = test::rsa_jwk(&test::PRIVATE_KEY, "enc", jwa::Usage::Encryption);
        let jwks: Jwks = serde_json::from_value(json!({ "keys": [enc] }))?;

        let err = SigningKey::from_jwks(&jwks).unwrap_err();

        assert!(matches!(err, KeyResolutionError::NoSigningKey));
        Ok(())
    }

    #[test]
    fn decodes_key_string() -> Result<()> {
        let der = test::PRIVATE_KEY.public_key().to_x509_der()?;
        let encoded = Base64::from_raw(der).to_string();
        let wrapped = format!("  {}\n{}  ", &encoded[..40], &encoded[40..]);

        let key = SigningKey::from_key_string(&wrapped)?;

        assert_eq!(key.public_key(), test::PRIVATE_KEY.public_key());
        assert_eq!(key.key_id(), None);
        Ok(())
    }

    #[test]
    fn rejects_invalid_key_strings() {
        assert!(matches!(
            SigningKey::from_key_string("not*base64!"),
            Err(KeyResolutionError::MalformedKeyString(_))
        ));
        assert!(matches!(
            SigningKey::from_key_string("aGVsbG8gd29ybGQ="),
            Err(KeyResolutionError::KeyRejected(_))
        ));
    }

    #[tokio::test]
    async fn fetches_jwk_set() -> Result<()> {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri())?;
        let metadata = ProviderMetadata::manual(&base, "auth", "token", "certs");

        let current = test::rsa_jwk(&test::PRIVATE_KEY, "current", jwa::Usage::Signing);
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [current] })))
            .expect(1)
            .mount(&server)
            .await;

        let key = SigningKey::from_jwk_set(&Client::new(), &metadata).await?;

        assert_eq!(key.key_id(), Some(jwk::KeyIdRef::from_str("current")));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_jwk_set_body_is_an_error() -> Result<()> {
        let server = MockServer::start().await;
        let base = Url::parse(&server.uri())?;
        let metadata = ProviderMetadata::manual(&base, "auth", "token", "certs");

        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = SigningKey::from_jwk_set(&Client::new(), &metadata)
            .await
            .unwrap_err();

        assert!(matches!(err, KeyResolutionError::Fetch(http::FetchError::Malformed { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_connectivity_failure() -> Result<()> {
        let base = test::unreachable_base_url().await?;
        let metadata = ProviderMetadata::manual(&base, "auth", "token", "certs");

        let err = SigningKey::from_jwk_set(&Client::new(), &metadata)
            .await
            .unwrap_err();

        assert!(err.is_connectivity());
        Ok(())
    }
}
