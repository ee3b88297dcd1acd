//! Implementations of the JSON Web Keys (JWK) standard
//!
//! The specifications for JSON Web Keys can be found in [RFC7517][].
//! Only RSA keys (`"kty": "RSA"`) are representable here; documents
//! describing other key types fail to deserialize as a [`Jwk`].
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use std::convert::TryFrom;

use aliri_braid::braid;
use serde::{Deserialize, Serialize, Serializer};

use crate::{error, jwa, jws::Verifier};

/// An identifier for a JWK
#[braid(serde, ref_doc = "A borrowed reference to JWK identifier ([`KeyId`])")]
pub struct KeyId;

/// An identified JSON Web Key
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "JwkDto")]
#[must_use]
pub struct Jwk {
    key_id: Option<KeyId>,
    usage: Option<jwa::Usage>,
    algorithm: Option<jwa::Algorithm>,
    key: Key,
}

impl Jwk {
    /// The key ID
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The intended usage of the key
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The algorithm to be used with this JWK
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.algorithm
    }

    /// The RSA public key held by this JWK
    #[must_use]
    pub fn rsa_public_key(&self) -> &jwa::rsa::PublicKey {
        match &self.key {
            Key::Rsa(pk) => pk,
        }
    }

    /// Whether this is an RSA key declared for signatures (`"use": "sig"`)
    ///
    /// Keys with no declared usage do not qualify.
    #[must_use]
    pub fn is_rsa_signing_key(&self) -> bool {
        matches!(self.key, Key::Rsa(_)) && self.usage == Some(jwa::Usage::Signing)
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: KeyId) -> Self {
        Self {
            key_id: Some(kid),
            ..self
        }
    }

    /// Sets the key's usage
    pub fn with_usage(self, usage: jwa::Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Sets the algorithm, which also marks the key for signing
    pub fn with_algorithm(self, alg: jwa::Algorithm) -> Self {
        Self {
            algorithm: Some(alg),
            usage: Some(jwa::Usage::Signing),
            ..self
        }
    }
}

impl From<jwa::rsa::PublicKey> for Jwk {
    fn from(key: jwa::rsa::PublicKey) -> Self {
        Self {
            key_id: None,
            usage: None,
            algorithm: None,
            key: Key::Rsa(key),
        }
    }
}

impl Verifier for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.usage.map_or(true, |u| u == jwa::Usage::Signing)
            && self.algorithm.map_or(true, |a| a == alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.can_verify(alg) {
            return Err(error::jwk_usage_mismatch().into());
        }

        match &self.key {
            Key::Rsa(pk) => pk.verify(alg, data, signature)?,
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct JwkDto {
    #[serde(rename = "kid", default)]
    key_id: Option<KeyId>,

    #[serde(rename = "use", default)]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", default)]
    algorithm: Option<jwa::Algorithm>,

    #[serde(flatten)]
    key: Key,
}

impl TryFrom<JwkDto> for Jwk {
    type Error = error::JwkUsageMismatch;

    fn try_from(dto: JwkDto) -> Result<Self, Self::Error> {
        if dto.algorithm.is_some() && dto.usage == Some(jwa::Usage::Encryption) {
            return Err(error::jwk_usage_mismatch());
        }

        Ok(Self {
            key_id: dto.key_id,
            usage: dto.usage,
            algorithm: dto.algorithm,
            key: dto.key,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct JwkDtoRef<'a> {
    #[serde(rename = "kid", skip_serializing_if = "Option::is_none")]
    key_id: Option<&'a KeyIdRef>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", skip_serializing_if = "Option::is_none")]
    algorithm: Option<jwa::Algorithm>,

    #[serde(flatten)]
    key: &'a Key,
}

impl Serialize for Jwk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let dto = JwkDtoRef {
            key_id: self.key_id(),
            usage: self.usage(),
            algorithm: self.algorithm(),
            key: &self.key,
        };

        dto.serialize(serializer)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kty")]
enum Key {
    #[serde(rename = "RSA")]
    Rsa(jwa::rsa::PublicKey),
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::test;

    #[test]
    fn deserializes_rsa_signing_key() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(test::rsa::JWK)?;

        assert_eq!(jwk.key_id(), Some(KeyIdRef::from_str(test::rsa::TEST_KEY_ID)));
        assert_eq!(jwk.usage(), Some(jwa::Usage::Signing));
        assert_eq!(jwk.algorithm(), Some(jwa::Algorithm::RS256));
        assert!(jwk.is_rsa_signing_key());
        assert_eq!(jwk.rsa_public_key().bits(), 2048);
        Ok(())
    }

    #[test]
    fn key_without_usage_is_not_a_signing_key() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(test::rsa::JWK_MINIMAL)?;

        assert_eq!(jwk.usage(), None);
        assert!(!jwk.is_rsa_signing_key());
        Ok(())
    }

    #[test]
    fn rejects_other_key_types() {
        let json = r#"{"kty":"EC","crv":"P-256","x":"AAAA","y":"AAAA","use":"sig"}"#;
        assert!(serde_json::from_str::<Jwk>(json).is_err());
    }

    #[test]
    fn serializes_with_standard_member_names() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(test::rsa::JWK)?;

        let value = serde_json::to_value(&jwk)?;

        assert_eq!(value["kty"], "RSA");
        assert_eq!(value["use"], "sig");
        assert_eq!(value["alg"], "RS256");
        assert_eq!(value["e"], "AQAB");
        Ok(())
    }

    #[test]
    fn algorithm_mismatch_prevents_verification() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(test::rsa::JWK)?;

        let err = jwk
            .verify(jwa::Algorithm::PS256, b"data", b"sig")
            .unwrap_err();

        assert!(err.is_usage_mismatch());
        Ok(())
    }

    #[cfg(feature = "private-keys")]
    #[test]
    fn verifies_signature_from_matching_private_key() -> Result<()> {
        use crate::jws::Signer;

        let key = &*test::rsa::PRIVATE_KEY;
        let jwk = Jwk::from(key.public_key().clone()).with_algorithm(jwa::Algorithm::RS384);

        let sig = key.sign(jwa::Algorithm::RS384, b"data")?;

        jwk.verify(jwa::Algorithm::RS384, b"data", &sig)?;
        Ok(())
    }
}
