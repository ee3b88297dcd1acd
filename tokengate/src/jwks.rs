use crate::{jwk, Jwk};

use serde::{Deserialize, Serialize};

/// A JSON Web Key Set (JWKS)
///
/// Entries that are not RSA keys, or that are otherwise not understood, are
/// dropped while deserializing rather than failing the whole set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    #[serde(deserialize_with = "deserialize_keys")]
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// A view of the keys in this set
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// The last RSA key in document order declared for signatures
    ///
    /// When a provider publishes several signing keys, later entries take
    /// precedence over earlier ones.
    pub fn last_signing_key(&self) -> Option<&Jwk> {
        self.keys.iter().filter(|k| k.is_rsa_signing_key()).last()
    }
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<Jwk>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct MaybeJwksVisitor;

    impl<'de> serde::de::Visitor<'de> for MaybeJwksVisitor {
        type Value = Vec<Jwk>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of JWK objects")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut values = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            let mut index = 0_usize;

            while let Some(value) = seq.next_element()? {
                match value {
                    MaybeJwk::Jwk(jwk) => values.push(jwk),
                    MaybeJwk::Unknown(key) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            jwks.idx = index,
                            jwk.kty = ?key.kty,
                            jwk.kid = ?key.kid,
                            "jwk.use" = ?key.r#use,
                            jwk.alg = ?key.alg,
                            "skipping unsupported JWK"
                        );
                        let _ = (index, key);
                    }
                }
                index += 1;
            }

            Ok(values)
        }
    }

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum MaybeJwk {
        Jwk(Jwk),
        Unknown(JwkLike),
    }

    #[allow(dead_code)]
    #[derive(serde::Deserialize)]
    struct JwkLike {
        #[serde(default)]
        kty: Option<String>,
        #[serde(default)]
        kid: Option<jwk::KeyId>,
        #[serde(rename = "use", default)]
        r#use: Option<String>,
        #[serde(default)]
        alg: Option<String>,
    }

    deserializer.deserialize_seq(MaybeJwksVisitor)
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    #[cfg(feature = "tracing")]
    use tracing_test::traced_test;

    use super::*;
    use crate::{jwa, test::rsa::*};

    const JWKS_WITH_UNKNOWN_ALG: &str = r#"
        {
            "keys": [
                {
                    "kid": "1",
                    "use": "enc",
                    "alg": "RSA-OAEP"
                }
            ]
        }
    "#;

    const JWKS_WITH_NOTHING: &str = r#"
        {
            "keys": [
                {}
            ]
        }
    "#;

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn skips_keys_with_unknown_alg() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(JWKS_WITH_UNKNOWN_ALG)?;
        assert!(jwks.keys().is_empty());
        Ok(())
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn skips_empty_objects() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(JWKS_WITH_NOTHING)?;
        assert!(jwks.keys().is_empty());
        Ok(())
    }

    #[test]
    fn missing_keys_member_is_an_error() {
        assert!(serde_json::from_str::<Jwks>(r#"{"other": []}"#).is_err());
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn decodes_mixed_jwks_keeping_only_rsa() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(JWKS)?;

        assert_eq!(jwks.keys().len(), 4);
        Ok(())
    }

    #[test]
    fn later_signing_key_wins() -> Result<()> {
        let jwks: Jwks = serde_json::from_str(JWKS)?;

        let key = jwks.last_signing_key().expect("signing key present");

        assert_eq!(key.key_id(), Some(jwk::KeyIdRef::from_str(TEST_KEY_ID)));
        Ok(())
    }

    #[test]
    fn no_signing_key_when_usages_are_absent() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(JWK_MINIMAL)?;
        let mut jwks = Jwks::default();
        jwks.add_key(jwk.clone().with_usage(jwa::Usage::Encryption));
        jwks.add_key(jwk);

        assert!(jwks.last_signing_key().is_none());
        Ok(())
    }

    #[test]
    fn second_of_two_signing_keys_wins() -> Result<()> {
        let jwk: Jwk = serde_json::from_str(JWK_MINIMAL)?;
        let mut jwks = Jwks::default();
        jwks.add_key(
            jwk.clone()
                .with_key_id(jwk::KeyId::from_static("first"))
                .with_usage(jwa::Usage::Signing),
        );
        jwks.add_key(
            jwk.with_key_id(jwk::KeyId::from_static("second"))
                .with_usage(jwa::Usage::Signing),
        );

        let key = jwks.last_signing_key().expect("signing key present");

        assert_eq!(key.key_id(), Some(jwk::KeyIdRef::from_str("second")));
        Ok(())
    }
}
