use std::{convert::TryFrom, fmt};

use aliri_base64::{Base64Url, Base64UrlRef};
#[cfg(feature = "openssl")]
use openssl::{bn::BigNum, rsa::Rsa};
use serde::{Deserialize, Serialize};

use super::{MAX_MODULUS_LEN, MIN_MODULUS_LEN};
use crate::{error, jwa, jws};

/// An RSA public key
///
/// Held as its big-endian modulus and exponent, which is both the JWK
/// representation and the form `ring` verifies against.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyDto")]
pub struct PublicKey {
    /// The public modulus
    #[serde(rename = "n")]
    modulus: Base64Url,

    /// The public exponent
    #[serde(rename = "e")]
    exponent: Base64Url,
}

impl PublicKey {
    /// The public key's modulus
    pub fn modulus(&self) -> &Base64UrlRef {
        &self.modulus
    }

    /// The public key's exponent
    pub fn exponent(&self) -> &Base64UrlRef {
        &self.exponent
    }

    /// The size of the modulus in bits
    #[must_use]
    pub fn bits(&self) -> usize {
        self.modulus.as_slice().len() * 8
    }

    /// Constructs a public key from the modulus and exponent
    ///
    /// Leading zero octets in either component are ignored.
    ///
    /// # Errors
    ///
    /// The modulus is outside the 2048 to 8192 bit range, or the exponent
    /// is empty.
    pub fn from_components(
        modulus: impl Into<Base64Url>,
        exponent: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let modulus = strip_leading_zeros(modulus.into());
        let exponent = strip_leading_zeros(exponent.into());

        let len = modulus.as_slice().len();
        if !(MIN_MODULUS_LEN..=MAX_MODULUS_LEN).contains(&len) {
            return Err(error::key_rejected(format!(
                "key modulus must be between 2048 and 8192 bits, got {} bits",
                len * 8
            )));
        }

        if exponent.as_slice().is_empty() {
            return Err(error::key_rejected("key exponent must not be empty"));
        }

        Ok(Self { modulus, exponent })
    }

    /// Imports an RSA public key from DER-encoded X.509 `SubjectPublicKeyInfo`
    ///
    /// # Errors
    ///
    /// The bytes are not an RSA `SubjectPublicKeyInfo` structure.
    #[cfg(feature = "openssl")]
    #[cfg_attr(docsrs, doc(cfg(feature = "openssl")))]
    pub fn from_x509_der(der: &[u8]) -> Result<Self, error::KeyRejected> {
        let rsa = Rsa::public_key_from_der(der).map_err(error::key_rejected)?;
        Self::from_components(rsa.n().to_vec(), rsa.e().to_vec())
    }

    /// Imports an RSA public key from a PEM file
    ///
    /// Both `PUBLIC KEY` and `RSA PUBLIC KEY` armor are accepted.
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid RSA public key.
    #[cfg(feature = "openssl")]
    #[cfg_attr(docsrs, doc(cfg(feature = "openssl")))]
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let rsa = Rsa::public_key_from_pem(pem.as_bytes())
            .or_else(|_| Rsa::public_key_from_pem_pkcs1(pem.as_bytes()))
            .map_err(error::key_rejected)?;
        Self::from_components(rsa.n().to_vec(), rsa.e().to_vec())
    }

    /// Exports the key as DER-encoded X.509 `SubjectPublicKeyInfo`
    ///
    /// # Errors
    ///
    /// OpenSSL refused the key components.
    #[cfg(feature = "openssl")]
    #[cfg_attr(docsrs, doc(cfg(feature = "openssl")))]
    pub fn to_x509_der(&self) -> Result<Vec<u8>, error::KeyRejected> {
        let modulus = BigNum::from_slice(self.modulus.as_slice()).map_err(error::key_rejected)?;
        let exponent = BigNum::from_slice(self.exponent.as_slice()).map_err(error::key_rejected)?;

        let key = Rsa::from_public_components(modulus, exponent).map_err(error::key_rejected)?;
        key.public_key_to_der().map_err(error::key_rejected)
    }
}

fn strip_leading_zeros(value: Base64Url) -> Base64Url {
    let raw = value.as_slice();
    match raw.iter().position(|&b| b != 0) {
        Some(0) => value,
        Some(idx) => Base64Url::from_raw(&raw[idx..]),
        None => Base64Url::from_raw(Vec::new()),
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.bits())
            .field("exponent", &self.exponent)
            .finish()
    }
}

impl jws::Verifier for PublicKey {
    type Algorithm = jwa::Algorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.verification_params(), data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

impl TryFrom<PublicKeyDto> for PublicKey {
    type Error = error::KeyRejected;

    fn try_from(dto: PublicKeyDto) -> Result<Self, Self::Error> {
        let modulus = Base64Url::from_encoded(&dto.modulus).map_err(error::key_rejected)?;
        let exponent = Base64Url::from_encoded(&dto.exponent).map_err(error::key_rejected)?;
        Self::from_components(modulus, exponent)
    }
}

/// Members are decoded after deserialization so owned JSON values work too
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
struct PublicKeyDto {
    #[serde(rename = "n")]
    modulus: String,

    #[serde(rename = "e")]
    exponent: String,
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn rejects_short_modulus() {
        let err = PublicKey::from_components(vec![0xAB; 128], vec![1, 0, 1]).unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn rejects_empty_exponent() {
        assert!(PublicKey::from_components(vec![0xAB; 256], Vec::new()).is_err());
    }

    #[test]
    fn ignores_leading_zero_octets() -> Result<()> {
        let mut modulus = vec![0x00];
        modulus.extend_from_slice(&[0xC3; 256]);

        let key = PublicKey::from_components(modulus, vec![0, 1, 0, 1])?;

        assert_eq!(key.bits(), 2048);
        assert_eq!(key.exponent().as_slice(), &[1, 0, 1]);
        Ok(())
    }

    #[test]
    fn deserializes_from_jwk_members() -> Result<()> {
        let n = Base64Url::from_raw(vec![0xC3; 256]);
        let json = format!(r#"{{"n":"{}","e":"AQAB"}}"#, n);

        let key: PublicKey = serde_json::from_str(&json)?;

        assert_eq!(key.bits(), 2048);
        Ok(())
    }

    #[test]
    fn deserializes_from_owned_json_value() -> Result<()> {
        let n = Base64Url::from_raw(vec![0xC3; 256]);
        let value = serde_json::json!({ "n": n.to_string(), "e": "AQAB" });

        let key: PublicKey = serde_json::from_value(value)?;

        assert_eq!(key.bits(), 2048);
        assert_eq!(key.exponent().as_slice(), &[1, 0, 1]);
        Ok(())
    }

    #[test]
    fn rejects_invalid_base64_members() {
        let value = serde_json::json!({ "n": "not base64!", "e": "AQAB" });

        assert!(serde_json::from_value::<PublicKey>(value).is_err());
    }

    #[cfg(feature = "private-keys")]
    #[test]
    fn x509_der_round_trip() -> Result<()> {
        let key = crate::test::rsa::PRIVATE_KEY.public_key().clone();

        let der = key.to_x509_der()?;
        let imported = PublicKey::from_x509_der(&der)?;

        assert_eq!(imported, key);
        Ok(())
    }

    #[cfg(feature = "openssl")]
    #[test]
    fn pem_and_jwk_describe_same_key() -> Result<()> {
        let from_pem = PublicKey::from_pem(crate::test::rsa::PUBLIC_KEY_PEM)?;
        let jwk: crate::Jwk = serde_json::from_str(crate::test::rsa::JWK)?;

        assert_eq!(&from_pem, jwk.rsa_public_key());
        Ok(())
    }

    #[cfg(feature = "openssl")]
    #[test]
    fn x509_fixture_matches_pem() -> Result<()> {
        use aliri_base64::Base64;

        let der = Base64::from_encoded(crate::test::rsa::PUBLIC_KEY_X509_BASE64.trim())?;
        let from_der = PublicKey::from_x509_der(der.as_slice())?;
        let from_pem = PublicKey::from_pem(crate::test::rsa::PUBLIC_KEY_PEM)?;

        assert_eq!(from_der, from_pem);
        Ok(())
    }

    #[cfg(feature = "openssl")]
    #[test]
    fn rejects_garbage_der() {
        assert!(PublicKey::from_x509_der(b"definitely not DER").is_err());
    }
}
