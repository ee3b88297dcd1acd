use std::{fmt, sync::Arc};

use openssl::{pkey::Private, rsa::Rsa};
use ring::signature::RsaKeyPair;

use super::PublicKey;
use crate::{error, jwa, jws};

/// An RSA key pair able to produce token signatures
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    der: Vec<u8>,
    ring_cache: Arc<RsaKeyPair>,
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for PrivateKey {}

impl PrivateKey {
    /// Generates a new 2048-bit RSA key pair
    ///
    /// # Errors
    ///
    /// Unable to generate a private key.
    pub fn generate() -> Result<Self, error::Unexpected> {
        let rsa = Rsa::generate(2048).map_err(error::unexpected)?;
        Self::from_openssl_key(&rsa).map_err(error::unexpected)
    }

    /// Imports an RSA key pair from a PEM file
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let rsa = Rsa::private_key_from_pem(pem.as_bytes()).map_err(error::key_rejected)?;
        Self::from_openssl_key(&rsa)
    }

    fn from_openssl_key(rsa: &Rsa<Private>) -> Result<Self, error::KeyRejected> {
        let der = rsa.private_key_to_der().map_err(error::key_rejected)?;

        let public_key = PublicKey::from_components(rsa.n().to_vec(), rsa.e().to_vec())?;

        let ring_cache =
            Arc::new(RsaKeyPair::from_der(&der).map_err(|e| error::key_rejected(e.to_string()))?);

        Ok(Self {
            public_key,
            der,
            ring_cache,
        })
    }

    /// The RSA key pair in PKCS#1 DER encoding
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Exports the RSA key pair as a PEM file
    ///
    /// # Errors
    ///
    /// OpenSSL could not re-encode the key.
    pub fn to_pem(&self) -> Result<String, error::Unexpected> {
        let key = Rsa::private_key_from_der(&self.der).map_err(error::unexpected)?;
        let pem = key.private_key_to_pem().map_err(error::unexpected)?;
        String::from_utf8(pem).map_err(error::unexpected)
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Extracts the public key
    pub fn into_public_key(self) -> PublicKey {
        self.public_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl jws::Signer for PrivateKey {
    type Algorithm = jwa::Algorithm;
    type Error = error::Unexpected;

    fn can_sign(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let mut buf = vec![0; self.ring_cache.public().modulus_len()];
        self.ring_cache
            .sign(
                alg.signing_params(),
                &ring::rand::SystemRandom::new(),
                data,
                &mut buf,
            )
            .map_err(|e| error::unexpected(e.to_string()))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;
    use crate::{
        jws::{Signer, Verifier},
        test::rsa::PRIVATE_KEY,
    };

    #[test]
    fn signatures_verify_with_public_half() -> Result<()> {
        let data = b"header.payload";

        for alg in [jwa::Algorithm::RS256, jwa::Algorithm::PS512] {
            let sig = PRIVATE_KEY.sign(alg, data)?;
            PRIVATE_KEY.public_key().verify(alg, data, &sig)?;
        }

        Ok(())
    }

    #[test]
    fn tampered_data_fails_verification() -> Result<()> {
        let sig = PRIVATE_KEY.sign(jwa::Algorithm::RS256, b"original")?;

        let result = PRIVATE_KEY
            .public_key()
            .verify(jwa::Algorithm::RS256, b"tampered", &sig);

        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn pem_round_trip() -> Result<()> {
        let pem = PRIVATE_KEY.to_pem()?;
        let imported = PrivateKey::from_pem(&pem)?;

        assert_eq!(&imported, &*PRIVATE_KEY);
        Ok(())
    }

    #[test]
    fn debug_redacts_private_material() {
        let debug = format!("{:?}", *PRIVATE_KEY);
        assert!(debug.contains("<redacted>"));
    }
}
