//! This crate implements the parts of the Javascript/JSON Object Signing and
//! Encryption (JOSE) standards that a relying party needs in order to accept
//! RSA-signed access tokens:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Key (JWK): [RFC7517][]
//! * JSON Web Algorithms (JWA): [RFC7518][], RSA family only
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```no_run
//! use tokengate::{jwa, jwt, JwtRef};
//!
//! # fn example(n: Vec<u8>, e: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let key = jwa::rsa::PublicKey::from_components(n, e)?;
//! let token = JwtRef::from_str("eyJhbGciOiJSUzI1NiJ9.e30.c2lnbmF0dXJl");
//!
//! let decomposed = token.decompose()?;
//! let claims: jwt::Claims = decomposed.verify(&key)?;
//! # let _ = claims;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod clock;
pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jws;
pub mod jwt;

#[cfg(test)]
pub(crate) mod test;

#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jwt::{Jwt, JwtRef};
