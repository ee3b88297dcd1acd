//! Common errors

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Declares an error wrapping an arbitrary source, plus its crate-private
/// constructor
macro_rules! boxed_source_error {
    ($(#[$meta:meta])* $name:ident => $ctor:ident: $msg:tt) => {
        $(#[$meta])*
        #[derive(Debug, Error)]
        #[error($msg)]
        pub struct $name {
            #[from]
            source: BoxedSource,
        }

        pub(crate) fn $ctor(source: impl Into<BoxedSource>) -> $name {
            $name {
                source: source.into(),
            }
        }
    };
}

/// The `alg` value names no supported RSA signature algorithm
#[derive(Debug, Error)]
#[error("'{alg}' does not match supported algorithms")]
pub struct UnknownAlgorithm {
    alg: String,
}

#[inline]
pub(crate) fn unknown_algorithm(alg: impl Into<String>) -> UnknownAlgorithm {
    UnknownAlgorithm { alg: alg.into() }
}

/// The JWK has a declared usage or algorithm that disallows this use
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("JWK cannot be used in this way")]
pub struct JwkUsageMismatch {
    _p: (),
}

pub(crate) const fn jwk_usage_mismatch() -> JwkUsageMismatch {
    JwkUsageMismatch { _p: () }
}

/// The token does not split into exactly three dot-separated sections
#[derive(Clone, Copy, Debug, Error)]
#[error("malformed JWT")]
pub struct MalformedJwt {
    _p: (),
}

pub(crate) fn malformed_jwt() -> MalformedJwt {
    MalformedJwt { _p: () }
}

boxed_source_error! {
    /// The JWT header section is malformed
    MalformedJwtHeader => malformed_jwt_header: "malformed JWT header"
}

boxed_source_error! {
    /// The JWT payload section is malformed
    MalformedJwtPayload => malformed_jwt_payload: "malformed JWT payload"
}

boxed_source_error! {
    /// The JWT signature section is malformed
    MalformedJwtSignature => malformed_jwt_signature: "malformed JWT signature"
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

boxed_source_error! {
    /// The key material was rejected
    KeyRejected => key_rejected: "key rejected"
}

/// Something failed that should not have, such as key generation
#[derive(Debug, Error)]
#[error("unexpected error")]
pub struct Unexpected {
    #[from]
    source: BoxedSource,
}

#[cfg_attr(not(feature = "private-keys"), allow(dead_code))]
pub(crate) fn unexpected(source: impl Into<BoxedSource>) -> Unexpected {
    Unexpected {
        source: source.into(),
    }
}

/// A signature could not be produced
#[derive(Debug, Error)]
pub enum SigningError {
    /// JWK cannot be used for signature creation
    #[error(transparent)]
    JwkUsageMismatch(#[from] JwkUsageMismatch),

    /// An unexpected error
    #[error(transparent)]
    Unexpected(#[from] Unexpected),
}

/// A key refused or failed to verify a signature
#[derive(Debug, Error)]
pub enum JwkVerifyError {
    /// JWK cannot be used for signature verification
    #[error(transparent)]
    JwkUsageMismatch(#[from] JwkUsageMismatch),

    /// Signature is invalid
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatch),
}

impl JwkVerifyError {
    /// Whether the error is due to a usage mismatch
    #[must_use]
    pub fn is_usage_mismatch(&self) -> bool {
        matches!(self, Self::JwkUsageMismatch(_))
    }

    /// Whether the error is due to a signature mismatch
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::SignatureMismatch(_))
    }
}

/// A JWT could not be parsed or verified
#[derive(Debug, Error)]
pub enum JwtVerifyError {
    /// The JWT was rejected by the key
    #[error("token rejected by key")]
    JwkVerifyError(#[from] JwkVerifyError),

    /// The JWT is malformed, without a discernible header, payload, and signature
    #[error(transparent)]
    MalformedToken(#[from] MalformedJwt),

    /// The JWT header is malformed
    #[error(transparent)]
    MalformedTokenHeader(#[from] MalformedJwtHeader),

    /// The JWT payload is malformed
    #[error(transparent)]
    MalformedTokenPayload(#[from] MalformedJwtPayload),

    /// The JWT signature is malformed
    #[error(transparent)]
    MalformedTokenSignature(#[from] MalformedJwtSignature),
}

impl From<SignatureMismatch> for JwtVerifyError {
    #[inline]
    fn from(err: SignatureMismatch) -> Self {
        Self::JwkVerifyError(err.into())
    }
}

impl JwtVerifyError {
    /// Whether the token could not be parsed at all
    ///
    /// Parse failures are distinct from a well-formed token whose signature
    /// does not verify.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::JwkVerifyError(_))
    }

    /// Whether the token was well-formed but its signature did not verify
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::JwkVerifyError(e) if e.is_signature_mismatch())
    }
}

/// A signed JWT could not be assembled
#[derive(Debug, Error)]
pub enum JwtSigningError {
    /// The key refused to sign
    #[error(transparent)]
    SigningError(#[from] SigningError),

    /// The JWT header could not be serialized
    #[error(transparent)]
    MalformedJwtHeader(#[from] MalformedJwtHeader),

    /// The JWT payload could not be serialized
    #[error(transparent)]
    MalformedJwtPayload(#[from] MalformedJwtPayload),
}
