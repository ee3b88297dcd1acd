//! Offline verification of signed access tokens

use thiserror::Error;
use tokengate::{
    clock::{Clock, System, UnixTime},
    error::JwtVerifyError,
    jwt::{Claims, IssuerRef},
    JwtRef,
};

use crate::SigningKey;

/// Verifies RSA-signed tokens against a known key and issuer
///
/// Checks run in a fixed order and the first failure is reported:
///
/// 1. the token must be a well-formed JWS naming an RSA algorithm,
/// 2. the signature must verify with the signing key,
/// 3. `iss` must equal the expected issuer exactly,
/// 4. the current time must lie in `[nbf, exp)`.
///
/// Tokens without `exp` or `nbf` are treated as inactive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalVerifier;

impl LocalVerifier {
    /// Verifies `token` against the system clock
    ///
    /// # Errors
    ///
    /// See [`LocalVerifyError`].
    pub fn verify(
        token: &JwtRef,
        key: &SigningKey,
        issuer: &IssuerRef,
    ) -> Result<Claims, LocalVerifyError> {
        Self::verify_with_clock(token, key, issuer, &System)
    }

    /// Verifies `token`, judging its validity window by `clock`
    ///
    /// # Errors
    ///
    /// See [`LocalVerifyError`].
    pub fn verify_with_clock(
        token: &JwtRef,
        key: &SigningKey,
        issuer: &IssuerRef,
        clock: &impl Clock,
    ) -> Result<Claims, LocalVerifyError> {
        let decomposed = token.decompose().map_err(LocalVerifyError::Malformed)?;

        decomposed.verify_signature(key).map_err(|e| {
            if e.is_signature_mismatch() {
                LocalVerifyError::SignatureMismatch
            } else {
                LocalVerifyError::Malformed(e)
            }
        })?;

        let claims: Claims = decomposed
            .untrusted_claims()
            .map_err(LocalVerifyError::Malformed)?;

        if claims.issuer() != Some(issuer) {
            return Err(LocalVerifyError::IssuerMismatch);
        }

        let now = clock.now();
        if !claims.is_active_at(now) {
            return Err(LocalVerifyError::Inactive {
                now,
                not_before: claims.not_before(),
                expiration: claims.expiration(),
            });
        }

        Ok(claims)
    }
}

/// A token failed local verification
#[derive(Debug, Error)]
pub enum LocalVerifyError {
    /// The token could not be parsed
    #[error("token is malformed")]
    Malformed(#[source] JwtVerifyError),

    /// The signature was not produced by the provider's key
    #[error("token signature does not match the provider key")]
    SignatureMismatch,

    /// The token names a different issuer
    #[error("token has wrong issuer")]
    IssuerMismatch,

    /// The current time is outside the token's validity window
    #[error("token is not active")]
    Inactive {
        /// The time the token was checked at
        now: UnixTime,
        /// The token's `nbf` claim
        not_before: Option<UnixTime>,
        /// The token's `exp` claim
        expiration: Option<UnixTime>,
    },
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use tokengate::{
        clock::TestClock,
        jwa,
        jwt::{Headers, Issuer},
        Jwt,
    };

    use super::*;
    use crate::test::{self, ISSUER, NOW, OTHER_PRIVATE_KEY, PRIVATE_KEY};

    fn key() -> SigningKey {
        SigningKey::from(PRIVATE_KEY.public_key().clone())
    }

    fn verify_at(token: &Jwt, now: UnixTime) -> Result<Claims, LocalVerifyError> {
        LocalVerifier::verify_with_clock(
            token,
            &key(),
            IssuerRef::from_str(ISSUER),
            &TestClock::new(now),
        )
    }

    #[test]
    fn valid_token_returns_its_claims() -> Result<()> {
        let claims = test::valid_claims();
        let token = test::mint(&claims, &PRIVATE_KEY);

        let verified = verify_at(&token, NOW)?;

        assert_eq!(verified, claims);
        assert_eq!(verified.get("sub"), Some(&serde_json::json!("alice")));
        Ok(())
    }

    #[test]
    fn verifies_pss_signatures() -> Result<()> {
        let token = Jwt::try_from_parts_with_signature(
            &Headers::new(jwa::Algorithm::PS384),
            &test::valid_claims(),
            &*PRIVATE_KEY,
        )?;

        let claims = verify_at(&token, NOW)?;

        assert_eq!(claims.get("sub"), Some(&serde_json::json!("alice")));
        Ok(())
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = test::mint(&test::valid_claims(), &OTHER_PRIVATE_KEY);

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::SignatureMismatch));
    }

    #[test]
    fn signature_is_checked_before_issuer_and_window() {
        let claims = Claims::new()
            .with_issuer(Issuer::from_static("https://elsewhere.example"))
            .with_not_before(NOW.after(100))
            .with_expiration(NOW.after(200));
        let token = test::mint(&claims, &OTHER_PRIVATE_KEY);

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::SignatureMismatch));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let claims =
            test::valid_claims().with_issuer(Issuer::from_static("https://elsewhere.example"));
        let token = test::mint(&claims, &PRIVATE_KEY);

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::IssuerMismatch));
    }

    #[test]
    fn issuer_is_checked_before_window() {
        let claims = Claims::new()
            .with_issuer(Issuer::from_static("https://elsewhere.example"))
            .with_not_before(NOW.before(200))
            .with_expiration(NOW.before(100));
        let token = test::mint(&claims, &PRIVATE_KEY);

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::IssuerMismatch));
    }

    #[test]
    fn missing_issuer_is_a_mismatch() {
        let claims = Claims::new()
            .with_not_before(NOW.before(60))
            .with_expiration(NOW.after(60));
        let token = test::mint(&claims, &PRIVATE_KEY);

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::IssuerMismatch));
    }

    #[test]
    fn expiration_is_exclusive() {
        let claims = test::valid_claims().with_expiration(NOW);
        let token = test::mint(&claims, &PRIVATE_KEY);

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::Inactive { now, .. } if now == NOW));
        assert!(verify_at(&token, NOW.before(1)).is_ok());
    }

    #[test]
    fn not_before_is_inclusive() -> Result<()> {
        let claims = test::valid_claims().with_not_before(NOW);
        let token = test::mint(&claims, &PRIVATE_KEY);

        let claims = verify_at(&token, NOW)?;
        assert_eq!(claims.not_before(), Some(NOW));
        assert!(matches!(
            verify_at(&token, NOW.before(1)),
            Err(LocalVerifyError::Inactive { .. })
        ));
        Ok(())
    }

    #[test]
    fn fractional_numeric_dates_are_accepted() -> Result<()> {
        let payload = serde_json::json!({
            "iss": ISSUER,
            "sub": "alice",
            "nbf": 1_699_999_940.5,
            "exp": 1_700_000_060.5,
        });
        let token = Jwt::try_from_parts_with_signature(
            &Headers::new(jwa::Algorithm::RS256),
            &payload,
            &*PRIVATE_KEY,
        )?;

        let claims = verify_at(&token, NOW)?;

        assert_eq!(claims.not_before(), Some(NOW.before(60)));
        assert_eq!(claims.expiration(), Some(NOW.after(60)));
        Ok(())
    }

    #[test]
    fn token_without_expiration_is_inactive() {
        let claims = Claims::new()
            .with_issuer(Issuer::from_static(ISSUER))
            .with_not_before(NOW.before(60));
        let token = test::mint(&claims, &PRIVATE_KEY);

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::Inactive { expiration: None, .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        let token = Jwt::from_static("not-a-token");

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::Malformed(_)));
    }

    #[test]
    fn hmac_tokens_are_malformed() {
        // {"alg":"HS256","typ":"JWT"}.{"iss":"x"}.sig
        let token = Jwt::from_static("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJpc3MiOiJ4In0.c2ln");

        let err = verify_at(&token, NOW).unwrap_err();

        assert!(matches!(err, LocalVerifyError::Malformed(_)));
    }
}
