//! OpenID Connect access-token validation for relying parties
//!
//! A relying party receives access tokens in `Authorization: Bearer …`
//! headers and must decide whether to honor them. This crate offers two
//! ways to decide:
//!
//! * **local** validation checks an RSA signature against the identity
//!   provider's published key, then the token's issuer and lifetime, without
//!   any network traffic per request;
//! * **introspection** asks the provider's [RFC7662][] endpoint, which also
//!   catches tokens revoked before they expire.
//!
//! Either way, failures come back as a [`ValidationError`] that separates a
//! bad token from a provider that could not be reached.
//!
//! [RFC7662]: https://tools.ietf.org/html/rfc7662
//!
//! # Example
//!
//! ```no_run
//! use tokengate_oidc::{
//!     config::{RelyingParty, RelyingPartyConfig, ValidationMode},
//!     credentials::{ClientId, ClientSecret},
//!     Url,
//! };
//!
//! # async fn run(header: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = RelyingPartyConfig::new(
//!     Url::parse("https://idp.example/realms/demo")?,
//!     ClientId::from_static("relying-party"),
//!     ClientSecret::new(std::env::var("CLIENT_SECRET")?),
//! );
//!
//! let rp = RelyingParty::connect(config).await?;
//!
//! match rp.validate(header, ValidationMode::Local).await {
//!     Ok(claims) => println!("hello, {}", claims["sub"]),
//!     Err(err) if err.is_connectivity() => eprintln!("provider unavailable: {err}"),
//!     Err(err) => eprintln!("rejected: {err}"),
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_copy_implementations,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod bearer;
pub mod config;
pub mod credentials;
pub mod http;
pub mod introspection;
pub mod keys;
pub mod local;
pub mod metadata;
pub mod storage;
pub mod uri;
pub mod validator;


#[doc(inline)]
pub use config::{RelyingParty, RelyingPartyConfig};
#[doc(inline)]
pub use credentials::ClientCredentials;
#[doc(inline)]
pub use keys::SigningKey;
#[doc(inline)]
pub use metadata::ProviderMetadata;
#[doc(no_inline)]
pub use url::Url;
#[doc(inline)]
pub use validator::{ClaimMap, TokenValidator, ValidationError};
