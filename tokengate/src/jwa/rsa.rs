//! RSA key material
//!
//! Only public keys are needed to verify tokens. Private keys are available
//! behind the `private-keys` feature for minting tokens in tests and tools.

#[cfg(feature = "private-keys")]
mod private;
mod public;

#[cfg(feature = "private-keys")]
#[cfg_attr(docsrs, doc(cfg(feature = "private-keys")))]
pub use private::PrivateKey;
pub use public::PublicKey;

/// Smallest accepted modulus, in bytes (2048 bits)
pub const MIN_MODULUS_LEN: usize = 256;

/// Largest accepted modulus, in bytes (8192 bits)
pub const MAX_MODULUS_LEN: usize = 1024;
