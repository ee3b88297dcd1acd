#![allow(dead_code)]

pub mod rsa {
    pub const TEST_KEY_ID: &str = "EkKhyPqtd";
    pub const JWK: &str = include_str!("../data/rsa/jwk.json");
    pub const JWK_MINIMAL: &str = include_str!("../data/rsa/jwk-min.json");
    pub const JWKS: &str = include_str!("../data/rsa/jwks.json");

    pub const PUBLIC_KEY_PEM: &str = include_str!("../data/rsa/public.pem");
    pub const PUBLIC_KEY_X509_BASE64: &str = include_str!("../data/rsa/public-x509.b64");

    #[cfg(feature = "private-keys")]
    pub const PRIVATE_KEY_PEM: &str = include_str!("../data/rsa/private.pem");
    #[cfg(feature = "private-keys")]
    pub const OTHER_PRIVATE_KEY_PEM: &str = include_str!("../data/rsa/private-alt.pem");

    #[cfg(feature = "private-keys")]
    pub static PRIVATE_KEY: once_cell::sync::Lazy<crate::jwa::rsa::PrivateKey> =
        once_cell::sync::Lazy::new(|| {
            crate::jwa::rsa::PrivateKey::from_pem(PRIVATE_KEY_PEM).unwrap()
        });

    #[cfg(feature = "private-keys")]
    pub static OTHER_PRIVATE_KEY: once_cell::sync::Lazy<crate::jwa::rsa::PrivateKey> =
        once_cell::sync::Lazy::new(|| {
            crate::jwa::rsa::PrivateKey::from_pem(OTHER_PRIVATE_KEY_PEM).unwrap()
        });
}
