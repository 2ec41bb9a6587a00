//! Cryptographic provider for the TLS engine.
//!
//! The engine never implements a primitive itself. Everything cryptographic
//! goes through [`CryptoProvider`], a struct of static trait-object
//! components. The default backend in [`rust_crypto`] is built on crates
//! from the RustCrypto organization.

mod provider;
pub mod rust_crypto;

pub use provider::{
    ActiveKeyExchange, CertVerifier, Cipher, CryptoProvider, CryptoSafe, HashContext,
    HashProvider, PrfProvider, SecureRandom, SupportedCipherSuite, SupportedKxGroup,
};

/// AES-GCM authentication tag length.
pub const GCM_TAG_LEN: usize = 16;

/// RFC 5288 explicit nonce length, carried in front of each ciphertext.
pub const GCM_EXPLICIT_NONCE_LEN: usize = 8;

/// Fixed (implicit) IV length from the key block.
pub const GCM_FIXED_IV_LEN: usize = 4;
