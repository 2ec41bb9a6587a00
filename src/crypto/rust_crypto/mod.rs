//! RustCrypto-based default provider.
//!
//! Implements every capability in [`CryptoProvider`] with pure Rust crates:
//! aes-gcm for record protection, sha2/hmac for hashing and the PRF,
//! x25519-dalek for key exchange, p256/rsa + x509-cert for certificate
//! signature verification.

mod cipher_suite;
mod hash;
mod kx_group;
mod sign;
mod tls12;

use crate::crypto::provider::CryptoProvider;

/// The default RustCrypto-backed provider.
///
/// Supported cipher suites:
/// - `TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256` (0xC02B)
/// - `TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256` (0xC02F)
///
/// Supported key exchange group: x25519.
pub fn default_provider() -> CryptoProvider {
    CryptoProvider {
        cipher_suites: cipher_suite::ALL_CIPHER_SUITES,
        kx_groups: kx_group::ALL_KX_GROUPS,
        hash_provider: &hash::HASH_PROVIDER,
        prf_provider: &tls12::PRF_PROVIDER,
        secure_random: &tls12::SECURE_RANDOM,
        cert_verifier: &sign::CERT_VERIFIER,
    }
}
