//! TLS 1.2 PRF and secure randomness using RustCrypto and rand.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Sha256, Sha384};

use crate::crypto::provider::{PrfProvider, SecureRandom};
use crate::types::HashAlgorithm;

#[derive(Debug)]
pub(super) struct RustCryptoPrf;

impl PrfProvider for RustCryptoPrf {
    fn prf_tls12(
        &self,
        secret: &[u8],
        label: &str,
        seed: &[u8],
        output_len: usize,
        hash: HashAlgorithm,
    ) -> Result<Vec<u8>, String> {
        debug_assert!(label.is_ascii());

        let mut full_seed = Vec::with_capacity(label.len() + seed.len());
        full_seed.extend_from_slice(label.as_bytes());
        full_seed.extend_from_slice(seed);

        match hash {
            HashAlgorithm::SHA256 => p_hash_sha256(secret, &full_seed, output_len),
            HashAlgorithm::SHA384 => p_hash_sha384(secret, &full_seed, output_len),
        }
    }
}

// P_hash from RFC 5246 section 5:
//
// P_hash(secret, seed) = HMAC(secret, A(1) + seed) + HMAC(secret, A(2) + seed) + ...
// where A(0) = seed, A(i) = HMAC(secret, A(i-1)).
macro_rules! p_hash_impl {
    ($name:ident, $digest:ty) => {
        fn $name(secret: &[u8], full_seed: &[u8], output_len: usize) -> Result<Vec<u8>, String> {
            let hmac = |data: &[&[u8]]| -> Result<Vec<u8>, String> {
                let mut mac = Hmac::<$digest>::new_from_slice(secret)
                    .map_err(|_| "Invalid HMAC key length".to_string())?;
                for chunk in data {
                    mac.update(chunk);
                }
                Ok(mac.finalize().into_bytes().to_vec())
            };

            let mut out = Vec::with_capacity(output_len);

            // A(1)
            let mut a = hmac(&[full_seed])?;

            while out.len() < output_len {
                let output = hmac(&[&a, full_seed])?;

                let remaining = output_len - out.len();
                let to_copy = std::cmp::min(remaining, output.len());
                out.extend_from_slice(&output[..to_copy]);

                if out.len() < output_len {
                    a = hmac(&[&a])?;
                }
            }

            Ok(out)
        }
    };
}

p_hash_impl!(p_hash_sha256, Sha256);
p_hash_impl!(p_hash_sha384, Sha384);

#[derive(Debug)]
pub(super) struct RustCryptoRandom;

impl SecureRandom for RustCryptoRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), String> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| format!("OS random failed: {}", e))
    }
}

pub(super) static PRF_PROVIDER: RustCryptoPrf = RustCryptoPrf;
pub(super) static SECURE_RANDOM: RustCryptoRandom = RustCryptoRandom;
