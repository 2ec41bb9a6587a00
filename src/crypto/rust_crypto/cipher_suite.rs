//! Cipher suite implementations using RustCrypto.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Key, Nonce};

use crate::crypto::provider::{Cipher, SupportedCipherSuite};
use crate::types::{CipherSuite, HashAlgorithm};

/// AES-128-GCM record cipher.
struct Aes128GcmCipher(Box<Aes128Gcm>);

impl std::fmt::Debug for Aes128GcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Aes128GcmCipher").finish()
    }
}

impl Aes128GcmCipher {
    fn new(key: &[u8]) -> Result<Self, String> {
        if key.len() != 16 {
            return Err(format!("Invalid key size for AES-128-GCM: {}", key.len()));
        }
        let key = Key::<Aes128Gcm>::from_slice(key);
        Ok(Aes128GcmCipher(Box::new(Aes128Gcm::new(key))))
    }

    fn check_nonce(nonce: &[u8]) -> Result<(), String> {
        if nonce.len() != 12 {
            return Err(format!(
                "Invalid nonce length: expected 12, got {}",
                nonce.len()
            ));
        }
        Ok(())
    }
}

impl Cipher for Aes128GcmCipher {
    fn encrypt(&mut self, plaintext: &[u8], aad: &[u8], nonce: &[u8]) -> Result<Vec<u8>, String> {
        Self::check_nonce(nonce)?;
        self.0
            .encrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|_| "AES-GCM encryption failed".to_string())
    }

    fn decrypt(&mut self, ciphertext: &[u8], aad: &[u8], nonce: &[u8]) -> Result<Vec<u8>, String> {
        Self::check_nonce(nonce)?;
        if ciphertext.len() < 16 {
            return Err(format!("Ciphertext too short: {}", ciphertext.len()));
        }
        self.0
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| "AES-GCM decryption failed".to_string())
    }
}

#[derive(Debug)]
struct EcdheEcdsaAes128GcmSha256;

impl SupportedCipherSuite for EcdheEcdsaAes128GcmSha256 {
    fn suite(&self) -> CipherSuite {
        CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::SHA256
    }

    fn key_lengths(&self) -> (usize, usize) {
        (16, 4)
    }

    fn create_cipher(&self, key: &[u8]) -> Result<Box<dyn Cipher>, String> {
        Ok(Box::new(Aes128GcmCipher::new(key)?))
    }
}

#[derive(Debug)]
struct EcdheRsaAes128GcmSha256;

impl SupportedCipherSuite for EcdheRsaAes128GcmSha256 {
    fn suite(&self) -> CipherSuite {
        CipherSuite::ECDHE_RSA_AES128_GCM_SHA256
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::SHA256
    }

    fn key_lengths(&self) -> (usize, usize) {
        (16, 4)
    }

    fn create_cipher(&self, key: &[u8]) -> Result<Box<dyn Cipher>, String> {
        Ok(Box::new(Aes128GcmCipher::new(key)?))
    }
}

static ECDHE_ECDSA_AES128: EcdheEcdsaAes128GcmSha256 = EcdheEcdsaAes128GcmSha256;
static ECDHE_RSA_AES128: EcdheRsaAes128GcmSha256 = EcdheRsaAes128GcmSha256;

pub(super) static ALL_CIPHER_SUITES: &[&dyn SupportedCipherSuite] =
    &[&ECDHE_ECDSA_AES128, &ECDHE_RSA_AES128];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt() {
        let mut enc = Aes128GcmCipher::new(&[1; 16]).unwrap();
        let mut dec = Aes128GcmCipher::new(&[1; 16]).unwrap();

        let nonce = [2u8; 12];
        let aad = [3u8; 13];
        let ciphertext = enc.encrypt(b"hello records", &aad, &nonce).unwrap();
        assert_eq!(ciphertext.len(), 13 + 16);

        let plaintext = dec.decrypt(&ciphertext, &aad, &nonce).unwrap();
        assert_eq!(plaintext, b"hello records");
    }

    #[test]
    fn tampered_tag_fails() {
        let mut enc = Aes128GcmCipher::new(&[1; 16]).unwrap();
        let mut dec = Aes128GcmCipher::new(&[1; 16]).unwrap();

        let nonce = [2u8; 12];
        let mut ciphertext = enc.encrypt(b"data", &[], &nonce).unwrap();
        *ciphertext.last_mut().unwrap() ^= 1;
        assert!(dec.decrypt(&ciphertext, &[], &nonce).is_err());
    }
}
