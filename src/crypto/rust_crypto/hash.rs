//! Hash contexts using RustCrypto.

use sha2::{Digest, Sha256, Sha384};

use crate::crypto::provider::{HashContext, HashProvider};
use crate::types::HashAlgorithm;

#[derive(Debug, Clone)]
enum Inner {
    Sha256(Sha256),
    Sha384(Sha384),
}

#[derive(Debug, Clone)]
struct RustCryptoHash(Inner);

impl HashContext for RustCryptoHash {
    fn update(&mut self, data: &[u8]) {
        match &mut self.0 {
            Inner::Sha256(h) => h.update(data),
            Inner::Sha384(h) => h.update(data),
        }
    }

    fn clone_and_finalize(&self) -> Vec<u8> {
        match &self.0 {
            Inner::Sha256(h) => h.clone().finalize().to_vec(),
            Inner::Sha384(h) => h.clone().finalize().to_vec(),
        }
    }
}

#[derive(Debug)]
pub(super) struct RustCryptoHashProvider;

impl HashProvider for RustCryptoHashProvider {
    fn create_hash(&self, algorithm: HashAlgorithm) -> Box<dyn HashContext> {
        match algorithm {
            HashAlgorithm::SHA256 => Box::new(RustCryptoHash(Inner::Sha256(Sha256::new()))),
            HashAlgorithm::SHA384 => Box::new(RustCryptoHash(Inner::Sha384(Sha384::new()))),
        }
    }
}

pub(super) static HASH_PROVIDER: RustCryptoHashProvider = RustCryptoHashProvider;
