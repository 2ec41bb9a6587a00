use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::sync::OnceLock;

use crate::types::{CipherSuite, HashAlgorithm, NamedGroup, SignatureScheme};

/// Marker trait for types usable as crypto provider components.
///
/// Components are shared as `&'static dyn` references, so they must be
/// thread-safe and panic-safe.
pub trait CryptoSafe: Send + Sync + Debug + UnwindSafe + RefUnwindSafe {}

impl<T: Send + Sync + Debug + UnwindSafe + RefUnwindSafe> CryptoSafe for T {}

/// AEAD cipher keyed for one direction of one connection.
pub trait Cipher: CryptoSafe {
    /// Encrypt and authenticate, returning ciphertext with the tag appended.
    fn encrypt(&mut self, plaintext: &[u8], aad: &[u8], nonce: &[u8]) -> Result<Vec<u8>, String>;

    /// Verify and decrypt ciphertext carrying a trailing tag.
    fn decrypt(&mut self, ciphertext: &[u8], aad: &[u8], nonce: &[u8]) -> Result<Vec<u8>, String>;
}

/// Cipher suite support (factory for [`Cipher`] instances).
pub trait SupportedCipherSuite: CryptoSafe {
    /// The cipher suite this supports.
    fn suite(&self) -> CipherSuite;

    /// Hash algorithm for the transcript and PRF under this suite.
    fn hash_algorithm(&self) -> HashAlgorithm;

    /// Key material lengths: (enc_key_len, fixed_iv_len).
    fn key_lengths(&self) -> (usize, usize);

    /// Create a cipher keyed with `key`.
    fn create_cipher(&self, key: &[u8]) -> Result<Box<dyn Cipher>, String>;
}

/// Ephemeral key exchange for one handshake.
pub trait ActiveKeyExchange: CryptoSafe {
    /// Our public key, ready for the ClientKeyExchange message.
    fn pub_key(&self) -> &[u8];

    /// Complete the exchange with the peer's public key, returning the
    /// shared secret. Consumes the ephemeral private key.
    fn complete(self: Box<Self>, peer_pub: &[u8]) -> Result<Vec<u8>, String>;

    fn group(&self) -> NamedGroup;
}

/// Key exchange group support (factory for [`ActiveKeyExchange`]).
pub trait SupportedKxGroup: CryptoSafe {
    fn name(&self) -> NamedGroup;

    /// Generate a fresh ephemeral keypair.
    fn start_exchange(&self) -> Result<Box<dyn ActiveKeyExchange>, String>;
}

/// Incremental hash, used for the handshake transcript.
pub trait HashContext: CryptoSafe {
    fn update(&mut self, data: &[u8]);

    /// Finalize a copy of the running state. The original context keeps
    /// accumulating.
    fn clone_and_finalize(&self) -> Vec<u8>;
}

/// Hash factory.
pub trait HashProvider: CryptoSafe {
    fn create_hash(&self, algorithm: HashAlgorithm) -> Box<dyn HashContext>;
}

/// TLS 1.2 PRF (RFC 5246 section 5) for all key derivation.
pub trait PrfProvider: CryptoSafe {
    /// PRF(secret, label, seed) producing `output_len` bytes.
    ///
    /// `seed` is the seed data without the label; the label is prepended
    /// internally.
    fn prf_tls12(
        &self,
        secret: &[u8],
        label: &str,
        seed: &[u8],
        output_len: usize,
        hash: HashAlgorithm,
    ) -> Result<Vec<u8>, String>;
}

/// Cryptographically secure RNG.
pub trait SecureRandom: CryptoSafe {
    fn fill(&self, buf: &mut [u8]) -> Result<(), String>;
}

/// Certificate inspection and signature verification.
///
/// Chain trust policy is deliberately the verifier's business: the engine
/// only acts on the match/no-match and valid/invalid answers.
pub trait CertVerifier: CryptoSafe {
    /// Inspect the presented chain (leaf first).
    fn verify_chain(&self, chain: &[&[u8]]) -> Result<(), String>;

    /// Whether the leaf certificate covers `server_name`.
    fn matches_name(&self, leaf: &[u8], server_name: &str) -> Result<bool, String>;

    /// Verify a signature made with the leaf's public key over `message`.
    fn verify_signature(
        &self,
        leaf: &[u8],
        scheme: SignatureScheme,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), String>;
}

/// Cryptographic provider for TLS client connections.
///
/// Holds static references to each cryptographic capability. Custom
/// backends replace individual components or the whole provider via
/// [`Config::builder()`](crate::Config::builder).
#[derive(Debug, Clone)]
pub struct CryptoProvider {
    /// Supported cipher suites, in preference order.
    pub cipher_suites: &'static [&'static dyn SupportedCipherSuite],

    /// Supported ECDHE groups, in preference order.
    pub kx_groups: &'static [&'static dyn SupportedKxGroup],

    /// Hash factory for transcript hashing.
    pub hash_provider: &'static dyn HashProvider,

    /// TLS 1.2 PRF for the key schedule and Finished computation.
    pub prf_provider: &'static dyn PrfProvider,

    /// Secure random for hello randoms.
    pub secure_random: &'static dyn SecureRandom,

    /// Certificate inspection and signature verification.
    pub cert_verifier: &'static dyn CertVerifier,
}

static DEFAULT: OnceLock<CryptoProvider> = OnceLock::new();

impl CryptoProvider {
    /// Install a process-wide default provider.
    ///
    /// # Panics
    ///
    /// Panics if called more than once.
    pub fn install_default(provider: CryptoProvider) {
        DEFAULT
            .set(provider)
            .expect("CryptoProvider::install_default() called more than once");
    }

    /// The installed default provider, if any.
    pub fn get_default() -> Option<&'static CryptoProvider> {
        DEFAULT.get()
    }

    /// Find the component supporting `suite`.
    pub fn find_cipher_suite(&self, suite: CipherSuite) -> Option<&'static dyn SupportedCipherSuite> {
        self.cipher_suites.iter().copied().find(|c| c.suite() == suite)
    }

    /// Find the component supporting `group`.
    pub fn find_kx_group(&self, group: NamedGroup) -> Option<&'static dyn SupportedKxGroup> {
        self.kx_groups.iter().copied().find(|g| g.name() == group)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.cipher_suites.is_empty() {
            return Err("provider has no cipher suites".into());
        }
        if self.kx_groups.is_empty() {
            return Err("provider has no key exchange groups".into());
        }
        Ok(())
    }
}
