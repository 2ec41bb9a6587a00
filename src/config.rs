//! Client configuration.
//!
//! A [`Config`] is immutable once built and shared between connections via
//! `Arc`. The builder picks cipher suites, key exchange groups and the
//! [`CryptoProvider`] backing them.

use std::sync::Arc;

use crate::crypto::{rust_crypto, CryptoProvider};
use crate::error::Error;
use crate::types::{CipherSuite, NamedGroup};

const DEFAULT_CIPHER_SUITES: &[CipherSuite] = &[
    CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256,
    CipherSuite::ECDHE_RSA_AES128_GCM_SHA256,
];

const DEFAULT_KX_GROUPS: &[NamedGroup] = &[NamedGroup::X25519];

/// Shared client configuration.
#[derive(Debug)]
pub struct Config {
    cipher_suites: Vec<CipherSuite>,
    kx_groups: Vec<NamedGroup>,
    crypto_provider: CryptoProvider,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Defaults throughout: both AES-128-GCM suites, x25519, and the
    /// process default (or built-in) crypto provider.
    pub fn new() -> Result<Arc<Config>, Error> {
        Config::builder().build()
    }

    /// Offered cipher suites, in preference order.
    pub fn cipher_suites(&self) -> &[CipherSuite] {
        &self.cipher_suites
    }

    /// Offered key exchange groups, in preference order.
    pub fn kx_groups(&self) -> &[NamedGroup] {
        &self.kx_groups
    }

    pub fn crypto_provider(&self) -> &CryptoProvider {
        &self.crypto_provider
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    cipher_suites: Option<Vec<CipherSuite>>,
    kx_groups: Option<Vec<NamedGroup>>,
    crypto_provider: Option<CryptoProvider>,
}

impl ConfigBuilder {
    /// Replace the offered cipher suites.
    pub fn cipher_suites(mut self, suites: impl Into<Vec<CipherSuite>>) -> Self {
        self.cipher_suites = Some(suites.into());
        self
    }

    /// Replace the offered key exchange groups.
    pub fn kx_groups(mut self, groups: impl Into<Vec<NamedGroup>>) -> Self {
        self.kx_groups = Some(groups.into());
        self
    }

    /// Use a specific crypto provider instead of the process default.
    pub fn crypto_provider(mut self, provider: CryptoProvider) -> Self {
        self.crypto_provider = Some(provider);
        self
    }

    /// Validate and build the shared config.
    ///
    /// Every offered cipher suite and key exchange group must be backed by
    /// the provider, otherwise a later handshake could negotiate something
    /// it cannot key.
    pub fn build(self) -> Result<Arc<Config>, Error> {
        let crypto_provider = match self.crypto_provider {
            Some(provider) => provider,
            None => CryptoProvider::get_default()
                .cloned()
                .unwrap_or_else(rust_crypto::default_provider),
        };
        crypto_provider.validate().map_err(Error::ConfigError)?;

        let cipher_suites = self
            .cipher_suites
            .unwrap_or_else(|| DEFAULT_CIPHER_SUITES.to_vec());
        let kx_groups = self.kx_groups.unwrap_or_else(|| DEFAULT_KX_GROUPS.to_vec());

        if cipher_suites.is_empty() {
            return Err(Error::ConfigError("no cipher suites configured".into()));
        }
        if kx_groups.is_empty() {
            return Err(Error::ConfigError(
                "no key exchange groups configured".into(),
            ));
        }

        for suite in &cipher_suites {
            if crypto_provider.find_cipher_suite(*suite).is_none() {
                return Err(Error::ConfigError(format!(
                    "crypto provider does not support cipher suite {:?}",
                    suite
                )));
            }
        }
        for group in &kx_groups {
            if crypto_provider.find_kx_group(*group).is_none() {
                return Err(Error::ConfigError(format!(
                    "crypto provider does not support key exchange group {:?}",
                    group
                )));
            }
        }

        Ok(Arc::new(Config {
            cipher_suites,
            kx_groups,
            crypto_provider,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_build() {
        let config = Config::new().unwrap();
        assert_eq!(config.cipher_suites().len(), 2);
        assert_eq!(config.kx_groups(), &[NamedGroup::X25519]);
    }

    #[test]
    fn unsupported_suite_rejected() {
        let result = Config::builder()
            .cipher_suites(vec![CipherSuite::Unknown(0x1234)])
            .build();
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn empty_suites_rejected() {
        let result = Config::builder().cipher_suites(Vec::new()).build();
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
