//! ECDHE key exchange groups using x25519-dalek.

use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey};

use crate::crypto::provider::{ActiveKeyExchange, SupportedKxGroup};
use crate::types::NamedGroup;

struct X25519Exchange {
    secret: EphemeralSecret,
    pub_key: [u8; 32],
}

impl std::fmt::Debug for X25519Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X25519Exchange")
            .field("pub_key", &self.pub_key)
            .finish()
    }
}

impl ActiveKeyExchange for X25519Exchange {
    fn pub_key(&self) -> &[u8] {
        &self.pub_key
    }

    fn complete(self: Box<Self>, peer_pub: &[u8]) -> Result<Vec<u8>, String> {
        let peer: [u8; 32] = peer_pub
            .try_into()
            .map_err(|_| format!("Invalid x25519 public key length: {}", peer_pub.len()))?;

        let shared = self.secret.diffie_hellman(&PublicKey::from(peer));

        // An all-zero shared secret means a low-order peer point.
        if shared.as_bytes().iter().all(|b| *b == 0) {
            return Err("x25519 produced an all-zero shared secret".into());
        }

        Ok(shared.as_bytes().to_vec())
    }

    fn group(&self) -> NamedGroup {
        NamedGroup::X25519
    }
}

#[derive(Debug)]
struct X25519Group;

impl SupportedKxGroup for X25519Group {
    fn name(&self) -> NamedGroup {
        NamedGroup::X25519
    }

    fn start_exchange(&self) -> Result<Box<dyn ActiveKeyExchange>, String> {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let pub_key = *PublicKey::from(&secret).as_bytes();
        Ok(Box::new(X25519Exchange { secret, pub_key }))
    }
}

static X25519: X25519Group = X25519Group;

pub(super) static ALL_KX_GROUPS: &[&dyn SupportedKxGroup] = &[&X25519];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sides_agree() {
        let a = X25519.start_exchange().unwrap();
        let b = X25519.start_exchange().unwrap();

        let a_pub = a.pub_key().to_vec();
        let b_pub = b.pub_key().to_vec();

        let shared_a = a.complete(&b_pub).unwrap();
        let shared_b = b.complete(&a_pub).unwrap();
        assert_eq!(shared_a, shared_b);
        assert_eq!(shared_a.len(), 32);
    }

    #[test]
    fn bad_peer_key_length() {
        let a = X25519.start_exchange().unwrap();
        assert!(a.complete(&[0u8; 16]).is_err());
    }
}
