//! Record layer state: buffering, sequence numbers and AES-GCM record
//! protection (RFC 5288).
//!
//! The engine does no I/O. Raw transport bytes go in through
//! [`Engine::handle_input`], complete plaintext records come out of
//! [`Engine::poll_record`], and framed bytes for the transport come out of
//! [`Engine::poll_output`].

use std::collections::VecDeque;

use log::trace;
use zeroize::Zeroizing;

use crate::crypto::{Cipher, GCM_EXPLICIT_NONCE_LEN, GCM_FIXED_IV_LEN, GCM_TAG_LEN};
use crate::record::{Decoded, Record, MAX_PLAINTEXT};
use crate::types::{ContentType, ProtocolVersion};
use crate::Error;

/// Write keys for one direction, produced by the key schedule.
pub(crate) struct DirectionKeys {
    pub cipher: Box<dyn Cipher>,
    pub fixed_iv: Zeroizing<[u8; GCM_FIXED_IV_LEN]>,
}

struct Protection {
    keys: DirectionKeys,
    /// Record sequence number, reset when the keys are installed.
    sequence: u64,
}

/// One decrypted record, owned because decryption copies out of the
/// transport buffer.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct PlainRecord {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub payload: Vec<u8>,
}

pub(crate) struct Engine {
    /// Raw bytes from the transport, not yet decoded.
    buffer_rx: Vec<u8>,

    /// Framed records waiting for the transport.
    queue_tx: VecDeque<Vec<u8>>,

    /// Record protection, armed per direction by ChangeCipherSpec.
    protect_tx: Option<Protection>,
    protect_rx: Option<Protection>,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            buffer_rx: Vec::new(),
            queue_tx: VecDeque::new(),
            protect_tx: None,
            protect_rx: None,
        }
    }

    /// Append raw transport bytes for decoding.
    pub fn handle_input(&mut self, data: &[u8]) {
        self.buffer_rx.extend_from_slice(data);
    }

    /// Whether a complete record is buffered and decodable.
    pub fn has_complete_record(&self) -> bool {
        matches!(
            Record::decode(&self.buffer_rx),
            Ok(Decoded::Complete { .. })
        )
    }

    /// Decode (and decrypt, once armed) the next record.
    ///
    /// Returns `None` when the buffer holds less than one record.
    pub fn poll_record(&mut self) -> Result<Option<PlainRecord>, Error> {
        let (content_type, version, payload, consumed) = match Record::decode(&self.buffer_rx)? {
            Decoded::NeedMoreBytes => return Ok(None),
            Decoded::Complete { record, consumed } => (
                record.content_type,
                record.version,
                record.payload.to_vec(),
                consumed,
            ),
        };
        self.buffer_rx.drain(..consumed);

        trace!("RX record {} len={}", content_type, payload.len());

        // ChangeCipherSpec is never protected in TLS 1.2.
        let payload = match &mut self.protect_rx {
            Some(protection) if content_type != ContentType::ChangeCipherSpec => {
                decrypt_payload(protection, content_type, version, &payload)?
            }
            _ => payload,
        };

        Ok(Some(PlainRecord {
            content_type,
            version,
            payload,
        }))
    }

    /// Frame (and encrypt, once armed) a record and queue it for the
    /// transport.
    pub fn send_record(&mut self, content_type: ContentType, payload: &[u8]) -> Result<(), Error> {
        if payload.len() > MAX_PLAINTEXT {
            return Err(Error::Malformed("plaintext fragment exceeds limit"));
        }

        let version = ProtocolVersion::TLS1_2;

        trace!("TX record {} len={}", content_type, payload.len());

        let framed = match &mut self.protect_tx {
            Some(protection) if content_type != ContentType::ChangeCipherSpec => {
                let protected = encrypt_payload(protection, content_type, version, payload)?;
                let mut out = Vec::with_capacity(5 + protected.len());
                Record {
                    content_type,
                    version,
                    payload: &protected,
                }
                .serialize(&mut out);
                out
            }
            _ => {
                let mut out = Vec::with_capacity(5 + payload.len());
                Record {
                    content_type,
                    version,
                    payload,
                }
                .serialize(&mut out);
                out
            }
        };

        self.queue_tx.push_back(framed);
        Ok(())
    }

    /// Next framed record for the transport.
    pub fn poll_output(&mut self) -> Option<Vec<u8>> {
        self.queue_tx.pop_front()
    }

    /// Arm record protection for the send direction. Resets the sequence.
    pub fn enable_protection_tx(&mut self, keys: DirectionKeys) {
        self.protect_tx = Some(Protection { keys, sequence: 0 });
    }

    /// Arm record protection for the receive direction. Resets the sequence.
    pub fn enable_protection_rx(&mut self, keys: DirectionKeys) {
        self.protect_rx = Some(Protection { keys, sequence: 0 });
    }

    pub fn is_protected_rx(&self) -> bool {
        self.protect_rx.is_some()
    }
}

/// AAD per RFC 5246 6.2.3.3: seq(8) || type(1) || version(2) || length(2),
/// with length being the plaintext length.
fn make_aad(
    sequence: u64,
    content_type: ContentType,
    version: ProtocolVersion,
    plaintext_len: usize,
) -> [u8; 13] {
    let mut aad = [0u8; 13];
    aad[..8].copy_from_slice(&sequence.to_be_bytes());
    aad[8] = content_type.as_u8();
    aad[9..11].copy_from_slice(&version.as_u16().to_be_bytes());
    aad[11..13].copy_from_slice(&(plaintext_len as u16).to_be_bytes());
    aad
}

/// Nonce per RFC 5288: fixed_iv(4) || explicit(8). The explicit part is the
/// record sequence number, carried in front of the ciphertext.
fn make_nonce(fixed_iv: &[u8; GCM_FIXED_IV_LEN], explicit: &[u8]) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[..GCM_FIXED_IV_LEN].copy_from_slice(fixed_iv);
    nonce[GCM_FIXED_IV_LEN..].copy_from_slice(explicit);
    nonce
}

fn encrypt_payload(
    protection: &mut Protection,
    content_type: ContentType,
    version: ProtocolVersion,
    plaintext: &[u8],
) -> Result<Vec<u8>, Error> {
    let explicit = protection.sequence.to_be_bytes();
    let nonce = make_nonce(&protection.keys.fixed_iv, &explicit);
    let aad = make_aad(protection.sequence, content_type, version, plaintext.len());

    let ciphertext = protection
        .keys
        .cipher
        .encrypt(plaintext, &aad, &nonce)
        .map_err(Error::CryptoError)?;

    protection.sequence = protection
        .sequence
        .checked_add(1)
        .ok_or(Error::Malformed("sequence number overflow"))?;

    let mut out = Vec::with_capacity(GCM_EXPLICIT_NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&explicit);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn decrypt_payload(
    protection: &mut Protection,
    content_type: ContentType,
    version: ProtocolVersion,
    payload: &[u8],
) -> Result<Vec<u8>, Error> {
    if payload.len() < GCM_EXPLICIT_NONCE_LEN + GCM_TAG_LEN {
        return Err(Error::Truncated);
    }

    let (explicit, ciphertext) = payload.split_at(GCM_EXPLICIT_NONCE_LEN);
    let nonce = make_nonce(&protection.keys.fixed_iv, explicit);
    let plaintext_len = ciphertext.len() - GCM_TAG_LEN;
    let aad = make_aad(protection.sequence, content_type, version, plaintext_len);

    let plaintext = protection
        .keys
        .cipher
        .decrypt(ciphertext, &aad, &nonce)
        .map_err(Error::CryptoError)?;

    protection.sequence = protection
        .sequence
        .checked_add(1)
        .ok_or(Error::Malformed("sequence number overflow"))?;

    Ok(plaintext)
}
