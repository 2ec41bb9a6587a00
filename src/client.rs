// TLS 1.2 client handshake flow (RFC 5246):
//
// 1. Client sends ClientHello (plaintext)
// 2. Server sends ServerHello, Certificate, ServerKeyExchange,
//    ServerHelloDone (plaintext)
//    - Client checks the selected cipher suite against its configured set
//    - Client checks the leaf certificate against the requested server name
//    - Client verifies the ServerKeyExchange signature
// 3. Client sends ClientKeyExchange, ChangeCipherSpec, Finished
//    - Key schedule: ECDHE shared secret -> master secret -> key block
//    - Client record protection armed before Finished
// 4. Server sends ChangeCipherSpec, Finished
//    - Client verifies the server verify_data against the transcript
// 5. Handshake complete, application data flows both ways
//
// This is a Sans-IO TLS 1.2 client: the owner of the transport feeds bytes
// in via `advance` and drains bytes to send via `poll_transmit`.

use std::sync::Arc;

use log::{debug, trace};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::config::Config;
use crate::crypto::{ActiveKeyExchange, HashContext, SupportedCipherSuite, GCM_FIXED_IV_LEN};
use crate::engine::{DirectionKeys, Engine, PlainRecord};
use crate::error::{Error, FailReason};
use crate::message::{
    serialize_message, Certificate, ClientHello, Finished, Header, Random, ServerHello,
    ServerKeyExchange, HEADER_LEN as MSG_HEADER_LEN, VERIFY_DATA_LEN,
};
use crate::record::MAX_PLAINTEXT;
use crate::types::{
    CipherSuite, CompressionMethod, ContentType, HashAlgorithm, MessageType, NamedGroup,
    ProtocolVersion, SignatureScheme,
};

/// Alert level/description values we produce or act on.
const ALERT_LEVEL_FATAL: u8 = 2;
const ALERT_CLOSE_NOTIFY: u8 = 0;
const ALERT_UNEXPECTED_MESSAGE: u8 = 10;
const ALERT_HANDSHAKE_FAILURE: u8 = 40;
const ALERT_BAD_CERTIFICATE: u8 = 42;
const ALERT_DECRYPT_ERROR: u8 = 51;

/// Client handshake state.
///
/// Transitions only move forward or to `Failed`. `Established` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Start,
    SentClientHello,
    ReceivedServerHello,
    KeyExchangeDone,
    Established,
    Failed(FailReason),
}

impl HandshakeState {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            HandshakeState::Start => "Start",
            HandshakeState::SentClientHello => "SentClientHello",
            HandshakeState::ReceivedServerHello => "ReceivedServerHello",
            HandshakeState::KeyExchangeDone => "KeyExchangeDone",
            HandshakeState::Established => "Established",
            HandshakeState::Failed(_) => "Failed",
        }
    }
}

/// Sans-IO TLS 1.2 client.
pub struct Client {
    config: Arc<Config>,
    server_name: String,

    state: HandshakeState,
    /// The state in which a failure happened, for error context.
    failed_in: Option<&'static str>,

    engine: Engine,

    /// Running hash over every handshake message, both directions, in
    /// transmission order. All supported suites hash with SHA-256.
    transcript: Box<dyn HashContext>,

    client_random: Random,
    server_random: Option<Random>,

    /// Negotiated suite component, set by ServerHello.
    suite: Option<&'static dyn SupportedCipherSuite>,

    /// Server certificates, leaf first.
    server_certificates: Vec<Vec<u8>>,

    /// ECDHE peer public key and group from ServerKeyExchange.
    peer_kx: Option<(NamedGroup, Vec<u8>)>,

    master_secret: Option<Zeroizing<Vec<u8>>>,

    /// Server write keys, armed when the peer ChangeCipherSpec arrives.
    pending_rx_keys: Option<DirectionKeys>,
    peer_ccs_seen: bool,

    /// Plaintext handshake bytes awaiting a complete message.
    hs_buffer: Vec<u8>,

    /// Decrypted application data not yet read by the caller.
    app_rx: Vec<u8>,

    /// Peer sent close_notify.
    peer_closed: bool,
}

impl Client {
    pub fn new(config: Arc<Config>, server_name: &str) -> Result<Client, Error> {
        let provider = config.crypto_provider();

        let mut random = [0u8; 32];
        provider
            .secure_random
            .fill(&mut random)
            .map_err(Error::CryptoError)?;

        let transcript = provider.hash_provider.create_hash(HashAlgorithm::SHA256);

        Ok(Client {
            config,
            server_name: server_name.to_string(),
            state: HandshakeState::Start,
            failed_in: None,
            engine: Engine::new(),
            transcript,
            client_random: Random(random),
            server_random: None,
            suite: None,
            server_certificates: Vec::with_capacity(3),
            peer_kx: None,
            master_secret: None,
            pending_rx_keys: None,
            peer_ccs_seen: false,
            hs_buffer: Vec::new(),
            app_rx: Vec::new(),
            peer_closed: false,
        })
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_established(&self) -> bool {
        self.state == HandshakeState::Established
    }

    /// The terminal failure as an error, if the handshake failed.
    pub fn handshake_error(&self) -> Option<Error> {
        match self.state {
            HandshakeState::Failed(reason) => Some(Error::HandshakeFailed {
                stage: self.failed_in.unwrap_or("Start"),
                reason,
            }),
            _ => None,
        }
    }

    /// Drive the state machine.
    ///
    /// Consumes at most one logical handshake message per call. `incoming`
    /// carries new transport bytes, `None` processes already-buffered
    /// input. Returns the state after the step; when nothing could be done
    /// the state is unchanged and the caller supplies more bytes.
    pub fn advance(&mut self, incoming: Option<&[u8]>) -> Result<HandshakeState, Error> {
        if let Some(data) = incoming {
            self.engine.handle_input(data);
        }

        if self.state == HandshakeState::Start {
            self.send_client_hello()?;
            return Ok(self.state);
        }

        if matches!(self.state, HandshakeState::Failed(_)) {
            return Ok(self.state);
        }

        self.process_one()?;
        Ok(self.state)
    }

    /// Whether buffered input can still make progress without new bytes.
    pub fn can_make_progress(&self) -> bool {
        if matches!(
            self.state,
            HandshakeState::Failed(_) | HandshakeState::Start
        ) {
            return false;
        }
        self.buffered_message_len().is_some() || self.engine.has_complete_record()
    }

    /// Next framed record for the transport.
    pub fn poll_transmit(&mut self) -> Option<Vec<u8>> {
        self.engine.poll_output()
    }

    /// Encrypt and queue application data. Fails with `NotEstablished`
    /// before the handshake completes. Returns the byte count accepted.
    pub fn send_application_data(&mut self, data: &[u8]) -> Result<usize, Error> {
        if !self.is_established() {
            return Err(Error::NotEstablished);
        }
        if self.peer_closed {
            return Err(Error::TransportClosed);
        }
        for chunk in data.chunks(MAX_PLAINTEXT) {
            self.engine.send_record(ContentType::ApplicationData, chunk)?;
        }
        Ok(data.len())
    }

    /// Copy decrypted application data into `buf`. `Ok(0)` means no data
    /// is buffered right now.
    pub fn read_application_data(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if !self.is_established() {
            return Err(Error::NotEstablished);
        }
        if self.app_rx.is_empty() {
            if self.peer_closed {
                return Err(Error::TransportClosed);
            }
            return Ok(0);
        }
        let n = std::cmp::min(buf.len(), self.app_rx.len());
        buf[..n].copy_from_slice(&self.app_rx[..n]);
        self.app_rx.drain(..n);
        Ok(n)
    }

    /// Queue a close_notify alert.
    pub fn queue_close_notify(&mut self) -> Result<(), Error> {
        self.engine
            .send_record(ContentType::Alert, &[1, ALERT_CLOSE_NOTIFY])
    }

    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    fn send_client_hello(&mut self) -> Result<(), Error> {
        let mut extension_data = Vec::new();
        let hello = ClientHello::new(
            self.client_random,
            self.config.cipher_suites().iter().copied(),
        )
        .with_extensions(
            &mut extension_data,
            &self.server_name,
            self.config.kx_groups(),
            &[
                SignatureScheme::EcdsaSecp256r1Sha256,
                SignatureScheme::RsaPkcs1Sha256,
            ],
        );

        let mut message = Vec::new();
        serialize_message(MessageType::ClientHello, &mut message, |body| {
            hello.serialize(body)
        });

        self.transcript.update(&message);
        self.engine.send_record(ContentType::Handshake, &message)?;

        debug!("Sent ClientHello for {}", self.server_name);
        self.state = HandshakeState::SentClientHello;
        Ok(())
    }

    /// Handle one buffered handshake message, or failing that, pull one
    /// record from the engine.
    fn process_one(&mut self) -> Result<(), Error> {
        if self.buffered_message_len().is_some() {
            return self.process_buffered_message();
        }

        let record = match self.engine.poll_record()? {
            Some(record) => record,
            None => return Ok(()),
        };

        match record.content_type {
            ContentType::Handshake => {
                self.hs_buffer.extend_from_slice(&record.payload);
                if self.buffered_message_len().is_some() {
                    self.process_buffered_message()?;
                }
                Ok(())
            }
            ContentType::ChangeCipherSpec => self.handle_change_cipher_spec(&record),
            ContentType::Alert => self.handle_alert(&record),
            ContentType::ApplicationData => {
                if !self.is_established() {
                    self.fail(FailReason::ProtocolViolation(
                        "application data before handshake completed",
                    ))
                } else {
                    self.app_rx.extend_from_slice(&record.payload);
                    Ok(())
                }
            }
            ContentType::Unknown(_) => Err(Error::Malformed("unknown record content type")),
        }
    }

    /// Length of the first complete handshake message in the buffer,
    /// header included.
    fn buffered_message_len(&self) -> Option<usize> {
        if self.hs_buffer.len() < MSG_HEADER_LEN {
            return None;
        }
        let (_, header) = Header::parse(&self.hs_buffer).ok()?;
        let total = MSG_HEADER_LEN + header.length as usize;
        (self.hs_buffer.len() >= total).then_some(total)
    }

    fn process_buffered_message(&mut self) -> Result<(), Error> {
        // buffered_message_len is checked by the caller.
        let total = self
            .buffered_message_len()
            .ok_or(Error::Malformed("incomplete handshake message"))?;
        let message: Vec<u8> = self.hs_buffer.drain(..total).collect();

        let (_, header) =
            Header::parse(&message).map_err(|_| Error::Malformed("bad handshake header"))?;
        let body = &message[MSG_HEADER_LEN..];

        trace!("Handshake message {} in {}", header.msg_type, self.state.name());

        match (self.state, header.msg_type) {
            (HandshakeState::SentClientHello, MessageType::ServerHello) => {
                self.handle_server_hello(&message, body)
            }
            (HandshakeState::ReceivedServerHello, MessageType::Certificate) => {
                self.handle_certificate(&message, body)
            }
            (HandshakeState::ReceivedServerHello, MessageType::ServerKeyExchange) => {
                self.handle_server_key_exchange(&message, body)
            }
            (HandshakeState::ReceivedServerHello, MessageType::ServerHelloDone) => {
                self.handle_server_hello_done(&message, body)
            }
            (HandshakeState::KeyExchangeDone, MessageType::Finished) => {
                self.handle_finished(&message, body)
            }
            // Post-handshake HelloRequest would start renegotiation, which
            // this engine does not do. Ignored per RFC 5246 7.4.1.1.
            (HandshakeState::Established, MessageType::Unknown(0)) => Ok(()),
            (_, msg_type) => {
                debug!("Unexpected {} in {}", msg_type, self.state.name());
                self.fail(FailReason::ProtocolViolation("unexpected handshake message"))
            }
        }
    }

    fn handle_server_hello(&mut self, message: &[u8], body: &[u8]) -> Result<(), Error> {
        self.transcript.update(message);

        let (_, hello) =
            ServerHello::parse(body).map_err(|_| Error::Malformed("bad ServerHello"))?;

        if hello.server_version != ProtocolVersion::TLS1_2 {
            return self.fail(FailReason::ProtocolViolation("server version is not TLS 1.2"));
        }
        if hello.compression_method != CompressionMethod::Null {
            return self.fail(FailReason::ProtocolViolation("compression negotiated"));
        }

        if !self.config.cipher_suites().contains(&hello.cipher_suite) {
            return self.fail(FailReason::UnsupportedCipher(hello.cipher_suite.as_u16()));
        }

        // Config validation guarantees every configured suite is covered.
        let suite = self
            .config
            .crypto_provider()
            .find_cipher_suite(hello.cipher_suite)
            .ok_or_else(|| Error::CryptoError("provider lost cipher suite".into()))?;

        debug!("Negotiated cipher suite {:?}", hello.cipher_suite);

        self.server_random = Some(hello.random);
        self.suite = Some(suite);
        self.state = HandshakeState::ReceivedServerHello;
        Ok(())
    }

    fn handle_certificate(&mut self, message: &[u8], body: &[u8]) -> Result<(), Error> {
        self.transcript.update(message);

        let (_, certificate) =
            Certificate::parse(body).map_err(|_| Error::Malformed("bad Certificate"))?;

        let verifier = self.config.crypto_provider().cert_verifier;
        let chain: Vec<&[u8]> = certificate.certificates.iter().map(|c| c.0).collect();

        if verifier.verify_chain(&chain).is_err() {
            return self.fail(FailReason::BadCertificate);
        }

        // The leaf exists, verify_chain rejects an empty list.
        let leaf = chain[0];
        match verifier.matches_name(leaf, &self.server_name) {
            Ok(true) => {}
            Ok(false) => {
                debug!(
                    "Certificate does not cover requested name {}",
                    self.server_name
                );
                return self.fail(FailReason::HostnameMismatch);
            }
            Err(_) => return self.fail(FailReason::BadCertificate),
        }

        self.server_certificates = chain.iter().map(|c| c.to_vec()).collect();
        Ok(())
    }

    fn handle_server_key_exchange(&mut self, message: &[u8], body: &[u8]) -> Result<(), Error> {
        self.transcript.update(message);

        if self.server_certificates.is_empty() {
            return self.fail(FailReason::ProtocolViolation(
                "ServerKeyExchange before Certificate",
            ));
        }

        let (_, ske) =
            ServerKeyExchange::parse(body).map_err(|_| Error::Malformed("bad ServerKeyExchange"))?;

        if !self.config.kx_groups().contains(&ske.params.named_group) {
            return self.fail(FailReason::ProtocolViolation("unsupported key exchange group"));
        }

        // The signature scheme must match the authentication part of the
        // negotiated suite.
        let suite = self.negotiated_suite()?;
        let scheme_ok = match suite.suite() {
            CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256 => {
                ske.signed.scheme == SignatureScheme::EcdsaSecp256r1Sha256
            }
            CipherSuite::ECDHE_RSA_AES128_GCM_SHA256 => {
                ske.signed.scheme == SignatureScheme::RsaPkcs1Sha256
            }
            CipherSuite::Unknown(_) => false,
        };
        if !scheme_ok {
            return self.fail(FailReason::ProtocolViolation(
                "signature scheme does not match suite",
            ));
        }

        // signed_params = client_random + server_random + params (RFC 5246
        // 7.4.3).
        let server_random = self.server_random.ok_or(Error::NotEstablished)?;
        let mut signed_data = Vec::with_capacity(64 + ske.params_raw.len());
        signed_data.extend_from_slice(&self.client_random.0);
        signed_data.extend_from_slice(&server_random.0);
        signed_data.extend_from_slice(ske.params_raw);

        let verifier = self.config.crypto_provider().cert_verifier;
        if verifier
            .verify_signature(
                &self.server_certificates[0],
                ske.signed.scheme,
                &signed_data,
                ske.signed.signature,
            )
            .is_err()
        {
            return self.fail(FailReason::BadSignature);
        }

        self.peer_kx = Some((ske.params.named_group, ske.params.public.to_vec()));
        Ok(())
    }

    fn handle_server_hello_done(&mut self, message: &[u8], body: &[u8]) -> Result<(), Error> {
        self.transcript.update(message);

        if !body.is_empty() {
            return Err(Error::Malformed("ServerHelloDone with a body"));
        }
        let (group, peer_public) = match self.peer_kx.take() {
            Some(kx) => kx,
            None => {
                return self.fail(FailReason::ProtocolViolation(
                    "ServerHelloDone before ServerKeyExchange",
                ))
            }
        };

        let provider = self.config.crypto_provider();
        let kx_group = provider
            .find_kx_group(group)
            .ok_or_else(|| Error::CryptoError("provider lost key exchange group".into()))?;
        let kx: Box<dyn ActiveKeyExchange> =
            kx_group.start_exchange().map_err(Error::CryptoError)?;

        // ClientKeyExchange: u8 length-prefixed ECDHE public key.
        let mut cke = Vec::new();
        let pub_key = kx.pub_key().to_vec();
        serialize_message(MessageType::ClientKeyExchange, &mut cke, |body| {
            body.push(pub_key.len() as u8);
            body.extend_from_slice(&pub_key);
        });
        self.transcript.update(&cke);
        self.engine.send_record(ContentType::Handshake, &cke)?;

        let shared = Zeroizing::new(kx.complete(&peer_public).map_err(Error::CryptoError)?);
        self.derive_keys(&shared)?;

        // Our ChangeCipherSpec, then the encrypted Finished.
        self.engine.send_record(ContentType::ChangeCipherSpec, &[1])?;

        let verify_data = self.compute_verify_data("client finished")?;
        let mut finished = Vec::new();
        serialize_message(MessageType::Finished, &mut finished, |body| {
            Finished {
                verify_data: &verify_data,
            }
            .serialize(body)
        });
        self.transcript.update(&finished);
        self.engine.send_record(ContentType::Handshake, &finished)?;

        debug!("Sent client flight, waiting for server Finished");
        self.state = HandshakeState::KeyExchangeDone;
        Ok(())
    }

    /// Master secret and key block per RFC 5246 8.1 / 6.3, key layout per
    /// RFC 5288 (no MAC keys for AEAD suites).
    fn derive_keys(&mut self, shared: &[u8]) -> Result<(), Error> {
        let suite = self.negotiated_suite()?;
        let provider = self.config.crypto_provider();
        let hash = suite.hash_algorithm();
        let server_random = self.server_random.ok_or(Error::NotEstablished)?;

        let mut randoms = Vec::with_capacity(64);
        randoms.extend_from_slice(&self.client_random.0);
        randoms.extend_from_slice(&server_random.0);

        let master = Zeroizing::new(
            provider
                .prf_provider
                .prf_tls12(shared, "master secret", &randoms, 48, hash)
                .map_err(Error::CryptoError)?,
        );

        let (key_len, iv_len) = suite.key_lengths();
        let mut key_seed = Vec::with_capacity(64);
        key_seed.extend_from_slice(&server_random.0);
        key_seed.extend_from_slice(&self.client_random.0);

        let key_block = Zeroizing::new(
            provider
                .prf_provider
                .prf_tls12(
                    &master,
                    "key expansion",
                    &key_seed,
                    2 * (key_len + iv_len),
                    hash,
                )
                .map_err(Error::CryptoError)?,
        );

        let client_key = &key_block[..key_len];
        let server_key = &key_block[key_len..2 * key_len];
        let client_iv = &key_block[2 * key_len..2 * key_len + iv_len];
        let server_iv = &key_block[2 * key_len + iv_len..];

        let mut fixed_iv_tx = [0u8; GCM_FIXED_IV_LEN];
        fixed_iv_tx.copy_from_slice(client_iv);
        let mut fixed_iv_rx = [0u8; GCM_FIXED_IV_LEN];
        fixed_iv_rx.copy_from_slice(server_iv);

        self.engine.enable_protection_tx(DirectionKeys {
            cipher: suite.create_cipher(client_key).map_err(Error::CryptoError)?,
            fixed_iv: Zeroizing::new(fixed_iv_tx),
        });
        self.pending_rx_keys = Some(DirectionKeys {
            cipher: suite.create_cipher(server_key).map_err(Error::CryptoError)?,
            fixed_iv: Zeroizing::new(fixed_iv_rx),
        });

        self.master_secret = Some(master);
        Ok(())
    }

    fn compute_verify_data(&mut self, label: &str) -> Result<Vec<u8>, Error> {
        let suite = self.negotiated_suite()?;
        let master = self
            .master_secret
            .as_ref()
            .ok_or_else(|| Error::CryptoError("verify_data before key derivation".into()))?;
        let transcript_hash = self.transcript.clone_and_finalize();

        self.config
            .crypto_provider()
            .prf_provider
            .prf_tls12(
                master,
                label,
                &transcript_hash,
                VERIFY_DATA_LEN,
                suite.hash_algorithm(),
            )
            .map_err(Error::CryptoError)
    }

    fn handle_finished(&mut self, message: &[u8], body: &[u8]) -> Result<(), Error> {
        if !self.peer_ccs_seen {
            return self.fail(FailReason::ProtocolViolation(
                "Finished before ChangeCipherSpec",
            ));
        }

        let (_, finished) =
            Finished::parse(body).map_err(|_| Error::Malformed("bad Finished"))?;

        // Expected verify_data covers the transcript up to but excluding
        // the server Finished itself.
        let expected = self.compute_verify_data("server finished")?;

        if expected.ct_eq(finished.verify_data).into() {
            self.transcript.update(message);
            self.state = HandshakeState::Established;
            debug!("Handshake established with {}", self.server_name);
            Ok(())
        } else {
            self.fail(FailReason::BadFinished)
        }
    }

    fn handle_change_cipher_spec(&mut self, record: &PlainRecord) -> Result<(), Error> {
        if record.payload != [1] {
            return Err(Error::Malformed("bad ChangeCipherSpec"));
        }
        if self.state != HandshakeState::KeyExchangeDone || self.engine.is_protected_rx() {
            return self.fail(FailReason::ProtocolViolation("unexpected ChangeCipherSpec"));
        }
        let keys = match self.pending_rx_keys.take() {
            Some(keys) => keys,
            None => {
                return self.fail(FailReason::ProtocolViolation(
                    "ChangeCipherSpec before key derivation",
                ))
            }
        };
        self.engine.enable_protection_rx(keys);
        self.peer_ccs_seen = true;
        Ok(())
    }

    fn handle_alert(&mut self, record: &PlainRecord) -> Result<(), Error> {
        if record.payload.len() != 2 {
            return Err(Error::Malformed("bad alert"));
        }
        let (level, description) = (record.payload[0], record.payload[1]);

        if description == ALERT_CLOSE_NOTIFY {
            debug!("Peer sent close_notify");
            self.peer_closed = true;
            if !self.is_established() {
                return self.fail(FailReason::PeerAlert(ALERT_CLOSE_NOTIFY));
            }
            return Ok(());
        }

        if level == ALERT_LEVEL_FATAL {
            debug!("Peer sent fatal alert {}", description);
            self.peer_closed = true;
            if !self.is_established() {
                return self.fail(FailReason::PeerAlert(description));
            }
            return Err(Error::PeerAlert(description));
        }

        trace!("Ignoring warning alert {}", description);
        Ok(())
    }

    fn negotiated_suite(&self) -> Result<&'static dyn SupportedCipherSuite, Error> {
        self.suite
            .ok_or_else(|| Error::CryptoError("no negotiated cipher suite".into()))
    }

    /// Transition to the terminal `Failed` state, queueing a fatal alert
    /// for the peer. Fail closed: nothing is retried.
    fn fail(&mut self, reason: FailReason) -> Result<(), Error> {
        let code = match reason {
            FailReason::UnsupportedCipher(_) => Some(ALERT_HANDSHAKE_FAILURE),
            FailReason::HostnameMismatch | FailReason::BadCertificate => {
                Some(ALERT_BAD_CERTIFICATE)
            }
            FailReason::BadSignature | FailReason::BadFinished => Some(ALERT_DECRYPT_ERROR),
            FailReason::ProtocolViolation(_) => Some(ALERT_UNEXPECTED_MESSAGE),
            // The peer aborted, nothing to tell it.
            FailReason::PeerAlert(_) => None,
        };
        if let Some(code) = code {
            // Best effort. A full transmit queue is not a reason to panic
            // while failing.
            let _ = self
                .engine
                .send_record(ContentType::Alert, &[ALERT_LEVEL_FATAL, code]);
        }

        debug!("Handshake failed in {}: {}", self.state.name(), reason);
        self.failed_in = Some(self.state.name());
        self.state = HandshakeState::Failed(reason);
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server_name", &self.server_name)
            .field("state", &self.state)
            .finish()
    }
}
