//! Full handshake against an in-test TLS 1.2 server built from the same
//! crypto provider primitives, plus application data echo and close.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use p256::ecdsa::signature::Signer;
use p256::ecdsa::SigningKey;
use p256::pkcs8::DecodePrivateKey;

use timpl::crypto::{
    rust_crypto, ActiveKeyExchange, Cipher, CryptoProvider, HashContext, GCM_EXPLICIT_NONCE_LEN,
    GCM_TAG_LEN,
};
use timpl::message::{
    serialize_message, Asn1Cert, Certificate, ClientHello, DigitallySigned, EcdhParams, Random,
    ServerHello, SessionId,
};
use timpl::record::{Decoded, Record};
use timpl::{
    CipherSuite, Config, Connection, ContentType, Error, FailReason, HashAlgorithm, MessageType,
    NamedGroup, Poll, ProtocolVersion, SignatureScheme, Transport,
};

/// One direction of an in-memory byte pipe.
struct Pipe {
    rx: Rc<RefCell<Vec<u8>>>,
    tx: Rc<RefCell<Vec<u8>>>,
}

impl Transport for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> Result<Poll<usize>, Error> {
        let mut rx = self.rx.borrow_mut();
        if rx.is_empty() {
            return Ok(Poll::WouldBlock);
        }
        let n = std::cmp::min(buf.len(), rx.len());
        buf[..n].copy_from_slice(&rx[..n]);
        rx.drain(..n);
        Ok(Poll::Ready(n))
    }

    fn write(&mut self, data: &[u8]) -> Result<Poll<usize>, Error> {
        self.tx.borrow_mut().extend_from_slice(data);
        Ok(Poll::Ready(data.len()))
    }
}

fn split_records(mut input: &[u8]) -> Vec<(ContentType, Vec<u8>)> {
    let mut records = Vec::new();
    while !input.is_empty() {
        match Record::decode(input).unwrap() {
            Decoded::Complete { record, consumed } => {
                records.push((record.content_type, record.payload.to_vec()));
                input = &input[consumed..];
            }
            Decoded::NeedMoreBytes => panic!("partial record in test pipe"),
        }
    }
    records
}

fn frame(content_type: ContentType, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    Record {
        content_type,
        version: ProtocolVersion::TLS1_2,
        payload,
    }
    .serialize(&mut out);
    out
}

/// Keyed direction state for the test server.
struct ServerKeys {
    cipher: Box<dyn Cipher>,
    fixed_iv: [u8; 4],
    sequence: u64,
}

impl ServerKeys {
    fn aad(&self, content_type: ContentType, plaintext_len: usize) -> [u8; 13] {
        let mut aad = [0u8; 13];
        aad[..8].copy_from_slice(&self.sequence.to_be_bytes());
        aad[8] = content_type.as_u8();
        aad[9..11].copy_from_slice(&0x0303u16.to_be_bytes());
        aad[11..13].copy_from_slice(&(plaintext_len as u16).to_be_bytes());
        aad
    }

    fn encrypt(&mut self, content_type: ContentType, plaintext: &[u8]) -> Vec<u8> {
        let explicit = self.sequence.to_be_bytes();
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(&self.fixed_iv);
        nonce[4..].copy_from_slice(&explicit);
        let aad = self.aad(content_type, plaintext.len());

        let ciphertext = self.cipher.encrypt(plaintext, &aad, &nonce).unwrap();
        self.sequence += 1;

        let mut payload = explicit.to_vec();
        payload.extend_from_slice(&ciphertext);
        frame(content_type, &payload)
    }

    fn decrypt(&mut self, content_type: ContentType, payload: &[u8]) -> Vec<u8> {
        let (explicit, ciphertext) = payload.split_at(GCM_EXPLICIT_NONCE_LEN);
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(&self.fixed_iv);
        nonce[4..].copy_from_slice(explicit);
        let aad = self.aad(content_type, ciphertext.len() - GCM_TAG_LEN);

        let plaintext = self.cipher.decrypt(ciphertext, &aad, &nonce).unwrap();
        self.sequence += 1;
        plaintext
    }
}

/// Minimal TLS 1.2 server for exercising the client: ECDHE-ECDSA with
/// AES-128-GCM, no resumption, no client auth.
struct TestServer {
    provider: CryptoProvider,
    cert_der: Vec<u8>,
    signing_key: SigningKey,
    transcript: Box<dyn HashContext>,
    client_random: [u8; 32],
    server_random: [u8; 32],
    kx: Option<Box<dyn ActiveKeyExchange>>,
    master: Vec<u8>,
    read: Option<ServerKeys>,
    write: Option<ServerKeys>,
    /// Send a wrong Finished verify_data.
    corrupt_finished: bool,
}

impl TestServer {
    fn new(common_name: &str) -> TestServer {
        let mut params = rcgen::CertificateParams::new(vec![common_name.to_string()]);
        params.alg = &rcgen::PKCS_ECDSA_P256_SHA256;
        let cert = rcgen::Certificate::from_params(params).unwrap();

        let cert_der = cert.serialize_der().unwrap();
        let key_der = cert.serialize_private_key_der();
        let signing_key = SigningKey::from_pkcs8_der(&key_der).unwrap();

        let provider = rust_crypto::default_provider();
        let transcript = provider.hash_provider.create_hash(HashAlgorithm::SHA256);

        TestServer {
            provider,
            cert_der,
            signing_key,
            transcript,
            client_random: [0; 32],
            server_random: [0; 32],
            kx: None,
            master: Vec::new(),
            read: None,
            write: None,
            corrupt_finished: false,
        }
    }

    fn prf(&self, secret: &[u8], label: &str, seed: &[u8], len: usize) -> Vec<u8> {
        self.provider
            .prf_provider
            .prf_tls12(secret, label, seed, len, HashAlgorithm::SHA256)
            .unwrap()
    }

    /// Consume the ClientHello, produce ServerHello through ServerHelloDone.
    fn first_flight(&mut self, client_bytes: &[u8]) -> Vec<u8> {
        let records = split_records(client_bytes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, ContentType::Handshake);
        let hello_msg = &records[0].1;

        self.transcript.update(hello_msg);
        let (_, hello) = ClientHello::parse(&hello_msg[4..]).unwrap();
        assert!(hello
            .cipher_suites
            .contains(&CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256));
        self.client_random = hello.random.0;
        self.provider
            .secure_random
            .fill(&mut self.server_random)
            .unwrap();

        let mut out = Vec::new();

        let server_hello = ServerHello {
            server_version: ProtocolVersion::TLS1_2,
            random: Random(self.server_random),
            session_id: SessionId::empty(),
            cipher_suite: CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256,
            compression_method: timpl::CompressionMethod::Null,
            extensions: Default::default(),
        };
        let mut message = Vec::new();
        serialize_message(MessageType::ServerHello, &mut message, |body| {
            server_hello.serialize(body)
        });
        self.transcript.update(&message);
        out.extend_from_slice(&frame(ContentType::Handshake, &message));

        let mut message = Vec::new();
        let mut certificate = Certificate::default();
        certificate.certificates.push(Asn1Cert(&self.cert_der));
        serialize_message(MessageType::Certificate, &mut message, |body| {
            certificate.serialize(body)
        });
        self.transcript.update(&message);
        out.extend_from_slice(&frame(ContentType::Handshake, &message));

        // ServerKeyExchange, signed over client_random + server_random +
        // params.
        let kx = self
            .provider
            .find_kx_group(NamedGroup::X25519)
            .unwrap()
            .start_exchange()
            .unwrap();
        let mut params_raw = Vec::new();
        EcdhParams {
            named_group: NamedGroup::X25519,
            public: kx.pub_key(),
        }
        .serialize(&mut params_raw);

        let mut signed_data = Vec::new();
        signed_data.extend_from_slice(&self.client_random);
        signed_data.extend_from_slice(&self.server_random);
        signed_data.extend_from_slice(&params_raw);
        let signature: p256::ecdsa::Signature = self.signing_key.sign(&signed_data);
        let signature_der = signature.to_der();

        let mut message = Vec::new();
        serialize_message(MessageType::ServerKeyExchange, &mut message, |body| {
            body.extend_from_slice(&params_raw);
            DigitallySigned {
                scheme: SignatureScheme::EcdsaSecp256r1Sha256,
                signature: signature_der.as_bytes(),
            }
            .serialize(body);
        });
        self.transcript.update(&message);
        out.extend_from_slice(&frame(ContentType::Handshake, &message));
        self.kx = Some(kx);

        let mut message = Vec::new();
        serialize_message(MessageType::ServerHelloDone, &mut message, |_| {});
        self.transcript.update(&message);
        out.extend_from_slice(&frame(ContentType::Handshake, &message));

        out
    }

    /// Consume ClientKeyExchange, ChangeCipherSpec and Finished; produce
    /// the server ChangeCipherSpec and Finished.
    fn second_flight(&mut self, client_bytes: &[u8]) -> Vec<u8> {
        let records = split_records(client_bytes);
        assert_eq!(records.len(), 3);

        // ClientKeyExchange: u8-prefixed ECDHE public key.
        let (content_type, cke) = &records[0];
        assert_eq!(*content_type, ContentType::Handshake);
        self.transcript.update(cke);
        let public_len = cke[4] as usize;
        let client_public = &cke[5..5 + public_len];

        let shared = self.kx.take().unwrap().complete(client_public).unwrap();

        let mut randoms = Vec::new();
        randoms.extend_from_slice(&self.client_random);
        randoms.extend_from_slice(&self.server_random);
        self.master = self.prf(&shared, "master secret", &randoms, 48);

        let mut key_seed = Vec::new();
        key_seed.extend_from_slice(&self.server_random);
        key_seed.extend_from_slice(&self.client_random);
        let key_block = self.prf(&self.master, "key expansion", &key_seed, 40);

        let suite = self
            .provider
            .find_cipher_suite(CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256)
            .unwrap();
        self.read = Some(ServerKeys {
            cipher: suite.create_cipher(&key_block[..16]).unwrap(),
            fixed_iv: key_block[32..36].try_into().unwrap(),
            sequence: 0,
        });
        self.write = Some(ServerKeys {
            cipher: suite.create_cipher(&key_block[16..32]).unwrap(),
            fixed_iv: key_block[36..40].try_into().unwrap(),
            sequence: 0,
        });

        let (content_type, ccs) = &records[1];
        assert_eq!(*content_type, ContentType::ChangeCipherSpec);
        assert_eq!(ccs.as_slice(), &[1]);

        // Encrypted client Finished.
        let (content_type, finished_ct) = &records[2];
        assert_eq!(*content_type, ContentType::Handshake);
        let finished = self
            .read
            .as_mut()
            .unwrap()
            .decrypt(ContentType::Handshake, finished_ct);
        let expected = self.prf(
            &self.master,
            "client finished",
            &self.transcript.clone_and_finalize(),
            12,
        );
        assert_eq!(&finished[4..], expected.as_slice());
        self.transcript.update(&finished);

        // Server ChangeCipherSpec + Finished.
        let mut out = frame(ContentType::ChangeCipherSpec, &[1]);
        let mut verify_data = self.prf(
            &self.master,
            "server finished",
            &self.transcript.clone_and_finalize(),
            12,
        );
        if self.corrupt_finished {
            verify_data[0] ^= 0xFF;
        }
        let mut message = Vec::new();
        serialize_message(MessageType::Finished, &mut message, |body| {
            body.extend_from_slice(&verify_data)
        });
        out.extend_from_slice(
            &self
                .write
                .as_mut()
                .unwrap()
                .encrypt(ContentType::Handshake, &message),
        );
        out
    }

    /// Decrypt one application data record and send it back encrypted.
    fn echo(&mut self, client_bytes: &[u8]) -> Vec<u8> {
        let records = split_records(client_bytes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, ContentType::ApplicationData);

        let plaintext = self
            .read
            .as_mut()
            .unwrap()
            .decrypt(ContentType::ApplicationData, &records[0].1);
        self.write
            .as_mut()
            .unwrap()
            .encrypt(ContentType::ApplicationData, &plaintext)
    }
}

struct TestPair {
    connection: Connection<Pipe>,
    server: TestServer,
    client_to_server: Rc<RefCell<Vec<u8>>>,
    server_to_client: Rc<RefCell<Vec<u8>>>,
}

fn connect(server: TestServer, server_name: &str) -> Result<TestPair, Error> {
    let config = Config::builder()
        .cipher_suites(vec![CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256])
        .build()
        .unwrap();

    let client_to_server = Rc::new(RefCell::new(Vec::new()));
    let server_to_client = Rc::new(RefCell::new(Vec::new()));
    let pipe = Pipe {
        rx: server_to_client.clone(),
        tx: client_to_server.clone(),
    };

    let connection = Connection::connect(pipe, server_name, config)?;
    Ok(TestPair {
        connection,
        server,
        client_to_server,
        server_to_client,
    })
}

impl TestPair {
    fn take_client_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut *self.client_to_server.borrow_mut())
    }

    fn feed_client(&mut self, bytes: Vec<u8>) {
        self.server_to_client.borrow_mut().extend_from_slice(&bytes);
    }
}

#[test]
fn full_handshake_echo_and_close() {
    let _ = env_logger::try_init();
    let server = TestServer::new("example.com");
    let mut pair = connect(server, "example.com").unwrap();
    assert!(!pair.connection.is_established());

    // Server flight one, client flight two.
    let hello = pair.take_client_bytes();
    let flight = pair.server.first_flight(&hello);
    pair.feed_client(flight);
    assert_eq!(
        pair.connection.complete_handshake().unwrap(),
        Poll::WouldBlock
    );

    // Server ChangeCipherSpec and Finished complete the handshake.
    let client_flight = pair.take_client_bytes();
    let flight = pair.server.second_flight(&client_flight);
    pair.feed_client(flight);
    assert_eq!(
        pair.connection.complete_handshake().unwrap(),
        Poll::Ready(())
    );
    assert!(pair.connection.is_established());

    // Application data both ways.
    assert_eq!(pair.connection.write(b"hello tls").unwrap(), 9);
    let data = pair.take_client_bytes();
    let echoed = pair.server.echo(&data);
    pair.feed_client(echoed);

    let mut buf = [0u8; 64];
    assert_eq!(
        pair.connection.read(&mut buf).unwrap(),
        Poll::Ready(9)
    );
    assert_eq!(&buf[..9], b"hello tls");

    // Close sends an encrypted close_notify.
    pair.connection.close().unwrap();
    let close_bytes = pair.take_client_bytes();
    let records = split_records(&close_bytes);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, ContentType::Alert);
    let alert = pair
        .server
        .read
        .as_mut()
        .unwrap()
        .decrypt(ContentType::Alert, &records[0].1);
    assert_eq!(alert, &[1, 0]);
}

#[test]
fn tampered_server_finished_fails() {
    let _ = env_logger::try_init();
    let mut server = TestServer::new("example.com");
    server.corrupt_finished = true;
    let mut pair = connect(server, "example.com").unwrap();

    let hello = pair.take_client_bytes();
    let flight = pair.server.first_flight(&hello);
    pair.feed_client(flight);
    pair.connection.complete_handshake().unwrap();

    let client_flight = pair.take_client_bytes();
    let flight = pair.server.second_flight(&client_flight);
    pair.feed_client(flight);

    let result = pair.connection.complete_handshake();
    assert_eq!(
        result,
        Err(Error::HandshakeFailed {
            stage: "KeyExchangeDone",
            reason: FailReason::BadFinished,
        })
    );
}

#[test]
fn certificate_for_wrong_name_fails() {
    let _ = env_logger::try_init();
    // Certificate issued for example.com, connection wants other.com.
    let server = TestServer::new("example.com");
    let mut pair = connect(server, "other.com").unwrap();

    let hello = pair.take_client_bytes();
    let flight = pair.server.first_flight(&hello);
    pair.feed_client(flight);

    let result = pair.connection.complete_handshake();
    assert_eq!(
        result,
        Err(Error::HandshakeFailed {
            stage: "ReceivedServerHello",
            reason: FailReason::HostnameMismatch,
        })
    );

    // The failure produced a fatal bad_certificate alert.
    let bytes = pair.take_client_bytes();
    let records = split_records(&bytes);
    let (content_type, payload) = records.last().unwrap();
    assert_eq!(*content_type, ContentType::Alert);
    assert_eq!(payload.as_slice(), &[2, 42]);
}
