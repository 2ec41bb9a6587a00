//! Record layer behavior observed through the client state machine:
//! fragmented delivery, coalesced messages and malformed framing.

use std::sync::Arc;

use timpl::message::{serialize_message, Random, ServerHello, SessionId};
use timpl::record::Record;
use timpl::{
    CipherSuite, CompressionMethod, Config, ContentType, Error, HandshakeState, MessageType,
    ProtocolVersion,
};

fn client(config: &Arc<Config>) -> timpl::Client {
    let mut client = timpl::Client::new(config.clone(), "example.com").unwrap();
    // First step emits the ClientHello.
    assert_eq!(
        client.advance(None).unwrap(),
        HandshakeState::SentClientHello
    );
    client
}

fn server_hello_message(cipher_suite: CipherSuite) -> Vec<u8> {
    let hello = ServerHello {
        server_version: ProtocolVersion::TLS1_2,
        random: Random([7; 32]),
        session_id: SessionId::empty(),
        cipher_suite,
        compression_method: CompressionMethod::Null,
        extensions: Default::default(),
    };
    let mut message = Vec::new();
    serialize_message(MessageType::ServerHello, &mut message, |body| {
        hello.serialize(body)
    });
    message
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

#[test]
fn message_split_across_records() {
    let _ = env_logger::try_init();
    let config = Config::new().unwrap();
    let mut client = client(&config);

    let message = server_hello_message(CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256);
    let (first, second) = message.split_at(message.len() / 2);

    // Half a ServerHello is not actionable.
    let state = client
        .advance(Some(frame(ContentType::Handshake, first).as_slice()))
        .unwrap();
    assert_eq!(state, HandshakeState::SentClientHello);
    assert!(!client.can_make_progress());

    let state = client
        .advance(Some(frame(ContentType::Handshake, second).as_slice()))
        .unwrap();
    assert_eq!(state, HandshakeState::ReceivedServerHello);
}

#[test]
fn record_delivered_byte_at_a_time() {
    let _ = env_logger::try_init();
    let config = Config::new().unwrap();
    let mut client = client(&config);

    let record = frame(
        ContentType::Handshake,
        &server_hello_message(CipherSuite::ECDHE_RSA_AES128_GCM_SHA256),
    );

    for byte in &record[..record.len() - 1] {
        let state = client.advance(Some(std::slice::from_ref(byte))).unwrap();
        assert_eq!(state, HandshakeState::SentClientHello);
    }
    let state = client.advance(Some(&record[record.len() - 1..])).unwrap();
    assert_eq!(state, HandshakeState::ReceivedServerHello);
}

#[test]
fn coalesced_messages_consumed_one_per_advance() {
    let _ = env_logger::try_init();
    let config = Config::new().unwrap();
    let mut client = client(&config);

    // ServerHello and an (empty, so invalid) Certificate in one record.
    let mut payload = server_hello_message(CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256);
    serialize_message(MessageType::Certificate, &mut payload, |body| {
        body.extend_from_slice(&[0, 0, 0]);
    });

    let state = client
        .advance(Some(frame(ContentType::Handshake, &payload).as_slice()))
        .unwrap();
    assert_eq!(state, HandshakeState::ReceivedServerHello);

    // The second message is buffered and handled on the next step.
    assert!(client.can_make_progress());
    let state = client.advance(None).unwrap();
    assert_eq!(
        state,
        HandshakeState::Failed(timpl::FailReason::BadCertificate)
    );
}

#[test]
fn unknown_content_type_is_malformed() {
    let _ = env_logger::try_init();
    let config = Config::new().unwrap();
    let mut client = client(&config);

    let result = client.advance(Some(&[0x42, 3, 3, 0, 1, 0][..]));
    assert_eq!(result, Err(Error::Malformed("unknown record content type")));
}

#[test]
fn oversized_record_is_malformed() {
    let _ = env_logger::try_init();
    let config = Config::new().unwrap();
    let mut client = client(&config);

    // Length field above 2^14 + 2048.
    let result = client.advance(Some(&[22, 3, 3, 0x48, 0x01, 0][..]));
    assert_eq!(result, Err(Error::Malformed("record length exceeds limit")));
}
