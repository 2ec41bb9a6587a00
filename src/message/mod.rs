//! Handshake message parsing and serialization.
//!
//! Each message pairs a nom `parse` with a manual `serialize`. Server-sent
//! messages serialize too so test harnesses can act as the peer.

mod certificate;
mod client_hello;
mod extension;
mod finished;
mod server_hello;
mod server_key_exchange;

pub use certificate::{Asn1Cert, Certificate};
pub use client_hello::ClientHello;
pub use extension::{Extension, ExtensionType};
pub use finished::{Finished, VERIFY_DATA_LEN};
pub use server_hello::ServerHello;
pub use server_key_exchange::{DigitallySigned, EcdhParams, ServerKeyExchange};

use nom::bytes::complete::take;
use nom::number::complete::{be_u24, be_u8};
use nom::IResult;
use tinyvec::ArrayVec;

use crate::types::MessageType;

/// Handshake message header: type (1) + u24 length.
pub const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_type: MessageType,
    pub length: u32,
}

impl Header {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Header> {
        let (input, msg_type) = MessageType::parse(input)?;
        let (input, length) = be_u24(input)?;
        Ok((input, Header { msg_type, length }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.msg_type.as_u8());
        output.extend_from_slice(&self.length.to_be_bytes()[1..]);
    }
}

/// Serialize a handshake body with its header prepended.
pub fn serialize_message<F>(msg_type: MessageType, output: &mut Vec<u8>, f: F)
where
    F: FnOnce(&mut Vec<u8>),
{
    let mut body = Vec::new();
    f(&mut body);
    Header {
        msg_type,
        length: body.len() as u32,
    }
    .serialize(output);
    output.extend_from_slice(&body);
}

/// The 32-byte random in ClientHello and ServerHello.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Random(pub [u8; 32]);

impl Default for Random {
    fn default() -> Self {
        Random([0; 32])
    }
}

impl Random {
    pub fn parse(input: &[u8]) -> IResult<&[u8], Random> {
        let (input, bytes) = take(32usize)(input)?;
        // take(32) guarantees the length.
        let arr: [u8; 32] = bytes.try_into().unwrap();
        Ok((input, Random(arr)))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.0);
    }
}

/// Legacy session id, echoed but never used for resumption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionId(pub ArrayVec<[u8; 32]>);

impl SessionId {
    pub fn empty() -> Self {
        SessionId(ArrayVec::new())
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], SessionId> {
        let (input, len) = be_u8(input)?;
        if len > 32 {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::TooLarge,
            )));
        }
        let (input, bytes) = take(len as usize)(input)?;
        let mut id = ArrayVec::new();
        id.extend_from_slice(bytes);
        Ok((input, SessionId(id)))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.0.len() as u8);
        output.extend_from_slice(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let header = Header {
            msg_type: MessageType::ClientHello,
            length: 0x01_02_03,
        };
        let mut out = Vec::new();
        header.serialize(&mut out);
        assert_eq!(out, &[1, 0x01, 0x02, 0x03]);

        let (rest, parsed) = Header::parse(&out).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, header);
    }

    #[test]
    fn session_id_roundtrip() {
        let mut id = SessionId::empty();
        id.0.extend_from_slice(&[1, 2, 3]);
        let mut out = Vec::new();
        id.serialize(&mut out);
        assert_eq!(out, &[3, 1, 2, 3]);

        let (rest, parsed) = SessionId::parse(&out).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, id);
    }
}
