//! TLS record framing.
//!
//! The codec is a pure transform over byte buffers. It never does I/O and
//! never blocks: a buffer holding less than one complete record decodes to
//! [`Decoded::NeedMoreBytes`] without consuming anything.

use nom::bytes::complete::take;

use crate::types::{ContentType, ProtocolVersion};
use crate::Error;

/// Record header: type (1) + version (2) + length (2).
pub const HEADER_LEN: usize = 5;

/// Max ciphertext fragment length (RFC 5246 6.2.3: 2^14 + 2048).
pub const MAX_CIPHERTEXT: usize = 16_384 + 2_048;

/// Max plaintext fragment length (RFC 5246 6.2.1).
pub const MAX_PLAINTEXT: usize = 16_384;

/// One TLS record. Immutable once constructed.
#[derive(Debug, PartialEq, Eq)]
pub struct Record<'a> {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub payload: &'a [u8],
}

/// Outcome of decoding one record from a buffer.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// One complete record, and how many input bytes it occupied.
    Complete { record: Record<'a>, consumed: usize },
    /// The buffer holds a prefix of a record. Nothing was consumed.
    NeedMoreBytes,
}

impl<'a> Record<'a> {
    /// Decode one record from the front of `input`.
    ///
    /// Short input is not an error. An unknown content type, an unknown
    /// protocol version or an oversized length field is.
    pub fn decode(input: &'a [u8]) -> Result<Decoded<'a>, Error> {
        if input.len() < HEADER_LEN {
            return Ok(Decoded::NeedMoreBytes);
        }

        let content_type = ContentType::from_u8(input[0]);
        if matches!(content_type, ContentType::Unknown(_)) {
            return Err(Error::Malformed("unknown record content type"));
        }

        let version = ProtocolVersion::from_u16(u16::from_be_bytes([input[1], input[2]]));
        if let ProtocolVersion::Unknown(_) = version {
            return Err(Error::Malformed("unknown record protocol version"));
        }

        let length = u16::from_be_bytes([input[3], input[4]]) as usize;
        if length > MAX_CIPHERTEXT {
            return Err(Error::Malformed("record length exceeds limit"));
        }

        if input.len() < HEADER_LEN + length {
            return Ok(Decoded::NeedMoreBytes);
        }

        // Length is checked above, take cannot fail.
        let (_, payload) = take::<_, _, nom::error::Error<&[u8]>>(length)(&input[HEADER_LEN..])
            .map_err(|_| Error::Truncated)?;

        Ok(Decoded::Complete {
            record: Record {
                content_type,
                version,
                payload,
            },
            consumed: HEADER_LEN + length,
        })
    }

    /// Append the framed record to `output`.
    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(self.content_type.as_u8());
        self.version.serialize(output);
        output.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        output.extend_from_slice(self.payload);
    }
}
