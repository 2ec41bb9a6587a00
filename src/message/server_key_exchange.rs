use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;

use crate::types::{NamedGroup, SignatureScheme};

/// ECDHE parameters from a named-curve ServerKeyExchange (RFC 8422 5.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcdhParams<'a> {
    pub named_group: NamedGroup,
    pub public: &'a [u8],
}

impl<'a> EcdhParams<'a> {
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], EcdhParams<'a>> {
        let (input, curve_type) = be_u8(input)?;
        // 3 = named_curve; the only form this engine speaks.
        if curve_type != 3 {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )));
        }
        let (input, named_group) = NamedGroup::parse(input)?;
        let (input, public_len) = be_u8(input)?;
        let (input, public) = take(public_len as usize)(input)?;
        Ok((
            input,
            EcdhParams {
                named_group,
                public,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.push(3); // named_curve
        self.named_group.serialize(output);
        output.push(self.public.len() as u8);
        output.extend_from_slice(self.public);
    }
}

/// Signature over the key exchange parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitallySigned<'a> {
    pub scheme: SignatureScheme,
    pub signature: &'a [u8],
}

impl<'a> DigitallySigned<'a> {
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], DigitallySigned<'a>> {
        let (input, scheme) = SignatureScheme::parse(input)?;
        let (input, signature_len) = be_u16(input)?;
        let (input, signature) = take(signature_len as usize)(input)?;
        Ok((input, DigitallySigned { scheme, signature }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.scheme.serialize(output);
        output.extend_from_slice(&(self.signature.len() as u16).to_be_bytes());
        output.extend_from_slice(self.signature);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerKeyExchange<'a> {
    pub params: EcdhParams<'a>,
    pub signed: DigitallySigned<'a>,
    /// The raw params bytes as transmitted. The signature covers
    /// client_random || server_random || these bytes.
    pub params_raw: &'a [u8],
}

impl<'a> ServerKeyExchange<'a> {
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], ServerKeyExchange<'a>> {
        let start = input;
        let (input, params) = EcdhParams::parse(input)?;
        let params_raw = &start[..start.len() - input.len()];
        let (input, signed) = DigitallySigned::parse(input)?;
        Ok((
            input,
            ServerKeyExchange {
                params,
                signed,
                params_raw,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.params.serialize(output);
        self.signed.serialize(output);
    }
}
