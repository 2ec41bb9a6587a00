use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::IResult;

use crate::types::{NamedGroup, SignatureScheme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionType {
    ServerName,
    SupportedGroups,
    EcPointFormats,
    SignatureAlgorithms,
    RenegotiationInfo,
    Unknown(u16),
}

impl Default for ExtensionType {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl ExtensionType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0000 => ExtensionType::ServerName,
            0x000A => ExtensionType::SupportedGroups,
            0x000B => ExtensionType::EcPointFormats,
            0x000D => ExtensionType::SignatureAlgorithms,
            0xFF01 => ExtensionType::RenegotiationInfo,
            _ => ExtensionType::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            ExtensionType::ServerName => 0x0000,
            ExtensionType::SupportedGroups => 0x000A,
            ExtensionType::EcPointFormats => 0x000B,
            ExtensionType::SignatureAlgorithms => 0x000D,
            ExtensionType::RenegotiationInfo => 0xFF01,
            ExtensionType::Unknown(value) => *value,
        }
    }
}

/// One extension as it appears in ClientHello/ServerHello: a type followed
/// by u16 length-prefixed opaque data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extension<'a> {
    pub extension_type: ExtensionType,
    pub data: &'a [u8],
}

impl<'a> Extension<'a> {
    pub fn new(extension_type: ExtensionType, data: &'a [u8]) -> Self {
        Extension {
            extension_type,
            data,
        }
    }

    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], Extension<'a>> {
        let (input, type_value) = be_u16(input)?;
        let (input, length) = be_u16(input)?;
        let (input, data) = take(length as usize)(input)?;
        Ok((
            input,
            Extension {
                extension_type: ExtensionType::from_u16(type_value),
                data,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.extension_type.as_u16().to_be_bytes());
        output.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
        output.extend_from_slice(self.data);
    }
}

/// Write the server_name extension body (RFC 6066): one host_name entry.
pub fn serialize_server_name(name: &str, output: &mut Vec<u8>) {
    let name = name.as_bytes();
    let entry_len = 3 + name.len();
    output.extend_from_slice(&(entry_len as u16).to_be_bytes());
    output.push(0); // name_type host_name
    output.extend_from_slice(&(name.len() as u16).to_be_bytes());
    output.extend_from_slice(name);
}

/// Write the supported_groups extension body.
pub fn serialize_supported_groups(groups: &[NamedGroup], output: &mut Vec<u8>) {
    output.extend_from_slice(&((groups.len() * 2) as u16).to_be_bytes());
    for group in groups {
        group.serialize(output);
    }
}

/// Write the signature_algorithms extension body.
pub fn serialize_signature_algorithms(schemes: &[SignatureScheme], output: &mut Vec<u8>) {
    output.extend_from_slice(&((schemes.len() * 2) as u16).to_be_bytes());
    for scheme in schemes {
        scheme.serialize(output);
    }
}

/// Write the ec_point_formats extension body: uncompressed only.
pub fn serialize_ec_point_formats(output: &mut Vec<u8>) {
    output.push(1); // list length
    output.push(0); // uncompressed
}
