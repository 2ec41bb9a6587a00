use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use tinyvec::ArrayVec;

use super::extension::{
    serialize_ec_point_formats, serialize_server_name, serialize_signature_algorithms,
    serialize_supported_groups,
};
use super::{Extension, ExtensionType, Random, SessionId};
use crate::types::{CipherSuite, CompressionMethod, NamedGroup, ProtocolVersion, SignatureScheme};

#[derive(Debug, PartialEq, Eq)]
pub struct ClientHello<'a> {
    pub client_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suites: ArrayVec<[CipherSuite; 32]>,
    pub compression_methods: ArrayVec<[CompressionMethod; 4]>,
    pub extensions: ArrayVec<[Extension<'a>; 16]>,
}

impl<'a> ClientHello<'a> {
    pub fn new(random: Random, cipher_suites: impl IntoIterator<Item = CipherSuite>) -> Self {
        let mut compression_methods = ArrayVec::new();
        compression_methods.push(CompressionMethod::Null);

        ClientHello {
            client_version: ProtocolVersion::TLS1_2,
            random,
            session_id: SessionId::empty(),
            cipher_suites: cipher_suites.into_iter().collect(),
            compression_methods,
            extensions: ArrayVec::new(),
        }
    }

    /// Add the extensions a client handshake needs.
    ///
    /// Extension bodies are written into `extension_data` first and the
    /// extension list borrows slices out of it, so the buffer must outlive
    /// the hello.
    pub fn with_extensions(
        mut self,
        extension_data: &'a mut Vec<u8>,
        server_name: &str,
        groups: &[NamedGroup],
        schemes: &[SignatureScheme],
    ) -> Self {
        extension_data.clear();

        let mut ranges = ArrayVec::<[(ExtensionType, usize, usize); 8]>::new();

        let start = extension_data.len();
        serialize_server_name(server_name, extension_data);
        ranges.push((ExtensionType::ServerName, start, extension_data.len()));

        let start = extension_data.len();
        serialize_supported_groups(groups, extension_data);
        ranges.push((ExtensionType::SupportedGroups, start, extension_data.len()));

        let start = extension_data.len();
        serialize_ec_point_formats(extension_data);
        ranges.push((ExtensionType::EcPointFormats, start, extension_data.len()));

        let start = extension_data.len();
        serialize_signature_algorithms(schemes, extension_data);
        ranges.push((
            ExtensionType::SignatureAlgorithms,
            start,
            extension_data.len(),
        ));

        // Empty renegotiation_info, signalling initial handshake.
        let start = extension_data.len();
        extension_data.push(0x00);
        ranges.push((ExtensionType::RenegotiationInfo, start, extension_data.len()));

        for (extension_type, start, end) in ranges {
            self.extensions
                .push(Extension::new(extension_type, &extension_data[start..end]));
        }

        self
    }

    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], ClientHello<'a>> {
        let (input, client_version) = ProtocolVersion::parse(input)?;
        let (input, random) = Random::parse(input)?;
        let (input, session_id) = SessionId::parse(input)?;

        let (input, cipher_suites_len) = be_u16(input)?;
        let (input, mut suites_input) = take(cipher_suites_len as usize)(input)?;
        let mut cipher_suites = ArrayVec::new();
        while !suites_input.is_empty() && !cipher_suites.is_full() {
            let (rest, suite) = CipherSuite::parse(suites_input)?;
            cipher_suites.push(suite);
            suites_input = rest;
        }

        let (input, compression_len) = be_u8(input)?;
        let (input, mut comp_input) = take(compression_len as usize)(input)?;
        let mut compression_methods = ArrayVec::new();
        while !comp_input.is_empty() && !compression_methods.is_full() {
            let (rest, method) = CompressionMethod::parse(comp_input)?;
            compression_methods.push(method);
            comp_input = rest;
        }

        let (input, extensions) = parse_extensions(input)?;

        Ok((
            input,
            ClientHello {
                client_version,
                random,
                session_id,
                cipher_suites,
                compression_methods,
                extensions,
            },
        ))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        self.client_version.serialize(output);
        self.random.serialize(output);
        self.session_id.serialize(output);

        output.extend_from_slice(&((self.cipher_suites.len() * 2) as u16).to_be_bytes());
        for suite in &self.cipher_suites {
            suite.serialize(output);
        }

        output.push(self.compression_methods.len() as u8);
        for method in &self.compression_methods {
            output.push(method.as_u8());
        }

        serialize_extensions(&self.extensions, output);
    }
}

pub(super) fn parse_extensions(input: &[u8]) -> IResult<&[u8], ArrayVec<[Extension<'_>; 16]>> {
    let mut extensions = ArrayVec::new();

    // The extension block is optional in TLS 1.2.
    if input.is_empty() {
        return Ok((input, extensions));
    }

    let (input, extensions_len) = be_u16(input)?;
    let (input, mut ext_input) = take(extensions_len as usize)(input)?;
    while !ext_input.is_empty() && !extensions.is_full() {
        let (rest, extension) = Extension::parse(ext_input)?;
        extensions.push(extension);
        ext_input = rest;
    }

    Ok((input, extensions))
}

pub(super) fn serialize_extensions(extensions: &[Extension<'_>], output: &mut Vec<u8>) {
    let total: usize = extensions.iter().map(|e| 4 + e.data.len()).sum();
    output.extend_from_slice(&(total as u16).to_be_bytes());
    for extension in extensions {
        extension.serialize(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut extension_data = Vec::new();
        let hello = ClientHello::new(
            Random([7; 32]),
            [
                CipherSuite::ECDHE_ECDSA_AES128_GCM_SHA256,
                CipherSuite::ECDHE_RSA_AES128_GCM_SHA256,
            ],
        )
        .with_extensions(
            &mut extension_data,
            "example.com",
            &[NamedGroup::X25519],
            &[
                SignatureScheme::EcdsaSecp256r1Sha256,
                SignatureScheme::RsaPkcs1Sha256,
            ],
        );

        let mut out = Vec::new();
        hello.serialize(&mut out);

        let (rest, parsed) = ClientHello::parse(&out).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, hello);
    }

    #[test]
    fn sni_is_first_extension() {
        let mut extension_data = Vec::new();
        let hello = ClientHello::new(Random([0; 32]), [CipherSuite::ECDHE_RSA_AES128_GCM_SHA256])
            .with_extensions(
                &mut extension_data,
                "other.com",
                &[NamedGroup::X25519],
                &[SignatureScheme::RsaPkcs1Sha256],
            );

        assert_eq!(hello.extensions[0].extension_type, ExtensionType::ServerName);
    }
}
