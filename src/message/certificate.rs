use nom::bytes::complete::take;
use nom::number::complete::be_u24;
use nom::IResult;
use tinyvec::ArrayVec;

/// One DER-encoded certificate in a Certificate message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Asn1Cert<'a>(pub &'a [u8]);

/// Certificate message: u24 list length, then u24-prefixed DER certs,
/// leaf first.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Certificate<'a> {
    pub certificates: ArrayVec<[Asn1Cert<'a>; 8]>,
}

impl<'a> Certificate<'a> {
    pub fn parse(input: &'a [u8]) -> IResult<&'a [u8], Certificate<'a>> {
        let (input, list_len) = be_u24(input)?;
        let (input, mut list_input) = take(list_len as usize)(input)?;

        let mut certificates = ArrayVec::new();
        while !list_input.is_empty() && !certificates.is_full() {
            let (rest, cert_len) = be_u24(list_input)?;
            let (rest, cert) = take(cert_len as usize)(rest)?;
            certificates.push(Asn1Cert(cert));
            list_input = rest;
        }

        Ok((input, Certificate { certificates }))
    }

    pub fn serialize(&self, output: &mut Vec<u8>) {
        let list_len: usize = self.certificates.iter().map(|c| 3 + c.0.len()).sum();
        output.extend_from_slice(&(list_len as u32).to_be_bytes()[1..]);
        for cert in &self.certificates {
            output.extend_from_slice(&(cert.0.len() as u32).to_be_bytes()[1..]);
            output.extend_from_slice(cert.0);
        }
    }

    /// The leaf certificate, if the list is non-empty.
    pub fn leaf(&self) -> Option<&'a [u8]> {
        self.certificates.first().map(|c| c.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut certificates = ArrayVec::new();
        certificates.push(Asn1Cert(&[1, 2, 3]));
        certificates.push(Asn1Cert(&[4, 5]));
        let msg = Certificate { certificates };

        let mut out = Vec::new();
        msg.serialize(&mut out);

        let (rest, parsed) = Certificate::parse(&out).unwrap();
        assert!(rest.is_empty());
        assert_eq!(parsed, msg);
        assert_eq!(parsed.leaf(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn empty_list() {
        let msg = Certificate::default();
        let mut out = Vec::new();
        msg.serialize(&mut out);
        assert_eq!(out, &[0, 0, 0]);

        let (_, parsed) = Certificate::parse(&out).unwrap();
        assert_eq!(parsed.leaf(), None);
    }
}
