//! Certificate inspection and signature verification using x509-cert,
//! p256 and rsa.

use der::asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef};
use der::oid::{AssociatedOid, ObjectIdentifier};
use der::{Decode, Encode};
use rsa::pkcs1::DecodeRsaPublicKey;
use signature::Verifier;
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::Certificate;

use crate::crypto::provider::CertVerifier;
use crate::types::SignatureScheme;

const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Default verifier.
///
/// Enforces the server-name match and verifies handshake signatures against
/// the presented leaf. Chain trust policy is out of scope here and belongs
/// to a replacement [`CertVerifier`] when the application needs one.
#[derive(Debug)]
pub(super) struct StandardCertVerifier;

impl CertVerifier for StandardCertVerifier {
    fn verify_chain(&self, chain: &[&[u8]]) -> Result<(), String> {
        if chain.is_empty() {
            return Err("empty certificate chain".into());
        }
        // Every element must at least be parseable DER.
        for cert in chain {
            Certificate::from_der(cert).map_err(|e| format!("Unparseable certificate: {}", e))?;
        }
        Ok(())
    }

    fn matches_name(&self, leaf: &[u8], server_name: &str) -> Result<bool, String> {
        let cert = Certificate::from_der(leaf)
            .map_err(|e| format!("Unparseable leaf certificate: {}", e))?;

        let wanted = server_name.to_ascii_lowercase();

        // SAN dNSName entries take precedence over the subject CN.
        let mut saw_san_dns = false;
        if let Some(extensions) = &cert.tbs_certificate.extensions {
            for ext in extensions {
                if ext.extn_id != SubjectAltName::OID {
                    continue;
                }
                let san = SubjectAltName::from_der(ext.extn_value.as_bytes())
                    .map_err(|e| format!("Unparseable subjectAltName: {}", e))?;
                for name in &san.0 {
                    if let GeneralName::DnsName(dns) = name {
                        saw_san_dns = true;
                        if dns_name_matches(dns.as_str(), &wanted) {
                            return Ok(true);
                        }
                    }
                }
            }
        }
        if saw_san_dns {
            return Ok(false);
        }

        // CN fallback for certificates without SAN dNSNames.
        for rdn in cert.tbs_certificate.subject.0.iter() {
            for atv in rdn.0.iter() {
                if atv.oid != OID_COMMON_NAME {
                    continue;
                }
                let value = decode_directory_string(&atv.value)?;
                if dns_name_matches(&value, &wanted) {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    fn verify_signature(
        &self,
        leaf: &[u8],
        scheme: SignatureScheme,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), String> {
        let cert = Certificate::from_der(leaf)
            .map_err(|e| format!("Unparseable leaf certificate: {}", e))?;
        let spki = &cert.tbs_certificate.subject_public_key_info;
        let key_bytes = spki
            .subject_public_key
            .as_bytes()
            .ok_or_else(|| "Public key has unused bits".to_string())?;

        match scheme {
            SignatureScheme::EcdsaSecp256r1Sha256 => {
                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(key_bytes)
                    .map_err(|e| format!("Invalid P-256 public key: {}", e))?;
                let sig = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|e| format!("Invalid ECDSA signature encoding: {}", e))?;
                key.verify(message, &sig)
                    .map_err(|_| "ECDSA signature verification failed".to_string())
            }
            SignatureScheme::RsaPkcs1Sha256 => {
                let key = rsa::RsaPublicKey::from_pkcs1_der(key_bytes)
                    .map_err(|e| format!("Invalid RSA public key: {}", e))?;
                let digest = Sha256::digest(message);
                key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
                    .map_err(|_| "RSA signature verification failed".to_string())
            }
            SignatureScheme::Unknown(value) => {
                Err(format!("Unsupported signature scheme 0x{:04x}", value))
            }
        }
    }
}

fn decode_directory_string(value: &der::Any) -> Result<String, String> {
    if let Ok(s) = value.decode_as::<Utf8StringRef>() {
        return Ok(s.as_str().to_string());
    }
    if let Ok(s) = value.decode_as::<PrintableStringRef>() {
        return Ok(s.as_str().to_string());
    }
    if let Ok(s) = value.decode_as::<Ia5StringRef>() {
        return Ok(s.as_str().to_string());
    }
    Err(format!(
        "Unsupported directory string encoding: {:?}",
        value.to_der()
    ))
}

/// RFC 6125 single-label wildcard matching. `pattern` comes from the
/// certificate, `name` must already be lowercase.
fn dns_name_matches(pattern: &str, name: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();

    if let Some(suffix) = pattern.strip_prefix("*.") {
        // The wildcard covers exactly one label and never the registry part.
        if let Some((first, rest)) = name.split_once('.') {
            return !first.is_empty() && rest == suffix && suffix.contains('.');
        }
        return false;
    }

    pattern == name
}

pub(super) static CERT_VERIFIER: StandardCertVerifier = StandardCertVerifier;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(dns_name_matches("example.com", "example.com"));
        assert!(dns_name_matches("EXAMPLE.com", "example.com"));
        assert!(!dns_name_matches("example.com", "other.com"));
    }

    #[test]
    fn wildcard_match() {
        assert!(dns_name_matches("*.example.com", "www.example.com"));
        assert!(!dns_name_matches("*.example.com", "example.com"));
        assert!(!dns_name_matches("*.example.com", "a.b.example.com"));
        assert!(!dns_name_matches("*.com", "example.com"));
    }
}
