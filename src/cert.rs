use crate::error::{Error, Result};
use crate::types::DistinguishedName;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use x509_parser::prelude::*;

const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";
const OID_AD_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

/// A parsed X.509 certificate that owns its DER encoding.
///
/// Two certificates are equal when their DER bytes are identical.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    subject: DistinguishedName,
    issuer: DistinguishedName,
    subject_raw: Vec<u8>,
    issuer_raw: Vec<u8>,
    public_key: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    serial_number: String,
    signature_algorithm: String,
    is_ca: Option<bool>,
    is_v3: bool,
    issuing_certificate_urls: Vec<String>,
    ocsp_servers: Vec<String>,
    dns_names: Vec<String>,
    email_addresses: Vec<String>,
    ip_addresses: Vec<IpAddr>,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, x509) = X509Certificate::from_der(der)
            .map_err(|e| Error::CertParse(format!("Failed to parse certificate: {}", e)))?;

        let not_before = timestamp(x509.validity().not_before.timestamp())?;
        let not_after = timestamp(x509.validity().not_after.timestamp())?;

        let is_ca = x509
            .basic_constraints()
            .ok()
            .flatten()
            .map(|bc| bc.value.ca);

        let mut dns_names = Vec::new();
        let mut email_addresses = Vec::new();
        let mut ip_addresses = Vec::new();
        if let Ok(Some(san_ext)) = x509.subject_alternative_name() {
            for san in &san_ext.value.general_names {
                match san {
                    GeneralName::DNSName(name) => dns_names.push(name.to_string()),
                    GeneralName::RFC822Name(email) => email_addresses.push(email.to_string()),
                    GeneralName::IPAddress(ip) => {
                        if let Some(addr) = ip_from_bytes(ip) {
                            ip_addresses.push(addr);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut issuing_certificate_urls = Vec::new();
        let mut ocsp_servers = Vec::new();
        for ext in x509.extensions() {
            if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
                for desc in &aia.accessdescs {
                    let GeneralName::URI(uri) = &desc.access_location else {
                        continue;
                    };
                    match desc.access_method.to_id_string().as_str() {
                        OID_AD_OCSP => ocsp_servers.push(uri.to_string()),
                        OID_AD_CA_ISSUERS => issuing_certificate_urls.push(uri.to_string()),
                        _ => {}
                    }
                }
            }
        }

        Ok(Self {
            der: der.to_vec(),
            subject: DistinguishedName::from_x509(x509.subject()),
            issuer: DistinguishedName::from_x509(x509.issuer()),
            subject_raw: x509.subject().as_raw().to_vec(),
            issuer_raw: x509.issuer().as_raw().to_vec(),
            public_key: x509.public_key().raw.to_vec(),
            not_before,
            not_after,
            serial_number: format_serial(x509.raw_serial()),
            signature_algorithm: signature_algorithm_name(
                &x509.signature_algorithm.algorithm.to_id_string(),
            ),
            is_ca,
            is_v3: x509.version() == X509Version::V3,
            issuing_certificate_urls,
            ocsp_servers,
            dns_names,
            email_addresses,
            ip_addresses,
        })
    }

    /// Whether this certificate's signature verifies with `parent`'s public key.
    ///
    /// A failed check is a normal outcome, so this never errors. The parsed
    /// view borrows the DER, so the child is re-read on every call; only the
    /// parent's SubjectPublicKeyInfo is kept from construction. Both were
    /// accepted by `from_der`, so the parse branches only guard the types.
    pub fn verified_by(&self, parent: &Certificate) -> bool {
        let Ok((_, child)) = X509Certificate::from_der(&self.der) else {
            return false;
        };
        let Ok((_, key)) = SubjectPublicKeyInfo::from_der(&parent.public_key) else {
            return false;
        };

        child.verify_signature(Some(&key)).is_ok()
    }

    pub fn is_self_signed(&self) -> bool {
        self.verified_by(self)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// Whether this certificate may act as an issuer in a path.
    ///
    /// v3 certificates need `CA:TRUE`; older versions carry no extensions and
    /// are accepted.
    pub fn may_issue(&self) -> bool {
        match self.is_ca {
            Some(ca) => ca,
            None => !self.is_v3,
        }
    }

    /// Whether `self` names `candidate` as its issuer.
    pub fn is_issued_by_name(&self, candidate: &Certificate) -> bool {
        self.issuer_raw == candidate.subject_raw
    }

    pub fn to_pem(&self) -> String {
        let body = STANDARD.encode(&self.der);
        let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
        for chunk in body.as_bytes().chunks(64) {
            pem.push_str(&String::from_utf8_lossy(chunk));
            pem.push('\n');
        }
        pem.push_str("-----END CERTIFICATE-----\n");
        pem
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    pub fn is_ca(&self) -> Option<bool> {
        self.is_ca
    }

    pub fn issuing_certificate_urls(&self) -> &[String] {
        &self.issuing_certificate_urls
    }

    pub fn ocsp_servers(&self) -> &[String] {
        &self.ocsp_servers
    }

    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    pub fn email_addresses(&self) -> &[String] {
        &self.email_addresses
    }

    pub fn ip_addresses(&self) -> &[IpAddr] {
        &self.ip_addresses
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| Error::CertParse(format!("Validity timestamp out of range: {}", secs)))
}

fn format_serial(serial: &[u8]) -> String {
    serial
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn ip_from_bytes(ip: &[u8]) -> Option<IpAddr> {
    if let Ok(octets) = <[u8; 4]>::try_from(ip) {
        Some(IpAddr::V4(Ipv4Addr::from(octets)))
    } else if let Ok(octets) = <[u8; 16]>::try_from(ip) {
        Some(IpAddr::V6(Ipv6Addr::from(octets)))
    } else {
        None
    }
}

fn signature_algorithm_name(oid: &str) -> String {
    let name = match oid {
        "1.2.840.113549.1.1.5" => "SHA1-RSA",
        "1.2.840.113549.1.1.11" => "SHA256-RSA",
        "1.2.840.113549.1.1.12" => "SHA384-RSA",
        "1.2.840.113549.1.1.13" => "SHA512-RSA",
        "1.2.840.113549.1.1.10" => "RSA-PSS",
        "1.2.840.10045.4.3.2" => "ECDSA-SHA256",
        "1.2.840.10045.4.3.3" => "ECDSA-SHA384",
        "1.2.840.10045.4.3.4" => "ECDSA-SHA512",
        "1.3.101.112" => "Ed25519",
        other => return other.to_string(),
    };
    name.to_string()
}
