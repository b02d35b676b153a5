//! Test fixtures: a throwaway root → intermediate → leaf hierarchy.

use crate::cert::Certificate;
use crate::chain::PresentedChain;
use crate::pool::CertPool;
use rcgen::{
    BasicConstraints, Certificate as RcCertificate, CertificateParams, DistinguishedName, DnType,
    IsCa, KeyUsagePurpose, SanType,
};
use time::{Duration, OffsetDateTime};

pub const LEAF_HOST: &str = "leaf.chaincheck.test";

pub struct Pki {
    pub root: Vec<u8>,
    pub intermediate: Vec<u8>,
    pub leaf: Vec<u8>,
    pub leaf_key: Vec<u8>,
}

impl Pki {
    pub fn generate() -> Self {
        let now = OffsetDateTime::now_utc();
        Self::with_leaf_validity(now - Duration::days(1), now + Duration::days(90))
    }

    pub fn with_leaf_validity(not_before: OffsetDateTime, not_after: OffsetDateTime) -> Self {
        let root = RcCertificate::from_params(ca_params("Test Root CA")).unwrap();
        let intermediate = RcCertificate::from_params(ca_params("Test Intermediate CA")).unwrap();

        let mut leaf_params = leaf_params();
        leaf_params.not_before = not_before;
        leaf_params.not_after = not_after;
        let leaf = RcCertificate::from_params(leaf_params).unwrap();

        Self {
            root: root.serialize_der().unwrap(),
            intermediate: intermediate.serialize_der_with_signer(&root).unwrap(),
            leaf: leaf.serialize_der_with_signer(&intermediate).unwrap(),
            leaf_key: leaf.serialize_private_key_der(),
        }
    }

    pub fn root_cert(&self) -> Certificate {
        Certificate::from_der(&self.root).unwrap()
    }

    pub fn intermediate_cert(&self) -> Certificate {
        Certificate::from_der(&self.intermediate).unwrap()
    }

    pub fn leaf_cert(&self) -> Certificate {
        Certificate::from_der(&self.leaf).unwrap()
    }

    /// Leaf, intermediate, root: the canonical presentation order.
    pub fn chain(&self) -> PresentedChain {
        PresentedChain::from_der_list([&self.leaf, &self.intermediate, &self.root]).unwrap()
    }

    /// A store trusting only this hierarchy's root.
    pub fn store(&self) -> CertPool {
        CertPool::from_certificates([self.root_cert()])
    }
}

pub fn self_signed_leaf(host: &str) -> Vec<u8> {
    let mut params = CertificateParams::new(vec![host.to_string()]);
    params.distinguished_name = name(host);
    params.is_ca = IsCa::ExplicitNoCa;
    params.not_before = OffsetDateTime::now_utc() - Duration::days(1);
    params.not_after = OffsetDateTime::now_utc() + Duration::days(30);
    RcCertificate::from_params(params)
        .unwrap()
        .serialize_der()
        .unwrap()
}

pub fn self_signed_with_sans() -> Vec<u8> {
    let mut params = CertificateParams::new(Vec::<String>::new());
    params.distinguished_name = name("sans.chaincheck.test");
    params.subject_alt_names = vec![
        SanType::Rfc822Name("ops@example.com".to_string()),
        SanType::IpAddress("192.0.2.7".parse().unwrap()),
    ];
    RcCertificate::from_params(params)
        .unwrap()
        .serialize_der()
        .unwrap()
}

/// Two CAs that certify each other, and a leaf issued by the first.
pub struct CrossSigned {
    pub a_by_b: Vec<u8>,
    pub b_by_a: Vec<u8>,
    pub leaf: Vec<u8>,
}

pub fn cross_signed() -> CrossSigned {
    let a = RcCertificate::from_params(ca_params("Cross CA A")).unwrap();
    let b = RcCertificate::from_params(ca_params("Cross CA B")).unwrap();
    let leaf = RcCertificate::from_params(leaf_params()).unwrap();

    CrossSigned {
        a_by_b: a.serialize_der_with_signer(&b).unwrap(),
        b_by_a: b.serialize_der_with_signer(&a).unwrap(),
        leaf: leaf.serialize_der_with_signer(&a).unwrap(),
    }
}

/// `depth` CAs, each issued by the one before it, and a leaf under the last.
pub fn ca_ladder(depth: usize) -> (Vec<Vec<u8>>, Vec<u8>) {
    let cas: Vec<RcCertificate> = (0..depth)
        .map(|i| RcCertificate::from_params(ca_params(&format!("Ladder CA {}", i))).unwrap())
        .collect();

    let mut ders = Vec::with_capacity(depth);
    for (i, ca) in cas.iter().enumerate() {
        ders.push(match i {
            0 => ca.serialize_der().unwrap(),
            _ => ca.serialize_der_with_signer(&cas[i - 1]).unwrap(),
        });
    }

    let leaf = RcCertificate::from_params(leaf_params()).unwrap();
    let leaf = leaf.serialize_der_with_signer(&cas[depth - 1]).unwrap();
    (ders, leaf)
}

/// Self-signed CAs carrying `common_name`'s subject under unrelated keys.
pub fn impostor_issuers(common_name: &str, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|_| {
            RcCertificate::from_params(ca_params(common_name))
                .unwrap()
                .serialize_der()
                .unwrap()
        })
        .collect()
}

/// Flip the final byte, which sits inside the signature value.
pub fn tamper(der: &[u8]) -> Vec<u8> {
    let mut tampered = der.to_vec();
    if let Some(last) = tampered.last_mut() {
        *last ^= 0x01;
    }
    tampered
}

fn leaf_params() -> CertificateParams {
    let mut params = CertificateParams::new(vec![LEAF_HOST.to_string()]);
    params.distinguished_name = name(LEAF_HOST);
    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params.not_before = OffsetDateTime::now_utc() - Duration::days(1);
    params.not_after = OffsetDateTime::now_utc() + Duration::days(90);
    params
}

fn ca_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new());
    params.distinguished_name = name(common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
    ];
    params.not_before = OffsetDateTime::now_utc() - Duration::days(2);
    params.not_after = OffsetDateTime::now_utc() + Duration::days(365);
    params
}

fn name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::OrganizationName, "Chaincheck Tests");
    dn.push(DnType::CountryName, "US");
    dn
}
