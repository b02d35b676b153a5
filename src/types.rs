use std::fmt;
use x509_parser::der_parser::asn1_rs::Tag;
use x509_parser::x509::{AttributeTypeAndValue, X509Name};

/// Three-valued verdict flag.
///
/// `Unknown` covers both "not applicable" (e.g. no parent for the outermost
/// certificate) and "not evaluated yet"; it is distinct from a definite failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum TriState {
    #[default]
    Unknown,
    False,
    True,
}

impl TriState {
    /// Report encoding: -1 unknown, 0 false, 1 true.
    pub fn code(self) -> i8 {
        match self {
            TriState::Unknown => -1,
            TriState::False => 0,
            TriState::True => 1,
        }
    }

    /// Kleene conjunction: false dominates, then unknown.
    pub fn and(self, other: TriState) -> TriState {
        match (self, other) {
            (TriState::False, _) | (_, TriState::False) => TriState::False,
            (TriState::True, TriState::True) => TriState::True,
            _ => TriState::Unknown,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            TriState::True
        } else {
            TriState::False
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Which anchor set a certificate was verified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorTier {
    /// The host's root store; used only for the outermost certificate.
    #[default]
    SystemStore,
    /// Certificates presented closer to the root than the one being checked.
    PresentedPool,
}

impl AnchorTier {
    pub fn name(&self) -> &'static str {
        match self {
            AnchorTier::SystemStore => "system trust store",
            AnchorTier::PresentedPool => "presented chain",
        }
    }
}

/// Subject or issuer name, with multi-valued attributes kept in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub country: Vec<String>,
    pub organization: Vec<String>,
    pub organizational_unit: Vec<String>,
    pub locality: Vec<String>,
    pub province: Vec<String>,
    pub street_address: Vec<String>,
    pub postal_code: Vec<String>,
    pub common_name: String,
    pub serial_number: String,
}

impl DistinguishedName {
    pub fn from_x509(name: &X509Name<'_>) -> Self {
        let mut dn = DistinguishedName::default();

        for rdn in name.iter() {
            for attr in rdn.iter() {
                let value = attribute_text(attr);

                match attr.attr_type().to_id_string().as_str() {
                    "2.5.4.6" => dn.country.push(value),
                    "2.5.4.10" => dn.organization.push(value),
                    "2.5.4.11" => dn.organizational_unit.push(value),
                    "2.5.4.7" => dn.locality.push(value),
                    "2.5.4.8" => dn.province.push(value),
                    "2.5.4.9" => dn.street_address.push(value),
                    "2.5.4.17" => dn.postal_code.push(value),
                    "2.5.4.3" => dn.common_name = value,
                    "2.5.4.5" => dn.serial_number = value,
                    _ => {}
                }
            }
        }

        dn
    }

    /// Labelled multi-valued attributes, in listing order.
    pub fn attributes(&self) -> [(&'static str, &[String]); 7] {
        [
            ("C", &self.country),
            ("O", &self.organization),
            ("OU", &self.organizational_unit),
            ("L", &self.locality),
            ("P", &self.province),
            ("A", &self.street_address),
            ("PC", &self.postal_code),
        ]
    }
}

/// Attribute value as text; string types outside UTF-8 are decoded lossily.
fn attribute_text(attr: &AttributeTypeAndValue<'_>) -> String {
    if let Ok(value) = attr.as_str() {
        return value.to_string();
    }

    let value = attr.attr_value();
    log::debug!(
        "Decoding attribute {} with tag {:?} lossily",
        attr.attr_type(),
        value.tag()
    );
    lossy_text(value.tag(), value.data)
}

fn lossy_text(tag: Tag, data: &[u8]) -> String {
    match tag {
        Tag::BmpString => char::decode_utf16(
            data.chunks_exact(2)
                .map(|unit| u16::from_be_bytes([unit[0], unit[1]])),
        )
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect(),
        Tag::UniversalString => data
            .chunks_exact(4)
            .map(|unit| {
                char::from_u32(u32::from_be_bytes([unit[0], unit[1], unit[2], unit[3]]))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            })
            .collect(),
        _ => String::from_utf8_lossy(data).into_owned(),
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![format!("CN={}", self.common_name)];
        for (label, values) in self.attributes() {
            for value in values {
                parts.push(format!("{}={}", label, value));
            }
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Per-certificate result of one verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerificationOutcome {
    pub signed_by_parent: TriState,
    pub self_signed: bool,
    pub verify_result: TriState,
    pub tier: AnchorTier,
}

impl VerificationOutcome {
    pub fn is_trust_anchor_step(&self) -> bool {
        self.tier == AnchorTier::SystemStore
    }
}

/// The six summary values of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportVerdict {
    pub is_root_known_cert: TriState,
    pub is_chain_validated: TriState,
    pub is_validated: TriState,
    pub is_selfsigned: bool,
    pub is_chain_in_order: bool,
    /// Whole days until the leaf expires; negative once expired.
    pub not_after_in_days: i64,
}

impl ReportVerdict {
    /// Integer encodings in report order.
    pub fn codes(&self) -> [i64; 6] {
        [
            i64::from(self.is_root_known_cert.code()),
            i64::from(self.is_chain_validated.code()),
            i64::from(self.is_validated.code()),
            i64::from(self.is_selfsigned),
            i64::from(self.is_chain_in_order),
            self.not_after_in_days,
        ]
    }
}
