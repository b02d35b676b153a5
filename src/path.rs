//! Path building against an anchor set.

use crate::cert::Certificate;
use crate::chain::PresentedChain;
use crate::pool::CertPool;
use chrono::{DateTime, Utc};
use rustls::pki_types::{CertificateDer, ServerName};
use thiserror::Error;

/// Maximum number of certificates in one path.
const MAX_PATH_DEPTH: usize = 32;

/// Upper bound on signature verifications per search.
const MAX_SIGNATURE_CHECKS: usize = 100;

/// Why no path could be built for a certificate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("certificate expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("certificate is not valid before {0}")]
    NotYetValid(DateTime<Utc>),

    #[error("certificate is not valid for {hostname}: {reason}")]
    HostnameMismatch { hostname: String, reason: String },

    #[error("invalid hostname: {0}")]
    InvalidHostname(String),

    #[error("no path to a trust anchor")]
    UnknownIssuer,
}

#[derive(Debug, Clone)]
pub struct PathOptions<'n> {
    /// Name the certificate must be valid for; set only for the leaf.
    pub dns_name: Option<&'n str>,
    pub now: DateTime<Utc>,
}

/// One trust-anchored path, starting at the evaluated certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath<'a> {
    certificates: Vec<&'a Certificate>,
}

impl<'a> ValidatedPath<'a> {
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// The trust anchor that terminates this path.
    pub fn anchor(&self) -> Option<&'a Certificate> {
        self.certificates.last().copied()
    }

    /// First position where this path differs from `chain`, if the lengths
    /// agree. `None` means identical; lengths that differ are not compared.
    pub fn first_mismatch(&self, chain: &PresentedChain) -> Option<usize> {
        self.certificates
            .iter()
            .zip(chain.iter())
            .position(|(path_cert, presented)| *path_cert != presented)
    }
}

/// Build every path from `cert` to an anchor in `anchors`.
///
/// Anchors double as intermediates: a path may pass through several pool
/// entries, and each prefix that ends at an anchor is reported. `Ok` always
/// holds at least one path.
pub fn build_paths<'a>(
    cert: &'a Certificate,
    anchors: &'a CertPool,
    options: &PathOptions<'_>,
) -> Result<Vec<ValidatedPath<'a>>, PathError> {
    check_validity(cert, options.now)?;

    if let Some(hostname) = options.dns_name {
        check_hostname(cert, hostname)?;
    }

    if anchors.contains(cert) {
        return Ok(vec![ValidatedPath {
            certificates: vec![cert],
        }]);
    }

    let mut search = Search {
        anchors,
        now: options.now,
        checks: 0,
        paths: Vec::new(),
    };
    let mut current = vec![cert];
    search.extend(&mut current);

    if search.paths.is_empty() {
        return Err(PathError::UnknownIssuer);
    }

    Ok(search.paths)
}

struct Search<'a> {
    anchors: &'a CertPool,
    now: DateTime<Utc>,
    checks: usize,
    paths: Vec<ValidatedPath<'a>>,
}

impl<'a> Search<'a> {
    fn extend(&mut self, current: &mut Vec<&'a Certificate>) {
        if current.len() >= MAX_PATH_DEPTH {
            return;
        }
        let Some(&tail) = current.last() else {
            return;
        };

        let anchors = self.anchors;
        for candidate in anchors.issuers_of(tail) {
            if current.contains(&candidate) {
                continue;
            }
            if !candidate.is_valid_at(self.now) || !candidate.may_issue() {
                continue;
            }
            if self.checks >= MAX_SIGNATURE_CHECKS {
                log::debug!("Signature check budget exhausted while building paths");
                return;
            }
            self.checks += 1;
            if !tail.verified_by(candidate) {
                continue;
            }

            current.push(candidate);
            self.paths.push(ValidatedPath {
                certificates: current.clone(),
            });
            self.extend(current);
            current.pop();
        }
    }
}

fn check_validity(cert: &Certificate, now: DateTime<Utc>) -> Result<(), PathError> {
    if now < cert.not_before() {
        return Err(PathError::NotYetValid(cert.not_before()));
    }
    if now > cert.not_after() {
        return Err(PathError::Expired(cert.not_after()));
    }
    Ok(())
}

fn check_hostname(cert: &Certificate, hostname: &str) -> Result<(), PathError> {
    let server_name = ServerName::try_from(hostname)
        .map_err(|_| PathError::InvalidHostname(hostname.to_string()))?;

    let der = CertificateDer::from(cert.der());
    let mismatch = |reason: String| PathError::HostnameMismatch {
        hostname: hostname.to_string(),
        reason,
    };

    let parsed =
        rustls::server::ParsedCertificate::try_from(&der).map_err(|e| mismatch(e.to_string()))?;
    rustls::client::verify_server_name(&parsed, &server_name).map_err(|e| mismatch(e.to_string()))
}
