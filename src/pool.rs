//! Sets of certificates used as verification anchors.
//!
//! The same type backs the host's root store and the pool accumulated while
//! walking a presented chain.

use crate::cert::Certificate;
use crate::error::{Error, Result};
use std::path::Path;
use x509_parser::pem::Pem;

#[derive(Debug, Clone, Default)]
pub struct CertPool {
    certificates: Vec<Certificate>,
}

impl CertPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the host's root certificates.
    ///
    /// Individual certificates that fail to load or parse are skipped with a
    /// warning; an empty result is an error.
    pub fn system() -> Result<Self> {
        let result = rustls_native_certs::load_native_certs();

        for error in &result.errors {
            log::warn!("Error when loading native certs: {}", error);
        }

        let mut pool = Self::new();
        for der in &result.certs {
            match Certificate::from_der(der.as_ref()) {
                Ok(cert) => {
                    pool.add(cert);
                }
                Err(e) => log::warn!("Skipping unparseable root certificate: {}", e),
            }
        }

        if pool.is_empty() {
            return Err(Error::TrustStore(
                "no root certificates found in the system store".to_string(),
            ));
        }

        log::debug!("Loaded {} system root certificates", pool.len());
        Ok(pool)
    }

    pub fn from_pem(pem_data: &[u8]) -> Result<Self> {
        let mut pool = Self::new();

        for pem in Pem::iter_from_buffer(pem_data) {
            let pem = pem.map_err(|e| Error::Pem(format!("Failed to read PEM block: {}", e)))?;
            if pem.label == "CERTIFICATE" || pem.label == "TRUSTED CERTIFICATE" {
                pool.add(Certificate::from_der(&pem.contents)?);
            }
        }

        if pool.is_empty() {
            return Err(Error::Pem("no certificates found in PEM input".to_string()));
        }

        Ok(pool)
    }

    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_pem(&data)
    }

    pub fn from_certificates(certificates: impl IntoIterator<Item = Certificate>) -> Self {
        let mut pool = Self::new();
        for cert in certificates {
            pool.add(cert);
        }
        pool
    }

    /// Append `cert` unless an identical one is already present.
    pub fn add(&mut self, cert: Certificate) -> bool {
        if self.contains(&cert) {
            return false;
        }
        self.certificates.push(cert);
        true
    }

    pub fn contains(&self, cert: &Certificate) -> bool {
        self.certificates.iter().any(|c| c == cert)
    }

    /// Pool entries whose subject matches `cert`'s issuer name.
    pub fn issuers_of<'a>(&'a self, cert: &'a Certificate) -> impl Iterator<Item = &'a Certificate> {
        self.certificates
            .iter()
            .filter(move |candidate| cert.is_issued_by_name(candidate))
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates.iter()
    }
}
