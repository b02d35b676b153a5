use crate::cert::Certificate;
use crate::error::{Error, Result};
use std::ops::Index;

/// Certificates in the order the server sent them.
///
/// Index 0 is the leaf, the last index is the outermost certificate. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedChain {
    certificates: Vec<Certificate>,
}

impl PresentedChain {
    pub fn new(certificates: Vec<Certificate>) -> Result<Self> {
        if certificates.is_empty() {
            return Err(Error::EmptyChain);
        }
        Ok(Self { certificates })
    }

    pub fn from_der_list<I, D>(ders: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        let certificates = ders
            .into_iter()
            .map(|der| Certificate::from_der(der.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(certificates)
    }

    pub fn leaf(&self) -> &Certificate {
        &self.certificates[0]
    }

    pub fn outermost(&self) -> &Certificate {
        &self.certificates[self.outermost_index()]
    }

    pub fn outermost_index(&self) -> usize {
        self.certificates.len() - 1
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Always false; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Certificate> {
        self.certificates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates.iter()
    }
}

impl Index<usize> for PresentedChain {
    type Output = Certificate;

    fn index(&self, index: usize) -> &Certificate {
        &self.certificates[index]
    }
}

impl<'a> IntoIterator for &'a PresentedChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}
