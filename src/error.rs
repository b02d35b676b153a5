use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Certificate parsing error: {0}")]
    CertParse(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("No certificates presented: {0}")]
    NotFound(String),

    #[error("Certificate chain is empty")]
    EmptyChain,

    #[error("Trust store error: {0}")]
    TrustStore(String),

    #[error("PEM parsing error: {0}")]
    Pem(String),

    #[error("DNS name error: {0}")]
    DnsName(String),
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        Error::Tls(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
