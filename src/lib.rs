//! chaincheck - independent verification of a TLS server's certificate chain
//!
//! This library connects to a TLS endpoint with handshake-level chain
//! verification switched off, collects the certificates the server presents,
//! and judges them on its own:
//!
//! - Whether each certificate is signed by the next one in the presented order
//! - Whether any non-outermost certificate is self-signed
//! - Whether each certificate chains to a trust anchor, the outermost against
//!   the system store and the rest against the certificates presented above them
//! - Whether the presented order matches a validated path
//! - How many days remain before the leaf expires
//!
//! # Examples
//!
//! ## Checking a remote server
//!
//! ```no_run
//! use chaincheck::fetch::fetch_certificate_chain;
//! use chaincheck::pool::CertPool;
//! use chaincheck::report::{render_report, RenderOptions};
//! use chaincheck::verify::{ChainVerifier, VerifyOptions};
//!
//! let store = CertPool::system().unwrap();
//! let chain = fetch_certificate_chain("example.com", 443).unwrap();
//!
//! let report = ChainVerifier::new(&store, VerifyOptions::for_host("example.com")).verify(&chain);
//! print!("{}", render_report(&chain, &report, &RenderOptions::default()));
//! ```
//!
//! ## Verifying certificates you already have
//!
//! ```no_run
//! use chaincheck::chain::PresentedChain;
//! use chaincheck::pool::CertPool;
//! use chaincheck::verify::{ChainVerifier, VerifyOptions};
//!
//! # let (leaf_der, intermediate_der): (Vec<u8>, Vec<u8>) = (Vec::new(), Vec::new());
//! let store = CertPool::from_pem_file("roots.pem").unwrap();
//! let chain = PresentedChain::from_der_list([leaf_der, intermediate_der]).unwrap();
//!
//! let verdict = ChainVerifier::new(&store, VerifyOptions::default()).verify(&chain).verdict;
//! println!("{:?}", verdict.codes());
//! ```

pub mod cert;
pub mod chain;
pub mod error;
pub mod fetch;
pub mod path;
pub mod pool;
pub mod report;
pub mod types;
pub mod verify;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};

pub use cert::Certificate;
pub use chain::PresentedChain;
pub use fetch::{fetch_certificate_chain, fetch_with_options, FetchOptions};
pub use path::{build_paths, PathError, PathOptions, ValidatedPath};
pub use pool::CertPool;
pub use report::{render_report, RenderOptions};
pub use types::{AnchorTier, DistinguishedName, ReportVerdict, TriState, VerificationOutcome};
pub use verify::{ChainReport, ChainVerifier, CertificateStep, VerifyOptions};
