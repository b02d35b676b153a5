use crate::cert::Certificate;
use crate::chain::PresentedChain;
use crate::error::{Error, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Bounds the TCP connect and each handshake read/write.
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Accepts whatever chain the server presents; the chain is judged later.
///
/// Handshake signatures are still checked so the peer must hold the leaf key.
#[derive(Debug)]
struct AcceptPresentedChain {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AcceptPresentedChain {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

pub fn fetch_certificate_chain(host: &str, port: u16) -> Result<PresentedChain> {
    fetch_with_options(host, port, &FetchOptions::default())
}

/// Complete a TLS handshake with `host:port` and return the presented chain
/// in wire order.
pub fn fetch_with_options(host: &str, port: u16, options: &FetchOptions) -> Result<PresentedChain> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| Error::DnsName(format!("Invalid DNS name '{}': {}", host, e)))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = Arc::new(AcceptPresentedChain {
        algorithms: provider.signature_verification_algorithms,
    });

    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();

    let mut conn = rustls::ClientConnection::new(Arc::new(config), server_name)
        .map_err(|e| Error::Tls(format!("Failed to create TLS connection: {}", e)))?;

    let mut sock = connect(host, port, options.timeout)?;
    sock.set_read_timeout(Some(options.timeout))?;
    sock.set_write_timeout(Some(options.timeout))?;

    while conn.is_handshaking() {
        conn.complete_io(&mut sock)
            .map_err(|e| Error::Tls(format!("Handshake with {}:{} failed: {}", host, port, e)))?;
    }

    log::info!(
        "Handshake with {}:{} complete ({:?}, {:?})",
        host,
        port,
        conn.protocol_version(),
        conn.negotiated_cipher_suite().map(|suite| suite.suite())
    );

    let presented = conn
        .peer_certificates()
        .ok_or_else(|| Error::NotFound(format!("{}:{} sent no certificates", host, port)))?;

    let certificates = presented
        .iter()
        .map(|der| Certificate::from_der(der.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    log::debug!("{}:{} presented {} certificates", host, port, certificates.len());

    PresentedChain::new(certificates)
}

fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| Error::Connection(format!("Failed to resolve {}: {}", host, e)))?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(sock) => {
                log::info!("Connected to {}", addr);
                return Ok(sock);
            }
            Err(e) => {
                log::debug!("Connection to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(Error::Connection(match last_error {
        Some(e) => format!("Failed to connect to {}:{}: {}", host, port, e),
        None => format!("No addresses found for {}", host),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::CertPool;
    use crate::testutil::{Pki, LEAF_HOST};
    use crate::types::TriState;
    use crate::verify::{ChainVerifier, VerifyOptions};
    use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
    use std::net::TcpListener;
    use std::thread;

    fn serve_once(listener: TcpListener, pki: &Pki) {
        let chain = vec![
            CertificateDer::from(pki.leaf.clone()),
            CertificateDer::from(pki.intermediate.clone()),
            CertificateDer::from(pki.root.clone()),
        ];
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(pki.leaf_key.clone()));
        let config = rustls::ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .unwrap();

        thread::spawn(move || {
            let Ok((mut sock, _)) = listener.accept() else {
                return;
            };
            let _ = sock.set_read_timeout(Some(Duration::from_secs(5)));
            let Ok(mut conn) = rustls::ServerConnection::new(Arc::new(config)) else {
                return;
            };
            while conn.is_handshaking() {
                if conn.complete_io(&mut sock).is_err() {
                    return;
                }
            }
        });
    }

    #[test]
    fn test_fetch_and_verify_local_server() {
        let pki = Pki::generate();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        serve_once(listener, &pki);

        let options = FetchOptions {
            timeout: Duration::from_secs(5),
        };
        let chain = fetch_with_options("127.0.0.1", port, &options).unwrap();
        assert_eq!(chain, pki.chain());

        let store = CertPool::from_certificates([pki.root_cert()]);
        let report = ChainVerifier::new(&store, VerifyOptions::default()).verify(&chain);
        assert_eq!(report.verdict.is_chain_validated, TriState::True);
        assert!(report.verdict.is_chain_in_order);
        assert_eq!(chain.leaf().dns_names(), &[LEAF_HOST.to_string()]);
    }

    #[test]
    fn test_handshake_failure_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            if let Ok((sock, _)) = listener.accept() {
                drop(sock);
            }
        });

        let result = fetch_with_options("127.0.0.1", port, &FetchOptions::default());
        assert!(matches!(result, Err(Error::Tls(_)) | Err(Error::Connection(_))));
    }

    #[test]
    fn test_invalid_host_name() {
        assert!(matches!(
            fetch_certificate_chain("not a host", 443),
            Err(Error::DnsName(_))
        ));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(FetchOptions::default().timeout, Duration::from_secs(5));
    }
}
