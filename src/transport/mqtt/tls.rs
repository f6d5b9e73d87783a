//! TLS transport selection
//!
//! Broker certificates are NOT verified unless verification is requested.
//! The skip mode exists for test brokers with self-signed certificates and is
//! logged as a warning every time it is used.

use rumqttc::tokio_rustls::rustls::{
    self,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    pki_types::{CertificateDer, ServerName, UnixTime},
    ClientConfig, DigitallySignedStruct, SignatureScheme,
};
use rumqttc::Transport as RumqttcTransport;
use std::sync::Arc;
use tracing::warn;

/// How the broker certificate is checked on TLS connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVerification {
    /// INSECURE: accept any certificate for any host name
    InsecureSkipVerify,
    /// Verify against the platform root store
    WebPki,
}

impl TlsVerification {
    pub fn from_flag(verify: bool) -> Self {
        if verify {
            TlsVerification::WebPki
        } else {
            TlsVerification::InsecureSkipVerify
        }
    }
}

/// Build the rumqttc TLS transport. No client certificate is presented in either mode.
pub fn transport(verification: TlsVerification) -> RumqttcTransport {
    match verification {
        TlsVerification::WebPki => RumqttcTransport::tls_with_default_config(),
        TlsVerification::InsecureSkipVerify => {
            warn!("TLS certificate verification is disabled for this connection");
            RumqttcTransport::tls_with_config(insecure_client_config().into())
        }
    }
}

fn insecure_client_config() -> ClientConfig {
    ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth()
}

/// Certificate verifier that accepts everything
#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_from_flag() {
        assert_eq!(
            TlsVerification::from_flag(false),
            TlsVerification::InsecureSkipVerify
        );
        assert_eq!(TlsVerification::from_flag(true), TlsVerification::WebPki);
    }

    #[test]
    fn test_both_modes_build_tls_transport() {
        assert!(matches!(
            transport(TlsVerification::InsecureSkipVerify),
            RumqttcTransport::Tls(_)
        ));
        assert!(matches!(
            transport(TlsVerification::WebPki),
            RumqttcTransport::Tls(_)
        ));
    }
}
