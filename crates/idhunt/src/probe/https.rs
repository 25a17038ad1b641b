//! TLS probe against the fixed [`Endpoint`].
//!
//! Every call opens its own TCP connection and TLS session so a stalled or
//! reset connection only affects the candidate it was opened for. Certificate
//! checks are relaxed: the target is a known service used purely for an
//! existence side channel, so any server certificate is accepted. Handshake
//! signatures are still verified with the provider's algorithms.

use super::{Endpoint, Probe, ProbeError, ProbeOutcome, exchange::exchange};
use crate::{Candidate, Error, Result};
use core::time::Duration;
use rustls::{
    ClientConfig, DigitallySignedStruct, SignatureScheme,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature},
    pki_types::{CertificateDer, ServerName, UnixTime},
};
use std::sync::Arc;
use tokio::{io::AsyncWriteExt, net::TcpStream, time::timeout};
use tokio_rustls::TlsConnector;

/// Probes candidates over HTTPS, one connection per candidate.
#[derive(Clone)]
pub struct HttpsProbe {
    endpoint: Arc<Endpoint>,
    connector: TlsConnector,
    server_name: ServerName<'static>,
    timeout: Option<Duration>,
}

impl HttpsProbe {
    /// Builds the TLS client configuration once; it is shared by every probe.
    ///
    /// `timeout` bounds one whole round trip (connect, handshake, request and
    /// status line). `None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the endpoint host is not a valid server name.
    /// - [`Error::Tls`] if the protocol versions cannot be configured.
    pub fn new(endpoint: Endpoint, timeout: Option<Duration>) -> Result<Self> {
        let server_name = ServerName::try_from(endpoint.host().to_owned()).map_err(|e| {
            Error::config(format!("invalid target host {:?}: {e}", endpoint.host()))
        })?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
            .with_no_client_auth();

        Ok(Self {
            endpoint: Arc::new(endpoint),
            connector: TlsConnector::from(Arc::new(config)),
            server_name,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn round_trip(&self, candidate: &Candidate) -> core::result::Result<u16, ProbeError> {
        let tcp = TcpStream::connect((self.endpoint.host(), self.endpoint.port()))
            .await
            .map_err(ProbeError::Connect)?;
        // Requests are tiny; don't let Nagle hold them back.
        if let Err(_e) = tcp.set_nodelay(true) {
            tracing::trace!(%candidate, "TCP_NODELAY not set: {_e}");
        }

        let mut tls = self
            .connector
            .connect(self.server_name.clone(), tcp)
            .await
            .map_err(ProbeError::Handshake)?;

        let request = self.endpoint.head_request(candidate);
        let status = exchange(&mut tls, request.as_bytes()).await;

        // If this future is dropped before here, dropping `tls` closes the
        // socket instead.
        if let Err(_e) = tls.shutdown().await {
            tracing::trace!(%candidate, "TLS shutdown failed: {_e}");
        }

        status
    }
}

impl Probe for HttpsProbe {
    async fn probe(&self, candidate: &Candidate) -> ProbeOutcome {
        let result = match self.timeout {
            Some(limit) => timeout(limit, self.round_trip(candidate))
                .await
                .unwrap_or(Err(ProbeError::TimedOut)),
            None => self.round_trip(candidate).await,
        };

        match result {
            Ok(status) => {
                tracing::debug!(%candidate, status, "probe answered");
                ProbeOutcome::from_status(candidate.clone(), status)
            }
            Err(error) => ProbeOutcome::Error {
                candidate: candidate.clone(),
                error,
            },
        }
    }

    fn share_url(&self, candidate: &Candidate) -> String {
        self.endpoint.share_url(candidate)
    }
}

impl core::fmt::Debug for HttpsProbe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpsProbe")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Accepts any server certificate and name.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> core::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> core::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> core::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
