//! Network existence checks for a single candidate.
//!
//! ## Structure
//!
//! - [`endpoint`] - the fixed target and the links built from it.
//! - [`exchange`] - request framing and status line classification, generic
//!   over any async stream.
//! - [`https`] - [`HttpsProbe`], one fresh TLS connection per candidate.
//!
//! A probe never fails past its own boundary: every transport or protocol
//! problem is returned as [`ProbeOutcome::Error`]. Cancellation is the only
//! way a probe stops early, and it does so by being dropped, which closes the
//! connection it owns.

pub mod endpoint;
pub mod exchange;
pub mod https;

pub use endpoint::Endpoint;
pub use https::HttpsProbe;

use crate::Candidate;
use core::future::Future;

/// Performs one existence check for one candidate.
pub trait Probe: Send + Sync + 'static {
    fn probe(&self, candidate: &Candidate) -> impl Future<Output = ProbeOutcome> + Send;

    /// Canonical shareable link for a confirmed candidate.
    fn share_url(&self, candidate: &Candidate) -> String;
}

/// Classified result of a single probe.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The remote service confirmed the candidate exists (2xx status).
    Hit { candidate: Candidate, status: u16 },
    /// The remote service answered with any other well-formed status.
    Miss { candidate: Candidate, status: u16 },
    /// The round trip failed before a status could be read.
    Error {
        candidate: Candidate,
        error: ProbeError,
    },
}

impl ProbeOutcome {
    /// Classifies a parsed status code.
    pub fn from_status(candidate: Candidate, status: u16) -> Self {
        if (200..300).contains(&status) {
            Self::Hit { candidate, status }
        } else {
            Self::Miss { candidate, status }
        }
    }

    pub fn candidate(&self) -> &Candidate {
        match self {
            Self::Hit { candidate, .. }
            | Self::Miss { candidate, .. }
            | Self::Error { candidate, .. } => candidate,
        }
    }

    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }
}

/// Recoverable failure of a single probe.
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server returned empty response")]
    EmptyResponse,

    #[error("server returned invalid status line: {line:?}")]
    MalformedStatusLine { line: String },

    #[error("probe timed out")]
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        for status in [200, 204, 299] {
            assert!(ProbeOutcome::from_status("a".into(), status).is_hit());
        }
        for status in [100, 199, 300, 301, 404, 500] {
            let outcome = ProbeOutcome::from_status("a".into(), status);
            assert!(matches!(outcome, ProbeOutcome::Miss { status: s, .. } if s == status));
        }
    }

    #[test]
    fn candidate_is_kept_for_every_variant() {
        let outcome = ProbeOutcome::Error {
            candidate: "xyz".into(),
            error: ProbeError::EmptyResponse,
        };
        assert_eq!(outcome.candidate().as_str(), "xyz");
        assert!(!outcome.is_hit());
    }
}
