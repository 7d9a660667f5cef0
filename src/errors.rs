use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// Operation attempted after the native connection was closed
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),
    /// Native offer/answer/description rejection, message kept verbatim
    #[error("Negotiation failure: {0}")]
    NegotiationFailure(String),
    /// Capture device denied or unavailable
    #[error("Media acquisition failure: {0}")]
    MediaAcquisitionFailure(String),
    #[error("Data channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Platform error: {0}")]
    Platform(String),
}

impl PeerError {
    pub fn closed() -> Self {
        PeerError::ConnectionClosed("PeerConnection object is closed".to_string())
    }

    /// Wraps a host-side error, keeping its full context chain.
    pub fn negotiation(error: anyhow::Error) -> Self {
        PeerError::NegotiationFailure(format!("{:#}", error))
    }

    pub fn media(error: anyhow::Error) -> Self {
        PeerError::MediaAcquisitionFailure(format!("{:#}", error))
    }

    pub fn platform(error: anyhow::Error) -> Self {
        PeerError::Platform(format!("{:#}", error))
    }

    /// True for errors raised because the session is already torn down.
    pub fn is_closed(&self) -> bool {
        matches!(self, PeerError::ConnectionClosed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiation_keeps_native_message() {
        let err = PeerError::negotiation(anyhow::anyhow!("InvalidStateError: no remote offer"));
        assert_eq!(
            err.to_string(),
            "Negotiation failure: InvalidStateError: no remote offer"
        );
    }

    #[test]
    fn test_context_chain_is_flattened() {
        let err = PeerError::media(
            anyhow::anyhow!("NotAllowedError").context("getUserMedia rejected"),
        );
        assert_eq!(
            err.to_string(),
            "Media acquisition failure: getUserMedia rejected: NotAllowedError"
        );
    }

    #[test]
    fn test_is_closed() {
        assert!(PeerError::closed().is_closed());
        assert!(!PeerError::ChannelUnavailable("x".into()).is_closed());
    }
}
