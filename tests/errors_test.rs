#[cfg(test)]
mod error_tests {
    use crabpeer::errors::PeerError;
    use std::error::Error;

    fn all_variants(message: &str) -> Vec<PeerError> {
        vec![
            PeerError::ConnectionClosed(message.to_string()),
            PeerError::NegotiationFailure(message.to_string()),
            PeerError::MediaAcquisitionFailure(message.to_string()),
            PeerError::ChannelUnavailable(message.to_string()),
            PeerError::InvalidConfiguration(message.to_string()),
            PeerError::Platform(message.to_string()),
        ]
    }

    #[test]
    fn test_connection_closed_display() {
        let error = PeerError::closed();
        assert_eq!(
            error.to_string(),
            "Connection closed: PeerConnection object is closed"
        );
    }

    #[test]
    fn test_negotiation_failure_display() {
        let error = PeerError::NegotiationFailure("Display test".to_string());
        assert_eq!(format!("{}", error), "Negotiation failure: Display test");
    }

    #[test]
    fn test_peer_error_debug_format() {
        let error = PeerError::ChannelUnavailable("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("ChannelUnavailable"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_peer_error_implements_error_trait() {
        let error = PeerError::Platform("Error trait test".to_string());
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
    }

    #[test]
    fn test_all_error_variants() {
        for error in all_variants("test") {
            let display_str = error.to_string();
            assert!(display_str.ends_with(": test"), "{}", display_str);

            let debug_str = format!("{:?}", error);
            assert!(!debug_str.is_empty());
        }
    }

    #[test]
    fn test_only_closed_variant_reports_closed() {
        let closed: Vec<bool> = all_variants("x").iter().map(|e| e.is_closed()).collect();
        assert_eq!(closed, vec![true, false, false, false, false, false]);
    }

    #[test]
    fn test_error_clone_and_equality() {
        for error in all_variants("Clone test") {
            assert_eq!(error.clone(), error);
        }
        assert_ne!(
            PeerError::Platform("a".to_string()),
            PeerError::InvalidConfiguration("a".to_string())
        );
    }

    #[test]
    fn test_host_errors_keep_context() {
        let error = PeerError::platform(
            anyhow::anyhow!("device busy").context("createDataChannel failed"),
        );
        assert_eq!(
            error.to_string(),
            "Platform error: createDataChannel failed: device busy"
        );
    }

    #[test]
    fn test_error_long_message() {
        let long_message = "A".repeat(1000);
        for error in all_variants(&long_message) {
            let display = error.to_string();
            assert!(display.len() > 1000);
            assert!(display.contains(&long_message));
        }
    }

    #[test]
    fn test_error_special_characters() {
        let message = "SDP line: a=ssrc:1 msid:{stream} \"track\"\r\n";
        for error in all_variants(message) {
            assert!(error.to_string().contains(message));
        }
    }
}
