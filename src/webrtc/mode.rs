use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a session, fixed for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerMode {
    /// Only receives. Transceivers are added right before the offer.
    Recvonly,
    /// Only sends. Existing transceivers are forced to `sendonly`.
    Sendonly,
    /// Sends and receives. Local tracks are attached at start.
    Sendrecv,
}

impl PeerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerMode::Recvonly => "recvonly",
            PeerMode::Sendonly => "sendonly",
            PeerMode::Sendrecv => "sendrecv",
        }
    }

    /// Whether sessions in this mode capture local media at start.
    pub fn sends(&self) -> bool {
        !matches!(self, PeerMode::Recvonly)
    }
}

impl fmt::Display for PeerMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_round_trip_through_serde() {
        for mode in [PeerMode::Recvonly, PeerMode::Sendonly, PeerMode::Sendrecv] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode));
        }
    }

    #[test]
    fn test_only_recvonly_skips_capture() {
        assert!(!PeerMode::Recvonly.sends());
        assert!(PeerMode::Sendonly.sends());
        assert!(PeerMode::Sendrecv.sends());
    }
}
