//! crabpeer: negotiation wrapper around host-provided WebRTC peer connections
//!
//! The crate sequences SDP offer/answer exchanges and remote ICE candidates
//! around a peer connection the host owns. Everything platform-specific (the
//! connection itself, capture devices, rendering surfaces) is injected through
//! the traits in [`platform`].
//!
//! # Features
//! - Receive-only, send-only and bidirectional sessions
//! - Remote candidate buffering until the connection is `stable`
//! - Replay of local candidates gathered before anyone listened
//! - Chrome-style simulcast through SDP rewriting
//! - Camera, screen and picture-in-picture capture at session start
//! - Optional Plan-B / Unified-Plan translation for multistream
//!
//! # Usage
//! ```rust,ignore
//! use crabpeer::{PeerOptions, PeerSession};
//!
//! let session = PeerSession::recvonly()
//!     .options(PeerOptions::default())
//!     .connection_factory(factory)
//!     .on_ice_candidate(|c| signaling.send_candidate(c))
//!     .build()
//!     .await?;
//!
//! let (offer, answer) = session.generate_offer().await?;
//! let sdp_answer = signaling.exchange(offer).await?;
//! answer.process(&sdp_answer).await?;
//! ```
pub mod config;
pub mod errors;
pub mod media;
pub mod platform;
pub mod webrtc;

// Host doubles - available for external tests
pub mod testing;

// Re-exports for convenience
pub use config::{DataChannelConfig, PeerOptions};
pub use errors::PeerError;
pub use media::{MediaConstraints, MediaStream, MediaTrack, SendSource};
pub use platform::{Browser, PlatformInfo};
pub use webrtc::{
    CandidateTicket, IceCandidate, PeerEvent, PeerMode, PeerSession, PeerSessionBuilder,
    PeerSessionStats, RTCConfiguration, SessionDescription, SignalingState,
};

/// Initialize logging for the peer sessions
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabpeer=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
