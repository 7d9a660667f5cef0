pub mod candidates;
pub mod events;
pub mod mode;
/// Wire-level WebRTC types shared with the host
pub mod peer;
/// Peer session: negotiation, candidate buffering and teardown
///
/// Wraps one host peer connection and sequences offer/answer exchanges,
/// remote candidates and local media around it.
pub mod session;
pub mod simulcast;
mod worker;

pub use candidates::CandidateTicket;
pub use events::{CandidateListener, PeerEvent, SignalListener};
pub use mode::PeerMode;
pub use peer::{
    BundlePolicy, DataChannelState, IceCandidate, IceServer, IceTransportPolicy, MediaKind,
    RTCConfiguration, SdpType, SessionDescription, SignalingState, TransceiverDirection,
};
pub use session::{AnswerHandle, PeerSession, PeerSessionBuilder, PeerSessionStats};
