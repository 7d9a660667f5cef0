//! Host capability traits.
//!
//! The negotiation logic never talks to a WebRTC stack directly. Everything it
//! needs from the host (peer connection, capture devices, rendering surfaces,
//! SDP plan translation) is injected through the traits in this module.

pub mod browser;

pub use browser::{Browser, PlatformInfo};

use crate::media::{MediaConstraints, MediaStream, MediaTrack, MixerInput};
use crate::webrtc::peer::{
    DataChannelState, IceCandidate, MediaKind, RTCConfiguration, SessionDescription,
    SignalingState, TransceiverDirection,
};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events pushed by the native connection.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    SignalingStateChange(SignalingState),
    /// `None` marks the end of candidate gathering.
    IceCandidate(Option<IceCandidate>),
    NegotiationNeeded,
}

/// Host-provided peer connection.
#[async_trait]
pub trait NativePeerConnection: Send + Sync {
    fn signaling_state(&self) -> SignalingState;
    fn local_description(&self) -> Option<SessionDescription>;
    fn remote_description(&self) -> Option<SessionDescription>;

    /// Subscribe to native events. Called once per session.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<NativeEvent>;

    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;
    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;
    async fn set_local_description(&self, desc: SessionDescription) -> anyhow::Result<()>;
    async fn set_remote_description(&self, desc: SessionDescription) -> anyhow::Result<()>;
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()>;

    fn add_transceiver(
        &self,
        kind: MediaKind,
        direction: TransceiverDirection,
    ) -> anyhow::Result<Arc<dyn NativeTransceiver>>;
    fn transceivers(&self) -> Vec<Arc<dyn NativeTransceiver>>;
    fn add_track(&self, track: Arc<dyn MediaTrack>, stream_id: &str) -> anyhow::Result<()>;

    /// Tracks currently attached to senders.
    fn sender_tracks(&self) -> Vec<Arc<dyn MediaTrack>>;
    /// Tracks currently attached to receivers.
    fn receiver_tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    fn create_data_channel(
        &self,
        label: &str,
        options: &DataChannelOptions,
        handlers: DataChannelHandlers,
    ) -> anyhow::Result<Arc<dyn NativeDataChannel>>;

    async fn close(&self) -> anyhow::Result<()>;
}

/// Creates native connections when the caller does not bring one.
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    async fn create(&self, config: &RTCConfiguration) -> anyhow::Result<Arc<dyn NativePeerConnection>>;
}

pub trait NativeTransceiver: Send + Sync {
    fn kind(&self) -> MediaKind;
    fn direction(&self) -> TransceiverDirection;
    fn set_direction(&self, direction: TransceiverDirection);
}

pub trait NativeDataChannel: Send + Sync {
    fn label(&self) -> String;
    fn ready_state(&self) -> DataChannelState;
    fn send(&self, data: Bytes) -> anyhow::Result<()>;
    fn close(&self) -> anyhow::Result<()>;
}

/// Options forwarded verbatim to the host when creating a data channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataChannelOptions {
    pub ordered: Option<bool>,
    pub max_packet_life_time: Option<u16>,
    pub max_retransmits: Option<u16>,
    pub protocol: Option<String>,
    pub negotiated: Option<bool>,
    pub id: Option<u16>,
}

pub type ChannelHandler = Box<dyn FnMut() + Send>;
pub type MessageHandler = Box<dyn FnMut(Bytes) + Send>;
pub type ChannelErrorHandler = Box<dyn FnMut(String) + Send>;

/// Callbacks wired onto a data channel the session creates.
#[derive(Default)]
pub struct DataChannelHandlers {
    pub on_open: Option<ChannelHandler>,
    pub on_close: Option<ChannelHandler>,
    pub on_message: Option<MessageHandler>,
    pub on_buffered_amount_low: Option<ChannelHandler>,
    pub on_error: Option<ChannelErrorHandler>,
}

impl DataChannelHandlers {
    /// Fills in the error handler with one that logs.
    pub(crate) fn with_default_error_handler(mut self, label: &str) -> Self {
        if self.on_error.is_none() {
            let label = label.to_string();
            self.on_error = Some(Box::new(move |err| {
                log::error!("Data channel '{}' error: {}", label, err);
            }));
        }
        self
    }
}

/// Host capture devices.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(&self, constraints: &MediaConstraints) -> anyhow::Result<MediaStream>;
    async fn get_display_media(&self, constraints: &MediaConstraints) -> anyhow::Result<MediaStream>;
    fn create_mixer(
        &self,
        inputs: Vec<MixerInput>,
        frame_interval: Option<f64>,
    ) -> anyhow::Result<Arc<dyn StreamMixer>>;
}

/// Multi-stream compositor.
pub trait StreamMixer: Send + Sync {
    fn start_drawing_frames(&self);
    fn mixed_stream(&self) -> MediaStream;
    fn release_streams(&self);
}

/// A video/audio element the session renders into.
pub trait RenderSurface: Send + Sync {
    fn set_source(&self, stream: Option<MediaStream>);
    fn has_source(&self) -> bool;
    fn pause(&self);
    fn is_paused(&self) -> bool;
    fn load(&self);
}

/// Plan-B / Unified-Plan translation, used for multistream on Plan-B hosts.
pub trait SdpInterop: Send + Sync {
    fn to_plan_b(&self, desc: SessionDescription) -> SessionDescription;
    fn to_unified_plan(&self, desc: SessionDescription) -> SessionDescription;
    fn candidate_to_plan_b(&self, candidate: IceCandidate) -> IceCandidate;
    fn candidate_to_unified_plan(&self, candidate: IceCandidate) -> IceCandidate;
}
