//! In-memory host doubles for exercising sessions without a browser.
//!
//! The fakes follow browser behavior closely enough for negotiation tests:
//! descriptions move the signaling state the way `RTCPeerConnection` does,
//! capture returns tracks matching the requested constraints, and surfaces
//! start playing when given a source.

use crate::media::{MediaConstraints, MediaStream, MediaTrack, MixerInput, TrackSettings};
use crate::platform::{
    DataChannelHandlers, DataChannelOptions, MediaDevices, NativeDataChannel, NativeEvent,
    NativePeerConnection, NativeTransceiver, PeerConnectionFactory, RenderSurface, SdpInterop,
    StreamMixer,
};
use crate::webrtc::peer::{
    DataChannelState, IceCandidate, MediaKind, RTCConfiguration, SdpType, SessionDescription,
    SignalingState, TransceiverDirection,
};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Media track with observable enable/stop state
pub struct FakeTrack {
    id: String,
    kind: MediaKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
    settings: TrackSettings,
}

impl FakeTrack {
    pub fn new(id: &str, kind: MediaKind, settings: TrackSettings) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            kind,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            settings,
        })
    }

    pub fn audio(id: &str) -> Arc<Self> {
        Self::new(id, MediaKind::Audio, TrackSettings::default())
    }

    /// 640x480 at 30 fps
    pub fn video(id: &str) -> Arc<Self> {
        Self::video_with_settings(
            id,
            TrackSettings {
                width: Some(640),
                height: Some(480),
                frame_rate: Some(30.0),
            },
        )
    }

    pub fn video_with_settings(id: &str, settings: TrackSettings) -> Arc<Self> {
        Self::new(id, MediaKind::Video, settings)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn settings(&self) -> TrackSettings {
        self.settings
    }
}

pub struct FakeTransceiver {
    kind: MediaKind,
    direction: Mutex<TransceiverDirection>,
}

impl NativeTransceiver for FakeTransceiver {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn direction(&self) -> TransceiverDirection {
        *lock(&self.direction)
    }

    fn set_direction(&self, direction: TransceiverDirection) {
        *lock(&self.direction) = direction;
    }
}

#[derive(Default)]
struct PcState {
    signaling: Option<SignalingState>,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    applied: Vec<IceCandidate>,
    failures: HashMap<String, String>,
    transceivers: Vec<Arc<FakeTransceiver>>,
    senders: Vec<Arc<dyn MediaTrack>>,
    receivers: Vec<Arc<dyn MediaTrack>>,
    data_channels: Vec<Arc<FakeDataChannel>>,
    subscribers: Vec<mpsc::UnboundedSender<NativeEvent>>,
    session_version: u32,
    close_count: usize,
}

/// Peer connection double driven by the test.
#[derive(Default)]
pub struct FakePeerConnection {
    state: Mutex<PcState>,
}

impl FakePeerConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Change the signaling state without notifying subscribers.
    pub fn force_signaling_state(&self, state: SignalingState) {
        lock(&self.state).signaling = Some(state);
    }

    /// Change the signaling state and emit the change event.
    pub fn set_signaling_state(&self, state: SignalingState) {
        self.force_signaling_state(state);
        self.emit(NativeEvent::SignalingStateChange(state));
    }

    pub fn force_remote_description(&self, desc: SessionDescription) {
        lock(&self.state).remote = Some(desc);
    }

    /// Make the next call of `op` (e.g. `"createOffer"`) fail with `message`.
    pub fn fail_next(&self, op: &str, message: &str) {
        lock(&self.state)
            .failures
            .insert(op.to_string(), message.to_string());
    }

    pub fn applied_candidates(&self) -> Vec<IceCandidate> {
        lock(&self.state).applied.clone()
    }

    /// Report a locally gathered candidate, or the end of gathering.
    pub fn emit_candidate(&self, candidate: Option<IceCandidate>) {
        self.emit(NativeEvent::IceCandidate(candidate));
    }

    pub fn emit_negotiation_needed(&self) {
        self.emit(NativeEvent::NegotiationNeeded);
    }

    /// Attach a track as if the remote side had negotiated it.
    pub fn add_remote_track(&self, track: Arc<dyn MediaTrack>) {
        lock(&self.state).receivers.push(track);
    }

    pub fn transceiver_directions(&self) -> Vec<(MediaKind, TransceiverDirection)> {
        lock(&self.state)
            .transceivers
            .iter()
            .map(|t| (t.kind, t.direction()))
            .collect()
    }

    pub fn data_channels(&self) -> Vec<Arc<FakeDataChannel>> {
        lock(&self.state).data_channels.clone()
    }

    pub fn close_count(&self) -> usize {
        lock(&self.state).close_count
    }

    fn emit(&self, event: NativeEvent) {
        let mut state = lock(&self.state);
        state
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn take_failure(&self, op: &str) -> anyhow::Result<()> {
        match lock(&self.state).failures.remove(op) {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }

    fn check_open(&self, op: &str) -> anyhow::Result<()> {
        if self.signaling_state() == SignalingState::Closed {
            bail!("InvalidStateError: {} called on a closed connection", op);
        }
        self.take_failure(op)
    }

    fn transition(&self, next: SignalingState) {
        let changed = {
            let mut state = lock(&self.state);
            let changed = state.signaling != Some(next);
            state.signaling = Some(next);
            changed
        };
        if changed {
            self.emit(NativeEvent::SignalingStateChange(next));
        }
    }

    /// Deterministic SDP with one m-section per transceiver.
    fn render_sdp(&self) -> String {
        let mut state = lock(&self.state);
        state.session_version += 1;

        let mut sdp = format!(
            "v=0\r\no=- 4611731400430051336 {} IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n",
            state.session_version
        );
        for (mid, transceiver) in state.transceivers.iter().enumerate() {
            let direction = match transceiver.direction() {
                TransceiverDirection::Sendrecv => "sendrecv",
                TransceiverDirection::Sendonly => "sendonly",
                TransceiverDirection::Recvonly => "recvonly",
                TransceiverDirection::Inactive => "inactive",
            };
            match transceiver.kind {
                MediaKind::Audio => {
                    sdp.push_str("m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n");
                    sdp.push_str(&format!("a=mid:{}\r\na={}\r\n", mid, direction));
                    sdp.push_str("a=rtpmap:111 opus/48000/2\r\n");
                }
                MediaKind::Video => {
                    sdp.push_str("m=video 9 UDP/TLS/RTP/SAVPF 96 97\r\n");
                    sdp.push_str(&format!("a=mid:{}\r\na={}\r\n", mid, direction));
                    sdp.push_str("a=rtpmap:96 VP8/90000\r\na=rtpmap:97 rtx/90000\r\n");
                    sdp.push_str("a=ssrc-group:FID 1111 2222\r\n");
                    sdp.push_str("a=ssrc:1111 cname:fake\r\na=ssrc:2222 cname:fake\r\n");
                }
            }
        }
        sdp
    }
}

#[async_trait]
impl NativePeerConnection for FakePeerConnection {
    fn signaling_state(&self) -> SignalingState {
        lock(&self.state).signaling.unwrap_or(SignalingState::Stable)
    }

    fn local_description(&self) -> Option<SessionDescription> {
        lock(&self.state).local.clone()
    }

    fn remote_description(&self) -> Option<SessionDescription> {
        lock(&self.state).remote.clone()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<NativeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.state).subscribers.push(tx);
        rx
    }

    async fn create_offer(&self) -> anyhow::Result<SessionDescription> {
        self.check_open("createOffer")?;
        Ok(SessionDescription::offer(self.render_sdp()))
    }

    async fn create_answer(&self) -> anyhow::Result<SessionDescription> {
        self.check_open("createAnswer")?;
        if self.signaling_state() != SignalingState::HaveRemoteOffer {
            bail!("InvalidStateError: no remote offer to answer");
        }
        Ok(SessionDescription::answer(self.render_sdp()))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> anyhow::Result<()> {
        self.check_open("setLocalDescription")?;
        let next = match desc.sdp_type {
            SdpType::Offer => SignalingState::HaveLocalOffer,
            SdpType::Answer => SignalingState::Stable,
            SdpType::Pranswer => SignalingState::HaveLocalPranswer,
            SdpType::Rollback => SignalingState::Stable,
        };
        lock(&self.state).local = Some(desc);
        self.transition(next);
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> anyhow::Result<()> {
        self.check_open("setRemoteDescription")?;
        let next = match desc.sdp_type {
            SdpType::Offer => SignalingState::HaveRemoteOffer,
            SdpType::Answer => SignalingState::Stable,
            SdpType::Pranswer => SignalingState::HaveRemotePranswer,
            SdpType::Rollback => SignalingState::Stable,
        };
        lock(&self.state).remote = Some(desc);
        self.transition(next);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()> {
        self.check_open("addIceCandidate")?;
        lock(&self.state).applied.push(candidate);
        Ok(())
    }

    fn add_transceiver(
        &self,
        kind: MediaKind,
        direction: TransceiverDirection,
    ) -> anyhow::Result<Arc<dyn NativeTransceiver>> {
        self.check_open("addTransceiver")?;
        let transceiver = Arc::new(FakeTransceiver {
            kind,
            direction: Mutex::new(direction),
        });
        lock(&self.state).transceivers.push(transceiver.clone());
        Ok(transceiver)
    }

    fn transceivers(&self) -> Vec<Arc<dyn NativeTransceiver>> {
        lock(&self.state)
            .transceivers
            .iter()
            .map(|t| t.clone() as Arc<dyn NativeTransceiver>)
            .collect()
    }

    fn add_track(&self, track: Arc<dyn MediaTrack>, _stream_id: &str) -> anyhow::Result<()> {
        self.check_open("addTrack")?;
        let mut state = lock(&self.state);
        state.transceivers.push(Arc::new(FakeTransceiver {
            kind: track.kind(),
            direction: Mutex::new(TransceiverDirection::Sendrecv),
        }));
        state.senders.push(track);
        Ok(())
    }

    fn sender_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        lock(&self.state).senders.clone()
    }

    fn receiver_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        lock(&self.state).receivers.clone()
    }

    fn create_data_channel(
        &self,
        label: &str,
        options: &DataChannelOptions,
        handlers: DataChannelHandlers,
    ) -> anyhow::Result<Arc<dyn NativeDataChannel>> {
        self.check_open("createDataChannel")?;
        let channel = Arc::new(FakeDataChannel {
            label: label.to_string(),
            options: options.clone(),
            state: Mutex::new(DataChannelState::Connecting),
            sent: Mutex::new(Vec::new()),
            handlers: Mutex::new(handlers),
        });
        lock(&self.state).data_channels.push(channel.clone());
        Ok(channel)
    }

    async fn close(&self) -> anyhow::Result<()> {
        let mut state = lock(&self.state);
        state.signaling = Some(SignalingState::Closed);
        state.close_count += 1;
        Ok(())
    }
}

/// Creates [`FakePeerConnection`]s and remembers them.
#[derive(Default)]
pub struct FakeFactory {
    created: Mutex<Vec<(RTCConfiguration, Arc<FakePeerConnection>)>>,
    failures: Mutex<Vec<(String, String)>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> Vec<Arc<FakePeerConnection>> {
        lock(&self.created).iter().map(|(_, pc)| pc.clone()).collect()
    }

    pub fn configurations(&self) -> Vec<RTCConfiguration> {
        lock(&self.created).iter().map(|(c, _)| c.clone()).collect()
    }

    /// Arm `op` to fail on every connection created from now on.
    pub fn fail_next(&self, op: &str, message: &str) {
        lock(&self.failures).push((op.to_string(), message.to_string()));
    }
}

#[async_trait]
impl PeerConnectionFactory for FakeFactory {
    async fn create(&self, config: &RTCConfiguration) -> anyhow::Result<Arc<dyn NativePeerConnection>> {
        let pc = FakePeerConnection::new();
        for (op, message) in lock(&self.failures).iter() {
            pc.fail_next(op, message);
        }
        lock(&self.created).push((config.clone(), pc.clone()));
        Ok(pc)
    }
}

pub struct FakeDataChannel {
    label: String,
    options: DataChannelOptions,
    state: Mutex<DataChannelState>,
    sent: Mutex<Vec<Bytes>>,
    handlers: Mutex<DataChannelHandlers>,
}

impl FakeDataChannel {
    pub fn options(&self) -> DataChannelOptions {
        self.options.clone()
    }

    pub fn sent(&self) -> Vec<Bytes> {
        lock(&self.sent).clone()
    }

    /// Mark the channel open and fire `on_open`.
    pub fn open(&self) {
        *lock(&self.state) = DataChannelState::Open;
        if let Some(on_open) = lock(&self.handlers).on_open.as_mut() {
            on_open();
        }
    }

    pub fn deliver(&self, data: Bytes) {
        if let Some(on_message) = lock(&self.handlers).on_message.as_mut() {
            on_message(data);
        }
    }

    pub fn fail(&self, message: &str) {
        if let Some(on_error) = lock(&self.handlers).on_error.as_mut() {
            on_error(message.to_string());
        }
    }
}

impl NativeDataChannel for FakeDataChannel {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn ready_state(&self) -> DataChannelState {
        *lock(&self.state)
    }

    fn send(&self, data: Bytes) -> anyhow::Result<()> {
        if self.ready_state() != DataChannelState::Open {
            bail!("InvalidStateError: data channel is not open");
        }
        lock(&self.sent).push(data);
        Ok(())
    }

    fn close(&self) -> anyhow::Result<()> {
        *lock(&self.state) = DataChannelState::Closed;
        if let Some(on_close) = lock(&self.handlers).on_close.as_mut() {
            on_close();
        }
        Ok(())
    }
}

/// One capture request seen by [`FakeMediaDevices`]
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    UserMedia(MediaConstraints),
    DisplayMedia(MediaConstraints),
}

/// Capture devices that hand out fake tracks.
///
/// User media yields a 640x480 camera and/or a microphone depending on the
/// constraints; display media yields a 1920x1080 screen at 15 fps.
#[derive(Default)]
pub struct FakeMediaDevices {
    calls: Mutex<Vec<MediaCall>>,
    denied: Mutex<Option<String>>,
    mixers: Mutex<Vec<Arc<FakeMixer>>>,
    counter: AtomicUsize,
}

impl FakeMediaDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        lock(&self.calls).clone()
    }

    /// Reject every later capture with `message`.
    pub fn deny(&self, message: &str) {
        *lock(&self.denied) = Some(message.to_string());
    }

    pub fn mixers_created(&self) -> usize {
        lock(&self.mixers).len()
    }

    pub fn mixers(&self) -> Vec<Arc<FakeMixer>> {
        lock(&self.mixers).clone()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.counter.fetch_add(1, Ordering::SeqCst))
    }

    fn check_denied(&self) -> anyhow::Result<()> {
        match lock(&self.denied).as_ref() {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn get_user_media(&self, constraints: &MediaConstraints) -> anyhow::Result<MediaStream> {
        lock(&self.calls).push(MediaCall::UserMedia(constraints.clone()));
        self.check_denied()?;

        let mut stream = MediaStream::new(self.next_id("user"));
        if constraints.audio.is_requested() {
            stream.add_track(FakeTrack::audio(&self.next_id("mic")));
        }
        if constraints.video.is_requested() {
            stream.add_track(FakeTrack::video(&self.next_id("cam")));
        }
        Ok(stream)
    }

    async fn get_display_media(&self, constraints: &MediaConstraints) -> anyhow::Result<MediaStream> {
        lock(&self.calls).push(MediaCall::DisplayMedia(constraints.clone()));
        self.check_denied()?;

        let screen = FakeTrack::video_with_settings(
            &self.next_id("screen"),
            TrackSettings {
                width: Some(1920),
                height: Some(1080),
                frame_rate: Some(15.0),
            },
        );
        Ok(MediaStream::with_tracks(self.next_id("display"), vec![screen]))
    }

    fn create_mixer(
        &self,
        inputs: Vec<MixerInput>,
        frame_interval: Option<f64>,
    ) -> anyhow::Result<Arc<dyn StreamMixer>> {
        let mut output = MediaStream::new(self.next_id("mixed"));
        output.add_track(FakeTrack::video(&self.next_id("canvas")));
        for input in &inputs {
            for track in input.stream.audio_tracks() {
                output.add_track(track);
            }
        }

        let mixer = Arc::new(FakeMixer {
            inputs,
            frame_interval,
            output,
            drawing: AtomicBool::new(false),
            released: AtomicBool::new(false),
        });
        lock(&self.mixers).push(mixer.clone());
        Ok(mixer)
    }
}

pub struct FakeMixer {
    inputs: Vec<MixerInput>,
    frame_interval: Option<f64>,
    output: MediaStream,
    drawing: AtomicBool,
    released: AtomicBool,
}

impl FakeMixer {
    pub fn inputs(&self) -> &[MixerInput] {
        &self.inputs
    }

    pub fn frame_interval(&self) -> Option<f64> {
        self.frame_interval
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl StreamMixer for FakeMixer {
    fn start_drawing_frames(&self) {
        self.drawing.store(true, Ordering::SeqCst);
    }

    fn mixed_stream(&self) -> MediaStream {
        self.output.clone()
    }

    fn release_streams(&self) {
        self.drawing.store(false, Ordering::SeqCst);
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Media element double. Autoplays when given a source.
pub struct FakeSurface {
    source: Mutex<Option<MediaStream>>,
    paused: AtomicBool,
    loads: AtomicUsize,
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self {
            source: Mutex::new(None),
            paused: AtomicBool::new(true),
            loads: AtomicUsize::new(0),
        }
    }
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn source(&self) -> Option<MediaStream> {
        lock(&self.source).clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl RenderSurface for FakeSurface {
    fn set_source(&self, stream: Option<MediaStream>) {
        let playing = stream.is_some();
        *lock(&self.source) = stream;
        self.paused.store(!playing, Ordering::SeqCst);
    }

    fn has_source(&self) -> bool {
        lock(&self.source).is_some()
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn load(&self) {
        self.loads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Marker-based plan translation.
///
/// Plan-B descriptions carry an `a=x-plan-b` line; candidates are tagged
/// through their `sdpMid`.
#[derive(Default)]
pub struct FakeInterop {
    conversions: AtomicUsize,
}

impl FakeInterop {
    pub const PLAN_B_MARKER: &'static str = "a=x-plan-b\r\n";

    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn conversions(&self) -> usize {
        self.conversions.load(Ordering::SeqCst)
    }
}

impl SdpInterop for FakeInterop {
    fn to_plan_b(&self, desc: SessionDescription) -> SessionDescription {
        self.conversions.fetch_add(1, Ordering::SeqCst);
        SessionDescription {
            sdp_type: desc.sdp_type,
            sdp: format!("{}{}", desc.sdp, Self::PLAN_B_MARKER),
        }
    }

    fn to_unified_plan(&self, desc: SessionDescription) -> SessionDescription {
        self.conversions.fetch_add(1, Ordering::SeqCst);
        SessionDescription {
            sdp_type: desc.sdp_type,
            sdp: desc.sdp.replace(Self::PLAN_B_MARKER, ""),
        }
    }

    fn candidate_to_plan_b(&self, mut candidate: IceCandidate) -> IceCandidate {
        candidate.sdp_mid = Some("plan-b".to_string());
        candidate
    }

    fn candidate_to_unified_plan(&self, mut candidate: IceCandidate) -> IceCandidate {
        candidate.sdp_mid = Some("unified".to_string());
        candidate
    }
}
