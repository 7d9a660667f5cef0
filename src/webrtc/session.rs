//! Negotiation coordinator around one native peer connection.

use crate::config::PeerOptions;
use crate::errors::PeerError;
use crate::media::{acquire, AcquiredMedia, MediaStream};
use crate::platform::{
    DataChannelHandlers, MediaDevices, NativeDataChannel, NativePeerConnection,
    PeerConnectionFactory, PlatformInfo, RenderSurface, SdpInterop,
};
use crate::webrtc::candidates::CandidateTicket;
use crate::webrtc::events::{CandidateListener, EventHub, PeerEvent, SignalListener};
use crate::webrtc::mode::PeerMode;
use crate::webrtc::peer::{
    DataChannelState, IceCandidate, MediaKind, SessionDescription, SignalingState,
    TransceiverDirection,
};
use crate::webrtc::simulcast;
use crate::webrtc::worker::{Command, NegotiationWorker, QueueDepth};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Builder for [`PeerSession`].
///
/// Takes the serializable [`PeerOptions`] plus every host object the session
/// talks to.
pub struct PeerSessionBuilder {
    mode: PeerMode,
    options: PeerOptions,
    platform: PlatformInfo,
    peer_connection: Option<Arc<dyn NativePeerConnection>>,
    factory: Option<Arc<dyn PeerConnectionFactory>>,
    media_devices: Option<Arc<dyn MediaDevices>>,
    interop: Option<Arc<dyn SdpInterop>>,
    local_video: Option<Arc<dyn RenderSurface>>,
    remote_video: Option<Arc<dyn RenderSurface>>,
    remote_audio: Option<Arc<dyn RenderSurface>>,
    data_channel_handlers: DataChannelHandlers,
    candidate_listeners: Vec<CandidateListener>,
    gathering_done_listeners: Vec<SignalListener>,
    negotiation_listeners: Vec<SignalListener>,
}

impl PeerSessionBuilder {
    pub fn new(mode: PeerMode) -> Self {
        Self {
            mode,
            options: PeerOptions::default(),
            platform: PlatformInfo::default(),
            peer_connection: None,
            factory: None,
            media_devices: None,
            interop: None,
            local_video: None,
            remote_video: None,
            remote_audio: None,
            data_channel_handlers: DataChannelHandlers::default(),
            candidate_listeners: Vec::new(),
            gathering_done_listeners: Vec::new(),
            negotiation_listeners: Vec::new(),
        }
    }

    pub fn options(mut self, options: PeerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn platform(mut self, platform: PlatformInfo) -> Self {
        self.platform = platform;
        self
    }

    /// Use an existing connection instead of creating one.
    pub fn peer_connection(mut self, pc: Arc<dyn NativePeerConnection>) -> Self {
        self.peer_connection = Some(pc);
        self
    }

    pub fn connection_factory(mut self, factory: Arc<dyn PeerConnectionFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn media_devices(mut self, devices: Arc<dyn MediaDevices>) -> Self {
        self.media_devices = Some(devices);
        self
    }

    pub fn sdp_interop(mut self, interop: Arc<dyn SdpInterop>) -> Self {
        self.interop = Some(interop);
        self
    }

    pub fn local_video(mut self, surface: Arc<dyn RenderSurface>) -> Self {
        self.local_video = Some(surface);
        self
    }

    pub fn remote_video(mut self, surface: Arc<dyn RenderSurface>) -> Self {
        self.remote_video = Some(surface);
        self
    }

    pub fn remote_audio(mut self, surface: Arc<dyn RenderSurface>) -> Self {
        self.remote_audio = Some(surface);
        self
    }

    pub fn data_channel_handlers(mut self, handlers: DataChannelHandlers) -> Self {
        self.data_channel_handlers = handlers;
        self
    }

    pub fn on_ice_candidate<F>(mut self, f: F) -> Self
    where
        F: FnMut(IceCandidate) + Send + 'static,
    {
        self.candidate_listeners.push(Box::new(f));
        self
    }

    pub fn on_candidate_gathering_done<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.gathering_done_listeners.push(Box::new(f));
        self
    }

    pub fn on_negotiation_needed<F>(mut self, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.negotiation_listeners.push(Box::new(f));
        self
    }

    /// Create the session: resolve the connection, capture local media and
    /// attach it.
    pub async fn build(mut self) -> Result<PeerSession, PeerError> {
        self.options
            .validate(self.mode)
            .map_err(PeerError::InvalidConfiguration)?;

        let id = self
            .options
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let (pc, created) = match (self.peer_connection.take(), &self.factory) {
            (Some(pc), _) => (pc, false),
            (None, Some(factory)) => {
                let configuration = self.options.effective_configuration();
                let pc = factory
                    .create(&configuration)
                    .await
                    .map_err(PeerError::platform)?;
                (pc, true)
            }
            (None, None) => {
                return Err(PeerError::InvalidConfiguration(
                    "either a peer connection or a connection factory is required".to_string(),
                ))
            }
        };

        match self.assemble(id, pc.clone(), created).await {
            Ok(session) => Ok(session),
            Err(e) => {
                if created {
                    if let Err(close_err) = pc.close().await {
                        log::warn!("Failed to close connection after setup error: {}", close_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// Everything after the connection exists. Errors leave closing a
    /// connection we created to the caller.
    async fn assemble(
        self,
        id: String,
        pc: Arc<dyn NativePeerConnection>,
        created: bool,
    ) -> Result<PeerSession, PeerError> {
        let mut data_channel = None;
        if created && self.options.data_channels {
            let dc_config = self.options.data_channel_config.clone().unwrap_or_default();
            let label = dc_config
                .id
                .clone()
                .unwrap_or_else(|| format!("WebRtcPeer-{}", id));
            let handlers = self.data_channel_handlers.with_default_error_handler(&label);
            let channel = pc
                .create_data_channel(&label, &dc_config.options, handlers)
                .map_err(PeerError::platform)?;
            log::debug!("Created data channel '{}' for session {}", label, id);
            data_channel = Some(channel);
        }

        let interop = if self.options.multistream && self.platform.uses_plan_b() {
            if self.interop.is_none() {
                log::warn!("Multistream on a Plan B host without SDP interop; SDP is passed through");
            }
            self.interop
        } else {
            None
        };

        let mut local = None;
        if self.mode.sends() {
            if let Some(source) = self.options.send_source {
                let devices = self.media_devices.as_ref().ok_or_else(|| {
                    PeerError::InvalidConfiguration(format!(
                        "send source '{}' requires media devices",
                        source
                    ))
                })?;
                local = Some(
                    acquire(
                        devices.as_ref(),
                        &self.platform,
                        source,
                        self.options.media_constraints.as_ref(),
                    )
                    .await?,
                );
            }
        }

        let gathering_done = Arc::new(AtomicBool::new(false));
        let mut hub = EventHub::new(gathering_done.clone());
        for listener in self.candidate_listeners {
            hub.add_candidate_listener(listener);
        }
        for listener in self.gathering_done_listeners {
            hub.add_gathering_done_listener(listener);
        }
        for listener in self.negotiation_listeners {
            hub.add_negotiation_listener(listener);
        }

        let (commands, command_rx) = mpsc::unbounded_channel();
        let worker = NegotiationWorker::new(
            id.clone(),
            pc.clone(),
            interop.clone(),
            hub,
            command_rx,
            pc.subscribe(),
        );
        tokio::spawn(worker.run());

        let session = PeerSession {
            id,
            mode: self.mode,
            options: self.options,
            platform: self.platform,
            pc,
            data_channel,
            interop,
            local,
            local_video: self.local_video,
            remote_video: self.remote_video,
            remote_audio: self.remote_audio,
            commands,
            gathering_done,
            disposed: AtomicBool::new(false),
        };
        if let Err(e) = session.start() {
            if let Some(media) = &session.local {
                media.stream.stop();
            }
            return Err(e);
        }

        log::info!("Peer session {} created ({})", session.id, session.mode);
        Ok(session)
    }
}

/// Snapshot of a session's negotiation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSessionStats {
    pub session_id: String,
    pub mode: PeerMode,
    pub signaling_state: SignalingState,
    pub queued_remote_candidates: usize,
    pub queued_local_candidates: usize,
    pub candidate_gathering_done: bool,
    pub has_local_description: bool,
    pub has_remote_description: bool,
    pub data_channel_state: Option<DataChannelState>,
}

/// WebRTC peer session: one native connection plus its negotiation state.
pub struct PeerSession {
    id: String,
    mode: PeerMode,
    options: PeerOptions,
    platform: PlatformInfo,
    pc: Arc<dyn NativePeerConnection>,
    data_channel: Option<Arc<dyn NativeDataChannel>>,
    /// Set only for multistream sessions on Plan-B hosts.
    interop: Option<Arc<dyn SdpInterop>>,
    local: Option<AcquiredMedia>,
    local_video: Option<Arc<dyn RenderSurface>>,
    remote_video: Option<Arc<dyn RenderSurface>>,
    remote_audio: Option<Arc<dyn RenderSurface>>,
    commands: mpsc::UnboundedSender<Command>,
    gathering_done: Arc<AtomicBool>,
    disposed: AtomicBool,
}

/// Consumes the answer to an offer produced by [`PeerSession::generate_offer`].
pub struct AnswerHandle<'a> {
    session: &'a PeerSession,
}

impl AnswerHandle<'_> {
    pub async fn process(self, sdp_answer: &str) -> Result<(), PeerError> {
        self.session.process_answer(sdp_answer).await
    }
}

impl PeerSession {
    pub fn recvonly() -> PeerSessionBuilder {
        PeerSessionBuilder::new(PeerMode::Recvonly)
    }

    pub fn sendonly() -> PeerSessionBuilder {
        PeerSessionBuilder::new(PeerMode::Sendonly)
    }

    pub fn sendrecv() -> PeerSessionBuilder {
        PeerSessionBuilder::new(PeerMode::Sendrecv)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> PeerMode {
        self.mode
    }

    pub fn options(&self) -> &PeerOptions {
        &self.options
    }

    pub fn peer_connection(&self) -> &Arc<dyn NativePeerConnection> {
        &self.pc
    }

    pub fn data_channel(&self) -> Option<&Arc<dyn NativeDataChannel>> {
        self.data_channel.as_ref()
    }

    pub fn mixer(&self) -> Option<&Arc<dyn crate::platform::StreamMixer>> {
        self.local.as_ref().and_then(|m| m.mixer.as_ref())
    }

    pub fn signaling_state(&self) -> SignalingState {
        self.pc.signaling_state()
    }

    pub fn candidate_gathering_done(&self) -> bool {
        self.gathering_done.load(Ordering::SeqCst)
    }

    pub fn local_session_descriptor(&self) -> Option<SessionDescription> {
        self.pc.local_description()
    }

    pub fn remote_session_descriptor(&self) -> Option<SessionDescription> {
        self.pc.remote_description()
    }

    fn start(&self) -> Result<(), PeerError> {
        if self.pc.signaling_state() == SignalingState::Closed {
            return Err(PeerError::ConnectionClosed(
                "The peer connection object is in \"closed\" state. This is most likely due to an invocation of the dispose method before accepting in the dialogue".to_string(),
            ));
        }

        self.set_local_stream();
        if let Some(media) = &self.local {
            for track in media.stream.tracks() {
                self.pc
                    .add_track(track.clone(), media.stream.id())
                    .map_err(PeerError::platform)?;
            }
        }
        Ok(())
    }

    /// Show the captured stream on the local surface.
    pub fn set_local_stream(&self) {
        if let (Some(media), Some(surface)) = (&self.local, &self.local_video) {
            surface.set_source(Some(media.stream.clone()));
        }
    }

    /// Submit a remote candidate received through signaling.
    ///
    /// The returned ticket resolves once the candidate reached the native
    /// connection, or failed to.
    pub fn add_ice_candidate(&self, candidate: IceCandidate) -> CandidateTicket {
        let candidate = match &self.interop {
            Some(interop) => interop.candidate_to_plan_b(candidate),
            None => candidate,
        };
        log::debug!("Remote ICE candidate received: {}", candidate.candidate);

        let (completion, ticket) = CandidateTicket::new();
        if let Err(mpsc::error::SendError(Command::AddCandidate(_, completion))) =
            self.commands.send(Command::AddCandidate(candidate, completion))
        {
            let _ = completion.send(Err(PeerError::closed()));
        }
        ticket
    }

    pub fn on_ice_candidate<F>(&self, f: F)
    where
        F: FnMut(IceCandidate) + Send + 'static,
    {
        self.register(Command::OnIceCandidate(Box::new(f)));
    }

    pub fn on_candidate_gathering_done<F>(&self, f: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.register(Command::OnGatheringDone(Box::new(f)));
    }

    pub fn on_negotiation_needed<F>(&self, f: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.register(Command::OnNegotiationNeeded(Box::new(f)));
    }

    pub fn on_dispose<F>(&self, f: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.register(Command::OnDispose(Box::new(f)));
    }

    /// Stream of every outbound event, as an alternative to callbacks.
    ///
    /// Registers one listener of each kind, so queued local candidates are
    /// replayed into the stream like they would be to a callback.
    pub fn events(&self) -> mpsc::UnboundedReceiver<PeerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        let sink = tx.clone();
        self.on_ice_candidate(move |c| {
            let _ = sink.send(PeerEvent::IceCandidate(c));
        });
        let sink = tx.clone();
        self.on_candidate_gathering_done(move || {
            let _ = sink.send(PeerEvent::CandidateGatheringDone);
        });
        let sink = tx.clone();
        self.on_negotiation_needed(move || {
            let _ = sink.send(PeerEvent::NegotiationNeeded);
        });
        self.on_dispose(move || {
            let _ = tx.send(PeerEvent::Disposed);
        });
        rx
    }

    fn register(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("Listener registered on disposed session {}", self.id);
        }
    }

    /// Create the local offer.
    ///
    /// Returns the offer text and a handle to feed the remote answer into.
    pub async fn generate_offer(&self) -> Result<(String, AnswerHandle<'_>), PeerError> {
        match self.mode {
            PeerMode::Recvonly => {
                // Receivers have no local tracks; ask for each wanted kind explicitly.
                for kind in [MediaKind::Audio, MediaKind::Video] {
                    let wanted = self
                        .options
                        .media_constraints
                        .as_ref()
                        .map_or(true, |c| c.wants(kind));
                    if wanted {
                        self.pc
                            .add_transceiver(kind, TransceiverDirection::Recvonly)
                            .map_err(PeerError::negotiation)?;
                    }
                }
            }
            PeerMode::Sendonly => {
                for transceiver in self.pc.transceivers() {
                    transceiver.set_direction(TransceiverDirection::Sendonly);
                }
            }
            PeerMode::Sendrecv => {}
        }

        let offer = self.pc.create_offer().await.map_err(PeerError::negotiation)?;
        log::debug!("Created SDP offer");
        let offer = self.mangle_sdp_to_add_simulcast(offer);
        self.pc
            .set_local_description(offer)
            .await
            .map_err(PeerError::negotiation)?;

        let local = self.read_local_description()?;
        log::debug!("Local description set\n{}", local.sdp);
        let local = match &self.interop {
            Some(interop) => {
                let unified = interop.to_unified_plan(local);
                log::debug!("offer::origPlanB->UnifiedPlan {}", unified.dump());
                unified
            }
            None => local,
        };

        Ok((local.sdp, AnswerHandle { session: self }))
    }

    /// Apply a remote offer and return the local answer text.
    pub async fn process_offer(&self, sdp_offer: &str) -> Result<String, PeerError> {
        let mut offer = SessionDescription::offer(sdp_offer);
        if let Some(interop) = &self.interop {
            offer = interop.to_plan_b(offer);
            log::debug!("offer::planB {}", offer.dump());
        }

        log::debug!("SDP offer received, setting remote description");
        if self.pc.signaling_state() == SignalingState::Closed {
            return Err(PeerError::ConnectionClosed("PeerConnection is closed".to_string()));
        }

        self.pc
            .set_remote_description(offer)
            .await
            .map_err(PeerError::negotiation)?;
        self.set_remote_stream();

        let answer = self.pc.create_answer().await.map_err(PeerError::negotiation)?;
        let answer = self.mangle_sdp_to_add_simulcast(answer);
        log::debug!("Created SDP answer");
        self.pc
            .set_local_description(answer)
            .await
            .map_err(PeerError::negotiation)?;

        let local = self.read_local_description()?;
        let local = match &self.interop {
            Some(interop) => {
                let unified = interop.to_unified_plan(local);
                log::debug!("answer::origPlanB->UnifiedPlan {}", unified.dump());
                unified
            }
            None => local,
        };
        log::debug!("Local description set\n{}", local.sdp);
        Ok(local.sdp)
    }

    /// Apply the remote answer to a previously generated offer.
    pub async fn process_answer(&self, sdp_answer: &str) -> Result<(), PeerError> {
        let mut answer = SessionDescription::answer(sdp_answer);
        if let Some(interop) = &self.interop {
            answer = interop.to_plan_b(answer);
            log::debug!("answer::planB {}", answer.dump());
        }

        log::debug!("SDP answer received, setting remote description");
        if self.pc.signaling_state() == SignalingState::Closed {
            return Err(PeerError::ConnectionClosed("PeerConnection is closed".to_string()));
        }

        self.pc
            .set_remote_description(answer)
            .await
            .map_err(PeerError::negotiation)?;
        self.set_remote_stream();
        Ok(())
    }

    fn read_local_description(&self) -> Result<SessionDescription, PeerError> {
        self.pc.local_description().ok_or_else(|| {
            PeerError::NegotiationFailure("local description missing after it was set".to_string())
        })
    }

    fn mangle_sdp_to_add_simulcast(&self, desc: SessionDescription) -> SessionDescription {
        if !self.options.simulcast {
            return desc;
        }
        if !self.platform.supports_simulcast() {
            log::warn!("Simulcast is only available in Chrome browser.");
            return desc;
        }
        let Some(media) = &self.local else {
            log::warn!("Simulcast requested without a local video stream");
            return desc;
        };

        log::debug!("Adding multicast info");
        SessionDescription {
            sdp_type: desc.sdp_type,
            sdp: simulcast::add_simulcast(&desc.sdp, &media.stream.metadata()),
        }
    }

    /// Route the received tracks to the remote surfaces, one kind each.
    fn set_remote_stream(&self) {
        let Some(remote) = self.remote_stream(0) else {
            log::debug!("No remote tracks to attach for session {}", self.id);
            return;
        };

        if let Some(surface) = &self.remote_video {
            surface.pause();
            match remote.video_tracks().into_iter().next() {
                Some(track) => {
                    let stream = MediaStream::with_tracks(uuid::Uuid::new_v4().to_string(), vec![track]);
                    surface.set_source(Some(stream));
                    surface.load();
                }
                None => log::warn!("Remote stream has no video track for the video surface"),
            }
        }

        if let Some(surface) = &self.remote_audio {
            let was_paused = surface.is_paused() && surface.has_source();
            match remote.audio_tracks().into_iter().next() {
                Some(track) => {
                    let stream = MediaStream::with_tracks(uuid::Uuid::new_v4().to_string(), vec![track]);
                    surface.set_source(Some(stream));
                    surface.load();
                    if was_paused {
                        surface.pause();
                    }
                }
                None => log::warn!("Remote stream has no audio track for the audio surface"),
            }
        }
    }

    /// Send over the session's data channel.
    ///
    /// A missing or non-open channel is logged and the payload dropped.
    pub fn send(&self, data: impl Into<Bytes>) {
        match &self.data_channel {
            Some(channel) if channel.ready_state() == DataChannelState::Open => {
                if let Err(e) = channel.send(data.into()) {
                    log::error!("Failed to send over data channel '{}': {:#}", channel.label(), e);
                }
            }
            _ => {
                let err = PeerError::ChannelUnavailable(
                    "Trying to send data over a non-existing or closed data channel".to_string(),
                );
                log::warn!("{}", err);
            }
        }
    }

    /// Local streams: sender tracks, plus the mixer's sources while mixing.
    pub fn local_streams(&self) -> Vec<MediaStream> {
        let mut streams = Vec::new();
        let senders = self.pc.sender_tracks();
        if !senders.is_empty() {
            let id = self
                .local
                .as_ref()
                .map(|m| m.stream.id().to_string())
                .unwrap_or_else(|| format!("{}-local", self.id));
            streams.push(MediaStream::with_tracks(id, senders));
        }
        if let Some(media) = &self.local {
            if let Some(screen) = &media.screen_stream {
                streams.push(screen.clone());
            }
            if let Some(camera) = &media.camera_stream {
                streams.push(camera.clone());
            }
        }
        streams
    }

    pub fn local_stream(&self, index: usize) -> Option<MediaStream> {
        self.local_streams().into_iter().nth(index)
    }

    pub fn remote_stream(&self, index: usize) -> Option<MediaStream> {
        let receivers = self.pc.receiver_tracks();
        if receivers.is_empty() || index > 0 {
            return None;
        }
        Some(MediaStream::with_tracks(format!("{}-remote", self.id), receivers))
    }

    fn kind_enabled(&self, kind: MediaKind) -> Option<bool> {
        let streams = self.local_streams();
        if streams.is_empty() {
            return None;
        }
        let all_enabled = streams
            .iter()
            .flat_map(|s| s.tracks_of(kind))
            .all(|t| t.enabled());
        Some(all_enabled)
    }

    fn set_kind_enabled(&self, kind: MediaKind, enabled: bool) {
        for stream in self.local_streams() {
            for track in stream.tracks_of(kind) {
                track.set_enabled(enabled);
            }
        }
    }

    /// `None` when there is no local stream at all.
    pub fn audio_enabled(&self) -> Option<bool> {
        self.kind_enabled(MediaKind::Audio)
    }

    pub fn set_audio_enabled(&self, enabled: bool) {
        self.set_kind_enabled(MediaKind::Audio, enabled);
    }

    pub fn video_enabled(&self) -> Option<bool> {
        self.kind_enabled(MediaKind::Video)
    }

    pub fn set_video_enabled(&self, enabled: bool) {
        self.set_kind_enabled(MediaKind::Video, enabled);
    }

    pub fn enabled(&self) -> Option<bool> {
        match (self.audio_enabled(), self.video_enabled()) {
            (Some(audio), Some(video)) => Some(audio && video),
            _ => None,
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.set_audio_enabled(enabled);
        self.set_video_enabled(enabled);
    }

    pub async fn stats(&self) -> PeerSessionStats {
        let (tx, rx) = oneshot::channel();
        let depth = if self.commands.send(Command::QueueDepth(tx)).is_ok() {
            rx.await.unwrap_or_default()
        } else {
            QueueDepth::default()
        };

        PeerSessionStats {
            session_id: self.id.clone(),
            mode: self.mode,
            signaling_state: self.pc.signaling_state(),
            queued_remote_candidates: depth.remote,
            queued_local_candidates: depth.local,
            candidate_gathering_done: self.candidate_gathering_done(),
            has_local_description: self.pc.local_description().is_some(),
            has_remote_description: self.pc.remote_description().is_some(),
            data_channel_state: self.data_channel.as_ref().map(|dc| dc.ready_state()),
        }
    }

    /// Release everything the session holds.
    ///
    /// Safe to call more than once; only the first call tears anything down.
    /// If the connection or data channel was already closed, the surfaces are
    /// left alone and no dispose signal fires. Failures are logged, never
    /// returned.
    pub async fn dispose(&self) {
        log::debug!("Disposing peer session {}", self.id);
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let released = self.release_native().await;
        if released {
            if let Some(mixer) = self.mixer() {
                mixer.release_streams();
            }
            for surface in [&self.local_video, &self.remote_video].into_iter().flatten() {
                surface.pause();
                surface.set_source(None);
                surface.load();
            }
        } else {
            log::debug!("Peer session {} was already closed", self.id);
        }

        let (ack, done) = oneshot::channel();
        let shutdown = Command::Shutdown {
            notify: released,
            ack,
        };
        if self.commands.send(shutdown).is_ok() {
            let _ = done.await;
        }
        log::info!("Peer session {} disposed", self.id);
    }

    /// Close the data channel, stop local tracks and close the connection.
    ///
    /// Returns `false` if the native side was already closed.
    async fn release_native(&self) -> bool {
        if let Some(channel) = &self.data_channel {
            if channel.ready_state() == DataChannelState::Closed {
                return false;
            }
            if let Err(e) = channel.close() {
                log::warn!("Exception disposing webrtc peer: {:#}", e);
            }
        }

        if self.pc.signaling_state() == SignalingState::Closed {
            return false;
        }
        for stream in self.local_streams() {
            stream.stop();
        }
        if let Err(e) = self.pc.close().await {
            log::warn!("Exception disposing webrtc peer: {:#}", e);
        }
        true
    }
}
