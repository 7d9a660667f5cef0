//! Per-session task that serializes candidate handling and event delivery.
//!
//! Remote candidates, listener registrations and native connection events all
//! pass through one task, so queue order is the order in which they were
//! submitted without any lock around the queue.

use crate::errors::PeerError;
use crate::platform::{NativeEvent, NativePeerConnection, SdpInterop};
use crate::webrtc::candidates::{CandidateBuffer, Completion};
use crate::webrtc::events::{CandidateListener, EventHub, SignalListener};
use crate::webrtc::peer::IceCandidate;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

pub(crate) enum Command {
    AddCandidate(IceCandidate, Completion),
    OnIceCandidate(CandidateListener),
    OnGatheringDone(SignalListener),
    OnNegotiationNeeded(SignalListener),
    OnDispose(SignalListener),
    QueueDepth(oneshot::Sender<QueueDepth>),
    /// Stop the worker; `notify` fires the dispose listeners first.
    Shutdown {
        notify: bool,
        ack: oneshot::Sender<()>,
    },
}

/// Number of candidates waiting in each direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct QueueDepth {
    pub remote: usize,
    pub local: usize,
}

pub(crate) struct NegotiationWorker {
    session_id: String,
    pc: Arc<dyn NativePeerConnection>,
    interop: Option<Arc<dyn SdpInterop>>,
    buffer: CandidateBuffer,
    hub: EventHub,
    commands: mpsc::UnboundedReceiver<Command>,
    native_events: mpsc::UnboundedReceiver<NativeEvent>,
}

impl NegotiationWorker {
    pub(crate) fn new(
        session_id: String,
        pc: Arc<dyn NativePeerConnection>,
        interop: Option<Arc<dyn SdpInterop>>,
        hub: EventHub,
        commands: mpsc::UnboundedReceiver<Command>,
        native_events: mpsc::UnboundedReceiver<NativeEvent>,
    ) -> Self {
        Self {
            session_id,
            pc,
            interop,
            buffer: CandidateBuffer::new(),
            hub,
            commands,
            native_events,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut native_open = true;
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        self.buffer.fail_all(PeerError::closed());
                        break;
                    }
                },
                event = self.native_events.recv(), if native_open => match event {
                    Some(event) => self.handle_native(event).await,
                    None => native_open = false,
                },
            }
        }
        log::debug!("Negotiation worker for session {} stopped", self.session_id);
    }

    /// Returns `false` once the worker should stop.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::AddCandidate(candidate, completion) => {
                self.buffer
                    .enqueue(self.pc.as_ref(), candidate, completion)
                    .await
            }
            Command::OnIceCandidate(listener) => self.hub.add_candidate_listener(listener),
            Command::OnGatheringDone(listener) => self.hub.add_gathering_done_listener(listener),
            Command::OnNegotiationNeeded(listener) => self.hub.add_negotiation_listener(listener),
            Command::OnDispose(listener) => self.hub.add_dispose_listener(listener),
            Command::QueueDepth(reply) => {
                let _ = reply.send(QueueDepth {
                    remote: self.buffer.len(),
                    local: self.hub.pending_len(),
                });
            }
            Command::Shutdown { notify, ack } => {
                self.buffer.fail_all(PeerError::closed());
                self.hub.disposed(notify);
                let _ = ack.send(());
                return false;
            }
        }
        true
    }

    async fn handle_native(&mut self, event: NativeEvent) {
        match event {
            NativeEvent::SignalingStateChange(state) => {
                log::debug!("Session {} signaling state changed to {}", self.session_id, state);
                self.buffer.drain(self.pc.as_ref()).await;
            }
            NativeEvent::IceCandidate(candidate) => {
                let candidate = match (&self.interop, candidate) {
                    (Some(interop), Some(c)) => Some(interop.candidate_to_unified_plan(c)),
                    (_, c) => c,
                };
                if candidate.is_none() {
                    log::debug!("Session {} finished gathering local candidates", self.session_id);
                }
                self.hub.on_local_candidate(candidate);
            }
            NativeEvent::NegotiationNeeded => self.hub.negotiation_needed(),
        }
    }
}
