//! Remote ICE candidate buffering.
//!
//! Candidates can arrive from signaling before the connection is able to take
//! them. They wait here, in arrival order, until the native signaling state
//! reaches `stable`.

use crate::errors::PeerError;
use crate::platform::NativePeerConnection;
use crate::webrtc::peer::{IceCandidate, SignalingState};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub(crate) type Completion = oneshot::Sender<Result<(), PeerError>>;

/// Resolves once a submitted candidate has been applied, or has failed.
#[must_use = "the ticket carries the outcome of applying the candidate"]
pub struct CandidateTicket {
    rx: oneshot::Receiver<Result<(), PeerError>>,
}

impl CandidateTicket {
    pub(crate) fn new() -> (Completion, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }
}

impl Future for CandidateTicket {
    type Output = Result<(), PeerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped completion means the session went away with the entry queued.
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or_else(|_| Err(PeerError::closed())))
    }
}

struct QueueEntry {
    candidate: IceCandidate,
    completion: Completion,
}

/// FIFO of remote candidates waiting for a `stable` signaling state.
#[derive(Default)]
pub(crate) struct CandidateBuffer {
    queue: VecDeque<QueueEntry>,
}

impl CandidateBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Apply `candidate` now if the connection allows it, otherwise queue it.
    pub(crate) async fn enqueue(
        &mut self,
        pc: &dyn NativePeerConnection,
        candidate: IceCandidate,
        completion: Completion,
    ) {
        match pc.signaling_state() {
            SignalingState::Closed => {
                let _ = completion.send(Err(PeerError::closed()));
            }
            SignalingState::Stable if pc.remote_description().is_some() => {
                // Anything still queued was submitted first and must land first.
                self.drain(pc).await;
                apply(pc, candidate, completion).await;
            }
            state => {
                log::debug!(
                    "Queueing remote ICE candidate while signaling state is {}",
                    state
                );
                self.queue.push_back(QueueEntry {
                    candidate,
                    completion,
                });
            }
        }
    }

    /// Release every queued candidate, oldest first, if the state is `stable`.
    pub(crate) async fn drain(&mut self, pc: &dyn NativePeerConnection) {
        if pc.signaling_state() != SignalingState::Stable || self.queue.is_empty() {
            return;
        }
        log::debug!("Draining {} queued remote ICE candidates", self.queue.len());
        while let Some(entry) = self.queue.pop_front() {
            apply(pc, entry.candidate, entry.completion).await;
        }
    }

    /// Resolve every queued entry with `error`.
    pub(crate) fn fail_all(&mut self, error: PeerError) {
        for entry in self.queue.drain(..) {
            let _ = entry.completion.send(Err(error.clone()));
        }
    }
}

async fn apply(pc: &dyn NativePeerConnection, candidate: IceCandidate, completion: Completion) {
    let result = pc
        .add_ice_candidate(candidate)
        .await
        .map_err(PeerError::negotiation);
    if let Err(e) = &result {
        log::warn!("Failed to add remote ICE candidate: {}", e);
    }
    let _ = completion.send(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePeerConnection;
    use crate::webrtc::peer::SessionDescription;

    fn candidate(n: u32) -> IceCandidate {
        IceCandidate::new(format!("candidate:{} 1 UDP 1 10.0.0.1 {} typ host", n, 5000 + n), Some("0"), Some(0))
    }

    #[tokio::test]
    async fn test_closed_connection_fails_without_queueing() {
        let pc = FakePeerConnection::new();
        pc.force_signaling_state(SignalingState::Closed);
        let mut buffer = CandidateBuffer::new();

        let (tx, ticket) = CandidateTicket::new();
        buffer.enqueue(pc.as_ref(), candidate(1), tx).await;

        assert!(ticket.await.unwrap_err().is_closed());
        assert_eq!(buffer.len(), 0);
        assert!(pc.applied_candidates().is_empty());
    }

    #[tokio::test]
    async fn test_stable_without_remote_description_queues() {
        let pc = FakePeerConnection::new();
        let mut buffer = CandidateBuffer::new();

        let (tx, ticket) = CandidateTicket::new();
        let mut ticket = tokio_test::task::spawn(ticket);
        buffer.enqueue(pc.as_ref(), candidate(1), tx).await;

        tokio_test::assert_pending!(ticket.poll());
        assert_eq!(buffer.len(), 1);
        assert!(pc.applied_candidates().is_empty());
    }

    #[tokio::test]
    async fn test_stable_with_remote_description_applies_now() {
        let pc = FakePeerConnection::new();
        pc.force_remote_description(SessionDescription::answer("v=0\r\n"));
        let mut buffer = CandidateBuffer::new();

        let (tx, ticket) = CandidateTicket::new();
        buffer.enqueue(pc.as_ref(), candidate(1), tx).await;

        assert!(ticket.await.is_ok());
        assert_eq!(pc.applied_candidates(), vec![candidate(1)]);
    }

    #[tokio::test]
    async fn test_drain_waits_for_stable_and_keeps_order() {
        let pc = FakePeerConnection::new();
        pc.force_signaling_state(SignalingState::HaveLocalOffer);
        let mut buffer = CandidateBuffer::new();

        let mut tickets = Vec::new();
        for n in 0..3 {
            let (tx, ticket) = CandidateTicket::new();
            buffer.enqueue(pc.as_ref(), candidate(n), tx).await;
            tickets.push(ticket);
        }

        buffer.drain(pc.as_ref()).await;
        assert_eq!(buffer.len(), 3);

        pc.force_signaling_state(SignalingState::Stable);
        buffer.drain(pc.as_ref()).await;
        assert_eq!(buffer.len(), 0);
        for ticket in tickets {
            assert!(ticket.await.is_ok());
        }
        assert_eq!(
            pc.applied_candidates(),
            vec![candidate(0), candidate(1), candidate(2)]
        );
    }

    #[tokio::test]
    async fn test_queued_entries_flush_before_immediate_one() {
        let pc = FakePeerConnection::new();
        pc.force_signaling_state(SignalingState::HaveRemoteOffer);
        let mut buffer = CandidateBuffer::new();

        let (tx, _first) = CandidateTicket::new();
        buffer.enqueue(pc.as_ref(), candidate(1), tx).await;

        pc.force_signaling_state(SignalingState::Stable);
        pc.force_remote_description(SessionDescription::offer("v=0\r\n"));
        let (tx, _second) = CandidateTicket::new();
        buffer.enqueue(pc.as_ref(), candidate(2), tx).await;

        assert_eq!(pc.applied_candidates(), vec![candidate(1), candidate(2)]);
    }

    #[tokio::test]
    async fn test_native_error_reaches_completion() {
        let pc = FakePeerConnection::new();
        pc.force_remote_description(SessionDescription::answer("v=0\r\n"));
        pc.fail_next("addIceCandidate", "OperationError: bad candidate");
        let mut buffer = CandidateBuffer::new();

        let (tx, ticket) = CandidateTicket::new();
        buffer.enqueue(pc.as_ref(), candidate(1), tx).await;

        let err = ticket.await.unwrap_err();
        assert_eq!(
            err,
            PeerError::NegotiationFailure("OperationError: bad candidate".to_string())
        );
    }

    #[tokio::test]
    async fn test_fail_all_resolves_pending_tickets() {
        let pc = FakePeerConnection::new();
        pc.force_signaling_state(SignalingState::HaveLocalOffer);
        let mut buffer = CandidateBuffer::new();

        let (tx, ticket) = CandidateTicket::new();
        buffer.enqueue(pc.as_ref(), candidate(1), tx).await;
        buffer.fail_all(PeerError::closed());

        assert!(ticket.await.unwrap_err().is_closed());
        assert!(pc.applied_candidates().is_empty());
    }
}
