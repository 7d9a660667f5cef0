//! Outbound session events and the listener registry.

use crate::webrtc::peer::IceCandidate;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Events a session reports to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A local candidate to forward to the remote peer
    IceCandidate(IceCandidate),
    /// The native layer finished gathering local candidates
    CandidateGatheringDone,
    NegotiationNeeded,
    /// The session was torn down
    Disposed,
}

pub type CandidateListener = Box<dyn FnMut(IceCandidate) + Send>;
pub type SignalListener = Box<dyn FnMut() + Send>;

/// Listener registry plus the outbound candidate queue.
///
/// Local candidates gathered before anyone listens are kept and replayed to
/// the first listener of the matching kind.
pub(crate) struct EventHub {
    candidate_listeners: Vec<CandidateListener>,
    gathering_done_listeners: Vec<SignalListener>,
    negotiation_listeners: Vec<SignalListener>,
    dispose_listeners: Vec<SignalListener>,
    /// `None` is the end-of-candidates marker.
    pending: VecDeque<Option<IceCandidate>>,
    gathering_done: Arc<AtomicBool>,
}

impl EventHub {
    pub(crate) fn new(gathering_done: Arc<AtomicBool>) -> Self {
        Self {
            candidate_listeners: Vec::new(),
            gathering_done_listeners: Vec::new(),
            negotiation_listeners: Vec::new(),
            dispose_listeners: Vec::new(),
            pending: VecDeque::new(),
            gathering_done,
        }
    }

    fn has_candidate_listeners(&self) -> bool {
        !self.candidate_listeners.is_empty() || !self.gathering_done_listeners.is_empty()
    }

    fn is_gathering_done(&self) -> bool {
        self.gathering_done.load(Ordering::SeqCst)
    }

    fn set_gathering_done(&self, done: bool) {
        self.gathering_done.store(done, Ordering::SeqCst);
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Handle a candidate (or the end marker) gathered by the native layer.
    pub(crate) fn on_local_candidate(&mut self, candidate: Option<IceCandidate>) {
        if self.has_candidate_listeners() {
            match candidate {
                Some(candidate) => {
                    for listener in self.candidate_listeners.iter_mut() {
                        listener(candidate.clone());
                    }
                    // A fresh candidate re-opens gathering (e.g. after an ICE restart).
                    self.set_gathering_done(false);
                }
                None if !self.is_gathering_done() => {
                    for listener in self.gathering_done_listeners.iter_mut() {
                        listener();
                    }
                    self.set_gathering_done(true);
                }
                None => {}
            }
        } else if !self.is_gathering_done() {
            if candidate.is_none() {
                self.set_gathering_done(true);
            }
            self.pending.push_back(candidate);
        }
    }

    pub(crate) fn add_candidate_listener(&mut self, mut listener: CandidateListener) {
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for entry in self.pending.drain(..) {
            match entry {
                Some(candidate) => listener(candidate),
                None => kept.push_back(None),
            }
        }
        self.pending = kept;
        self.candidate_listeners.push(listener);
    }

    pub(crate) fn add_gathering_done_listener(&mut self, mut listener: SignalListener) {
        let before = self.pending.len();
        self.pending.retain(|entry| entry.is_some());
        if self.pending.len() != before {
            listener();
        }
        self.gathering_done_listeners.push(listener);
    }

    pub(crate) fn add_negotiation_listener(&mut self, listener: SignalListener) {
        self.negotiation_listeners.push(listener);
    }

    pub(crate) fn add_dispose_listener(&mut self, listener: SignalListener) {
        self.dispose_listeners.push(listener);
    }

    pub(crate) fn negotiation_needed(&mut self) {
        for listener in self.negotiation_listeners.iter_mut() {
            listener();
        }
    }

    /// Fire the dispose signal when `notify` is set, then forget every listener.
    pub(crate) fn disposed(&mut self, notify: bool) {
        if notify {
            for listener in self.dispose_listeners.iter_mut() {
                listener();
            }
        }
        self.candidate_listeners.clear();
        self.gathering_done_listeners.clear();
        self.negotiation_listeners.clear();
        self.dispose_listeners.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn candidate(n: u32) -> IceCandidate {
        IceCandidate::new(format!("candidate:{}", n), Some("0"), Some(0))
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, CandidateListener, SignalListener) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let c = log.clone();
        let d = log.clone();
        (
            log,
            Box::new(move |cand: IceCandidate| c.lock().unwrap().push(cand.candidate)),
            Box::new(move || d.lock().unwrap().push("done".to_string())),
        )
    }

    #[test]
    fn test_candidates_queue_until_listener() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut hub = EventHub::new(flag.clone());
        hub.on_local_candidate(Some(candidate(1)));
        hub.on_local_candidate(Some(candidate(2)));
        hub.on_local_candidate(None);
        assert_eq!(hub.pending_len(), 3);
        assert!(flag.load(Ordering::SeqCst));

        let (log, on_candidate, on_done) = recorder();
        hub.add_candidate_listener(on_candidate);
        assert_eq!(*log.lock().unwrap(), vec!["candidate:1", "candidate:2"]);
        assert_eq!(hub.pending_len(), 1);

        hub.add_gathering_done_listener(on_done);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["candidate:1", "candidate:2", "done"]
        );
        assert_eq!(hub.pending_len(), 0);
    }

    #[test]
    fn test_nothing_queued_after_gathering_done() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut hub = EventHub::new(flag);
        hub.on_local_candidate(None);
        hub.on_local_candidate(Some(candidate(9)));
        assert_eq!(hub.pending_len(), 1);
    }

    #[test]
    fn test_new_candidate_reopens_gathering() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut hub = EventHub::new(flag.clone());
        let (log, on_candidate, on_done) = recorder();
        hub.add_candidate_listener(on_candidate);
        hub.add_gathering_done_listener(on_done);

        hub.on_local_candidate(Some(candidate(1)));
        hub.on_local_candidate(None);
        hub.on_local_candidate(None);
        assert!(flag.load(Ordering::SeqCst));

        hub.on_local_candidate(Some(candidate(2)));
        assert!(!flag.load(Ordering::SeqCst));
        hub.on_local_candidate(None);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["candidate:1", "done", "candidate:2", "done"]
        );
    }

    #[test]
    fn test_disposed_clears_listeners() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut hub = EventHub::new(flag);
        let (log, on_candidate, _) = recorder();
        let fired = Arc::new(AtomicBool::new(false));
        let f = fired.clone();
        hub.add_candidate_listener(on_candidate);
        hub.add_dispose_listener(Box::new(move || f.store(true, Ordering::SeqCst)));

        hub.disposed(true);
        assert!(fired.load(Ordering::SeqCst));

        hub.on_local_candidate(Some(candidate(1)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_silent_dispose_skips_listeners() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut hub = EventHub::new(flag);
        let (log, on_candidate, _) = recorder();
        let fired = Arc::new(AtomicBool::new(false));
        let f = fired.clone();
        hub.add_candidate_listener(on_candidate);
        hub.add_dispose_listener(Box::new(move || f.store(true, Ordering::SeqCst)));

        hub.disposed(false);
        assert!(!fired.load(Ordering::SeqCst));

        hub.on_local_candidate(Some(candidate(1)));
        assert!(log.lock().unwrap().is_empty());
    }
}
