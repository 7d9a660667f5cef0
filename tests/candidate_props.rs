//! Property-based tests for remote candidate ordering
//!
//! Whatever the interleaving of candidate submissions and signaling state
//! changes, every candidate reaches the native connection exactly once and in
//! submission order once the connection settles in `stable`.
//!
//! Run with: cargo test --test candidate_props

use crabpeer::testing::FakePeerConnection;
use crabpeer::{IceCandidate, PeerSession, SessionDescription, SignalingState};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Submit,
    Renegotiate,
    Settle,
    Yield,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => Just(Step::Submit),
        1 => Just(Step::Renegotiate),
        1 => Just(Step::Settle),
        2 => Just(Step::Yield),
    ]
}

fn candidate(n: usize) -> IceCandidate {
    IceCandidate::new(
        format!("candidate:{} 1 UDP 2122260223 10.0.0.1 {} typ host", n, 6000 + n),
        Some("0"),
        Some(0),
    )
}

fn run_steps(steps: Vec<Step>) -> (Vec<IceCandidate>, Vec<IceCandidate>, bool) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(async move {
        let pc = FakePeerConnection::new();
        pc.force_remote_description(SessionDescription::answer("v=0\r\n"));
        let session = PeerSession::recvonly()
            .peer_connection(pc.clone())
            .build()
            .await
            .unwrap();

        let mut submitted = Vec::new();
        let mut tickets = Vec::new();
        for step in steps {
            match step {
                Step::Submit => {
                    let c = candidate(submitted.len());
                    tickets.push(session.add_ice_candidate(c.clone()));
                    submitted.push(c);
                }
                Step::Renegotiate => pc.set_signaling_state(SignalingState::HaveRemoteOffer),
                Step::Settle => pc.set_signaling_state(SignalingState::Stable),
                Step::Yield => tokio::task::yield_now().await,
            }
        }

        pc.set_signaling_state(SignalingState::Stable);
        let mut all_ok = true;
        for ticket in tickets {
            all_ok &= ticket.await.is_ok();
        }

        session.dispose().await;
        (submitted, pc.applied_candidates(), all_ok)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// INVARIANT: candidates are applied once each, in submission order
    #[test]
    fn candidates_applied_in_submission_order(steps in prop::collection::vec(step(), 0..40)) {
        let (submitted, applied, all_ok) = run_steps(steps);
        prop_assert!(all_ok, "every ticket should resolve successfully");
        prop_assert_eq!(applied, submitted);
    }

    /// INVARIANT: nothing is applied while the connection is mid-negotiation
    #[test]
    fn nothing_applied_before_stable(count in 1usize..20) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (queued, applied) = rt.block_on(async move {
            let pc = FakePeerConnection::new();
            let session = PeerSession::recvonly()
                .peer_connection(pc.clone())
                .build()
                .await
                .unwrap();
            pc.set_signaling_state(SignalingState::HaveLocalOffer);

            let _tickets: Vec<_> = (0..count)
                .map(|n| session.add_ice_candidate(candidate(n)))
                .collect();
            let stats = session.stats().await;
            (stats.queued_remote_candidates, pc.applied_candidates().len())
        });

        prop_assert_eq!(queued, count);
        prop_assert_eq!(applied, 0);
    }
}
