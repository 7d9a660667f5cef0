//! Property-based tests for simulcast SDP rewriting
//!
//! Run with: cargo test --test simulcast_props

use crabpeer::media::StreamMetadata;
use crabpeer::webrtc::simulcast::{add_simulcast, remove_fid};
use proptest::prelude::*;

const FID: &str = "a=ssrc-group:FID";

fn sdp_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]=[a-zA-Z0-9:/ ]{0,30}",
        Just("m=video 9 UDP/TLS/RTP/SAVPF 96".to_string()),
        Just("a=ssrc:1111 cname:x".to_string()),
    ]
}

fn ids() -> impl Strategy<Value = (String, String)> {
    ("[a-zA-Z0-9-]{1,36}", "[a-zA-Z0-9-]{1,36}")
}

proptest! {
    /// INVARIANT: the head before the first FID line survives, followed by 14 lines
    #[test]
    fn rewrite_keeps_head_and_appends_fourteen_lines(
        head in prop::collection::vec(sdp_line(), 1..12),
        tail in prop::collection::vec(sdp_line(), 0..6),
        (stream_id, track_id) in ids(),
    ) {
        let head = format!("{}\r\n", head.join("\r\n"));
        let sdp = format!("{}{} 1 2\r\n{}", head, FID, tail.join("\r\n"));
        let meta = StreamMetadata {
            stream_id: stream_id.clone(),
            video_track_id: Some(track_id.clone()),
        };

        let rewritten = add_simulcast(&sdp, &meta);
        prop_assert!(rewritten.starts_with(&head));

        let appended = &rewritten[head.len()..];
        prop_assert_eq!(appended.lines().count(), 14);
        prop_assert!(appended.ends_with('\n'));
        let msid = format!("msid:{} {}", stream_id, track_id);
        prop_assert_eq!(appended.matches(msid.as_str()).count(), 3);
        prop_assert!(!rewritten.contains(FID));
    }

    /// INVARIANT: without an FID group nothing is cut
    #[test]
    fn sdp_without_fid_is_kept_whole(lines in prop::collection::vec(sdp_line(), 0..12)) {
        let sdp = lines.join("\r\n");
        prop_assume!(!sdp.contains(FID));
        prop_assert_eq!(remove_fid(&sdp), sdp.as_str());
    }

    /// INVARIANT: a stream without video leaves the SDP untouched
    #[test]
    fn no_video_track_is_identity(lines in prop::collection::vec(sdp_line(), 0..12)) {
        let sdp = format!("{}\r\n{} 1 2\r\n", lines.join("\r\n"), FID);
        let meta = StreamMetadata {
            stream_id: "audio-only".to_string(),
            video_track_id: None,
        };
        prop_assert_eq!(add_simulcast(&sdp, &meta), sdp);
    }
}
