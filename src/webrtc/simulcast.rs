//! Chrome-style simulcast signaling through SDP rewriting.
//!
//! This is a textual transformation only: the single-stream `FID` group is cut
//! off and replaced by a `SIM` group of three fixed SSRCs that all point at the
//! local video track.

use crate::media::StreamMetadata;

const FID_GROUP: &str = "a=ssrc-group:FID";
const SIMULCAST_SSRCS: [u32; 3] = [1, 2, 3];

/// Cut the SDP at the first `FID` group line.
///
/// A match at offset 0 is left alone, as is an SDP without the line.
pub fn remove_fid(sdp: &str) -> &str {
    match sdp.find(FID_GROUP) {
        Some(n) if n > 0 => &sdp[..n],
        _ => sdp,
    }
}

/// Synthetic `SIM` group lines for the given stream, each terminated by `\n`.
///
/// Returns `None` when the stream has no video track to reference.
pub fn simulcast_lines(meta: &StreamMetadata) -> Option<String> {
    let track_id = meta.video_track_id.as_deref()?;
    let stream_id = meta.stream_id.as_str();

    let mut lines = vec![
        "a=x-google-flag:conference".to_string(),
        format!(
            "a=ssrc-group:SIM {}",
            SIMULCAST_SSRCS.map(|s| s.to_string()).join(" ")
        ),
    ];
    for ssrc in SIMULCAST_SSRCS {
        lines.push(format!("a=ssrc:{} cname:localVideo", ssrc));
        lines.push(format!("a=ssrc:{} msid:{} {}", ssrc, stream_id, track_id));
        lines.push(format!("a=ssrc:{} mslabel:{}", ssrc, stream_id));
        lines.push(format!("a=ssrc:{} label:{}", ssrc, track_id));
    }
    lines.push(String::new());
    Some(lines.join("\n"))
}

/// Rewrite `sdp` to advertise simulcast for the given local stream.
pub fn add_simulcast(sdp: &str, meta: &StreamMetadata) -> String {
    match simulcast_lines(meta) {
        Some(lines) => format!("{}{}", remove_fid(sdp), lines),
        None => {
            log::warn!("No video tracks available in the video stream");
            sdp.to_string()
        }
    }
}
