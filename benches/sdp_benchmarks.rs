//! SDP and candidate handling benchmarks
//!
//! Run with: cargo bench --bench sdp_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crabpeer::media::StreamMetadata;
use crabpeer::webrtc::simulcast;
use crabpeer::IceCandidate;
use std::time::Duration;

/// Offer with `sections` video m-lines, the first carrying an FID group
fn generate_offer(sections: usize) -> String {
    let mut sdp = String::from("v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n");
    for i in 0..sections {
        sdp.push_str("m=video 9 UDP/TLS/RTP/SAVPF 96 97\r\n");
        sdp.push_str(&format!("a=mid:{}\r\na=sendonly\r\n", i));
        for pt in 96..120 {
            sdp.push_str(&format!("a=rtpmap:{} VP8/90000\r\na=rtcp-fb:{} nack\r\n", pt, pt));
        }
        sdp.push_str("a=ssrc-group:FID 1111 2222\r\n");
        sdp.push_str("a=ssrc:1111 cname:bench\r\na=ssrc:2222 cname:bench\r\n");
    }
    sdp
}

fn bench_add_simulcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simulcast SDP Rewrite");
    group.measurement_time(Duration::from_secs(5));

    let meta = StreamMetadata {
        stream_id: "3b6c2a36-bench-stream".to_string(),
        video_track_id: Some("9f1d7c5e-bench-track".to_string()),
    };

    for sections in [1usize, 4, 16] {
        let offer = generate_offer(sections);
        group.throughput(Throughput::Bytes(offer.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sections), &offer, |b, offer| {
            b.iter(|| simulcast::add_simulcast(black_box(offer), black_box(&meta)))
        });
    }

    group.finish();
}

fn bench_candidate_json(c: &mut Criterion) {
    let json = r#"{"candidate":"candidate:842163049 1 udp 1677729535 203.0.113.7 50412 typ srflx raddr 0.0.0.0 rport 0 generation 0","sdpMid":"0","sdpMLineIndex":0}"#;

    c.bench_function("IceCandidate parse", |b| {
        b.iter(|| IceCandidate::from_json(black_box(json)))
    });
}

criterion_group!(benches, bench_add_simulcast, bench_candidate_json);
criterion_main!(benches);
