//! Local media: tracks, streams, capture constraints and acquisition.

pub mod acquisition;
pub mod constraints;
pub mod mixer;

pub use acquisition::{acquire, AcquiredMedia, SendSource};
pub use constraints::{MediaConstraints, TrackConstraints, VideoConstraints};
pub use mixer::{pip_layout, MixLayout, MixerInput};

use crate::webrtc::peer::MediaKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Settings reported by a live track
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
}

/// Host media track.
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> String;
    fn kind(&self) -> MediaKind;
    fn enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
    fn stop(&self);
    fn settings(&self) -> TrackSettings;
}

/// A group of tracks sharing one stream id.
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: Vec::new(),
        }
    }

    pub fn with_tracks(id: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_track(&mut self, track: Arc<dyn MediaTrack>) {
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: MediaKind) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks
            .iter()
            .filter(|t| t.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn audio_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks_of(MediaKind::Audio)
    }

    pub fn video_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks_of(MediaKind::Video)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// Identifiers referenced by simulcast SDP rewriting.
    pub fn metadata(&self) -> StreamMetadata {
        StreamMetadata {
            stream_id: self.id.clone(),
            video_track_id: self.video_tracks().first().map(|t| t.id()),
        }
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ids: Vec<String> = self.tracks.iter().map(|t| t.id()).collect();
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &ids)
            .finish()
    }
}

/// Stream and first video track ids of a local stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    pub stream_id: String,
    pub video_track_id: Option<String>,
}
