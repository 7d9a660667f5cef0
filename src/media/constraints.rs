use crate::webrtc::peer::MediaKind;
use serde::{Deserialize, Serialize};

/// Capture constraints for both media kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub audio: TrackConstraints,
    pub video: TrackConstraints,
}

/// Constraints for one media kind.
///
/// `Desktop` is listed before `Video` so untagged deserialization picks it
/// whenever a `mandatory` block is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackConstraints {
    Bool(bool),
    Desktop(DesktopConstraints),
    Video(VideoConstraints),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<ConstrainRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<ConstrainRange>,
    #[serde(rename = "framerate", skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstrainRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl ConstrainRange {
    pub fn ideal(value: u32) -> Self {
        Self {
            ideal: Some(value),
            ..Default::default()
        }
    }
}

/// Chromium desktop-capture constraint used by Electron screen sharing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopConstraints {
    pub mandatory: DesktopSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopSource {
    pub chrome_media_source: String,
    pub chrome_media_source_id: String,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: TrackConstraints::Bool(true),
            video: TrackConstraints::Video(VideoConstraints {
                width: Some(ConstrainRange::ideal(1920)),
                height: Some(ConstrainRange::ideal(1080)),
                frame_rate: Some(30.0),
            }),
        }
    }
}

impl TrackConstraints {
    /// Anything but an explicit `false` requests the kind.
    pub fn is_requested(&self) -> bool {
        !matches!(self, TrackConstraints::Bool(false))
    }
}

impl MediaConstraints {
    pub fn audio_only() -> Self {
        Self {
            audio: TrackConstraints::Bool(true),
            video: TrackConstraints::Bool(false),
        }
    }

    pub fn get(&self, kind: MediaKind) -> &TrackConstraints {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        }
    }

    pub fn wants(&self, kind: MediaKind) -> bool {
        self.get(kind).is_requested()
    }

    /// Same constraints with video capture turned off (microphone only).
    pub fn without_video(&self) -> Self {
        Self {
            audio: self.audio.clone(),
            video: TrackConstraints::Bool(false),
        }
    }

    /// Electron has no display-media API; screens are captured through
    /// `getUserMedia` with a desktop source and never with audio.
    pub fn desktop_capture(source_id: Option<&str>) -> Self {
        Self {
            audio: TrackConstraints::Bool(false),
            video: TrackConstraints::Desktop(DesktopConstraints {
                mandatory: DesktopSource {
                    chrome_media_source: "desktop".to_string(),
                    chrome_media_source_id: source_id.unwrap_or_default().to_string(),
                },
            }),
        }
    }

    /// Camera constraints for the picture-in-picture input of a mix.
    ///
    /// Only detailed video constraints are narrowed; boolean ones are kept.
    pub fn for_pip_camera(&self) -> Self {
        let mut camera = self.clone();
        if let TrackConstraints::Video(video) = &mut camera.video {
            video.width = Some(ConstrainRange::ideal(640));
        }
        camera
    }
}
