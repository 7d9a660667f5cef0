use super::MediaStream;
use serde::{Deserialize, Serialize};

/// Placement of one input on the mixer canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MixLayout {
    pub full_canvas: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub top: Option<u32>,
    pub left: Option<u32>,
}

/// One stream handed to the host mixer together with its placement
#[derive(Debug, Clone)]
pub struct MixerInput {
    pub stream: MediaStream,
    pub layout: MixLayout,
}

/// Height of the picture-in-picture inset relative to the parent
const PIP_HEIGHT_RATIO: f64 = 0.2;

/// Lays `child` out as a picture-in-picture over a full-canvas `parent`.
///
/// Returns the two mixer inputs (parent first) and the frame interval, taken
/// from the parent's frame rate. A child without video keeps an empty layout
/// and only contributes audio.
pub fn pip_layout(parent: &MediaStream, child: &MediaStream) -> (Vec<MixerInput>, Option<f64>) {
    let parent_settings = parent
        .video_tracks()
        .first()
        .map(|t| t.settings())
        .unwrap_or_default();

    let parent_layout = MixLayout {
        full_canvas: true,
        width: parent_settings.width,
        height: parent_settings.height,
        top: None,
        left: None,
    };

    let mut child_layout = MixLayout::default();
    if let Some(track) = child.video_tracks().first() {
        let settings = track.settings();
        let parent_height = parent_settings.height.unwrap_or(0) as f64;
        let inset_height = (PIP_HEIGHT_RATIO * parent_height).trunc() as u32;
        let ratio = match (settings.width, settings.height) {
            (Some(w), Some(h)) if h > 0 => w as f64 / h as f64,
            _ => 0.0,
        };
        child_layout = MixLayout {
            full_canvas: false,
            width: Some((ratio * inset_height as f64).round() as u32),
            height: Some(inset_height),
            top: Some(0),
            left: Some(0),
        };
    }

    let inputs = vec![
        MixerInput {
            stream: parent.clone(),
            layout: parent_layout,
        },
        MixerInput {
            stream: child.clone(),
            layout: child_layout,
        },
    ];
    (inputs, parent_settings.frame_rate)
}
