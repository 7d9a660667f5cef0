use super::mixer::pip_layout;
use super::{MediaConstraints, MediaStream};
use crate::errors::PeerError;
use crate::platform::{MediaDevices, PlatformInfo, StreamMixer};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What a sending session captures at start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendSource {
    Audio,
    Camera,
    Screen,
    Mix,
}

impl fmt::Display for SendSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SendSource::Audio => "audio",
            SendSource::Camera => "camera",
            SendSource::Screen => "screen",
            SendSource::Mix => "mix",
        };
        f.write_str(name)
    }
}

/// Result of capturing local media.
///
/// When the stream is a mix, the screen and camera sources are kept so the
/// session can report and stop them alongside the mixed output.
#[derive(Clone)]
pub struct AcquiredMedia {
    pub stream: MediaStream,
    pub mixer: Option<Arc<dyn StreamMixer>>,
    pub screen_stream: Option<MediaStream>,
    pub camera_stream: Option<MediaStream>,
}

impl AcquiredMedia {
    fn single(stream: MediaStream) -> Self {
        Self {
            stream,
            mixer: None,
            screen_stream: None,
            camera_stream: None,
        }
    }
}

/// Capture the local stream for `source`.
pub async fn acquire(
    devices: &dyn MediaDevices,
    platform: &PlatformInfo,
    source: SendSource,
    constraints: Option<&MediaConstraints>,
) -> Result<AcquiredMedia, PeerError> {
    let constraints = constraints.cloned().unwrap_or_default();

    if platform.is_electron() && matches!(source, SendSource::Screen | SendSource::Mix) {
        match &platform.media_source_id {
            Some(id) => log::info!("Electron: sharing window with provided sourceId: {}", id),
            None => log::info!("Electron: sharing entire screen"),
        }
    }

    log::debug!("Acquiring local media for send source '{}'", source);

    match source {
        SendSource::Audio | SendSource::Camera => {
            let stream = devices
                .get_user_media(&constraints)
                .await
                .with_context(|| format!("{} capture failed", source))
                .map_err(PeerError::media)?;
            Ok(AcquiredMedia::single(stream))
        }
        SendSource::Screen => {
            let screen = capture_screen(devices, platform, &constraints).await?;
            // Requested audio comes from the microphone, not the system mix.
            if !constraints.audio.is_requested() {
                return Ok(AcquiredMedia::single(screen));
            }
            let microphone = devices
                .get_user_media(&constraints.without_video())
                .await
                .context("microphone capture failed")
                .map_err(PeerError::media)?;
            mix(devices, screen, microphone)
        }
        SendSource::Mix => {
            let camera_constraints = constraints.for_pip_camera();
            let screen = capture_screen(devices, platform, &constraints).await?;
            let camera = devices
                .get_user_media(&camera_constraints)
                .await
                .context("camera capture failed")
                .map_err(PeerError::media)?;
            mix(devices, screen, camera)
        }
    }
}

async fn capture_screen(
    devices: &dyn MediaDevices,
    platform: &PlatformInfo,
    constraints: &MediaConstraints,
) -> Result<MediaStream, PeerError> {
    let result = if platform.is_electron() {
        let desktop = MediaConstraints::desktop_capture(platform.media_source_id.as_deref());
        devices.get_user_media(&desktop).await
    } else {
        devices.get_display_media(constraints).await
    };
    result
        .context("screen capture failed")
        .map_err(PeerError::media)
}

fn mix(
    devices: &dyn MediaDevices,
    screen: MediaStream,
    camera: MediaStream,
) -> Result<AcquiredMedia, PeerError> {
    if screen.video_tracks().is_empty() {
        return Err(PeerError::MediaAcquisitionFailure(
            "screen stream has no video track".to_string(),
        ));
    }

    let (inputs, frame_interval) = pip_layout(&screen, &camera);
    let mixer = devices
        .create_mixer(inputs, frame_interval)
        .context("stream mixer unavailable")
        .map_err(PeerError::media)?;
    mixer.start_drawing_frames();

    Ok(AcquiredMedia {
        stream: mixer.mixed_stream(),
        mixer: Some(mixer),
        screen_stream: Some(screen),
        camera_stream: Some(camera),
    })
}
