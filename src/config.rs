//! Session options and their persistence.
//!
//! `PeerOptions` carries every data-only knob of a session. Host objects
//! (connections, devices, surfaces, listeners) are handed to the session
//! builder instead, since they cannot be serialized.

use crate::errors::PeerError;
use crate::media::{MediaConstraints, SendSource};
use crate::platform::DataChannelOptions;
use crate::webrtc::peer::{MediaKind, RTCConfiguration};
use crate::webrtc::PeerMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `CRABPEER_SIMULCAST=true`
pub const ENV_PREFIX: &str = "CRABPEER";

/// Options of a single peer session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerOptions {
    /// Session id; a random UUID is used when absent
    pub id: Option<String>,
    /// Capture constraints, also deciding which kinds a receiver asks for
    pub media_constraints: Option<MediaConstraints>,
    /// ICE configuration for connections the session creates itself
    pub configuration: RTCConfiguration,
    /// Open a data channel on connections the session creates itself
    pub data_channels: bool,
    pub data_channel_config: Option<DataChannelConfig>,
    pub simulcast: bool,
    /// Translate between Plan B and Unified Plan on Plan-B hosts
    pub multistream: bool,
    pub send_source: Option<SendSource>,
}

/// Data channel label and creation options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataChannelConfig {
    /// Channel label; defaults to `WebRtcPeer-<session id>`
    pub id: Option<String>,
    pub options: DataChannelOptions,
}

impl PeerOptions {
    /// Load options from a TOML file, falling back to defaults if it is missing.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PeerError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Options file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            PeerError::InvalidConfiguration(format!("Failed to read options file: {}", e))
        })?;

        let options: PeerOptions = toml::from_str(&contents).map_err(|e| {
            PeerError::InvalidConfiguration(format!("Failed to parse options file: {}", e))
        })?;

        log::info!("Loaded peer options from {:?}", path);
        Ok(options)
    }

    /// Load options from an optional file layered under `CRABPEER_*` env vars.
    ///
    /// Nested keys use a double underscore, e.g. `CRABPEER_CONFIGURATION__BUNDLE_POLICY`.
    pub fn load_layered(path: Option<&Path>) -> Result<Self, PeerError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let options = builder
            .build()
            .and_then(|c| c.try_deserialize::<PeerOptions>())
            .map_err(|e| {
                PeerError::InvalidConfiguration(format!("Failed to load layered options: {}", e))
            })?;
        Ok(options)
    }

    /// Save options to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PeerError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PeerError::InvalidConfiguration(format!(
                    "Failed to create options directory: {}",
                    e
                ))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            PeerError::InvalidConfiguration(format!("Failed to serialize options: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            PeerError::InvalidConfiguration(format!("Failed to write options file: {}", e))
        })?;

        log::info!("Saved peer options to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("crabpeer.toml")
    }

    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load options, using defaults: {}", e);
            Self::default()
        })
    }

    /// ICE configuration with the default STUN servers filled in when empty.
    pub fn effective_configuration(&self) -> RTCConfiguration {
        let mut configuration = self.configuration.clone();
        if configuration.ice_servers.is_empty() {
            configuration.ice_servers = crate::webrtc::peer::default_ice_servers();
        }
        configuration
    }

    /// Check the options against the mode they will be used with
    pub fn validate(&self, mode: PeerMode) -> Result<(), String> {
        for server in &self.configuration.ice_servers {
            if server.urls.is_empty() {
                return Err("ICE server entry has no URLs".to_string());
            }
            if let Some(url) = server
                .urls
                .iter()
                .find(|u| !(u.starts_with("stun:") || u.starts_with("turn:") || u.starts_with("turns:")))
            {
                return Err(format!("Unsupported ICE server URL: {}", url));
            }
        }

        if let Some(dc) = &self.data_channel_config {
            if dc.id.as_deref() == Some("") {
                return Err("Data channel label must not be empty".to_string());
            }
        }

        if let Some(id) = &self.id {
            if id.is_empty() {
                return Err("Session id must not be empty".to_string());
            }
        }

        if mode.sends() && self.send_source.is_some() {
            if let Some(c) = &self.media_constraints {
                if !c.wants(MediaKind::Audio) && !c.wants(MediaKind::Video) {
                    return Err("Send source requires audio or video to be requested".to_string());
                }
            }
        }

        if self.multistream && !self.simulcast {
            log::debug!("Multistream enabled without simulcast");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::TrackConstraints;
    use crate::webrtc::peer::IceServer;

    #[test]
    fn test_default_options() {
        let options = PeerOptions::default();
        assert!(options.id.is_none());
        assert!(!options.simulcast);
        assert!(!options.data_channels);
        assert!(options.validate(PeerMode::Sendrecv).is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_ice_urls() {
        let mut options = PeerOptions::default();
        options.configuration.ice_servers = vec![IceServer {
            urls: vec!["http://example.com".to_string()],
            username: None,
            credential: None,
        }];
        assert!(options.validate(PeerMode::Recvonly).is_err());

        options.configuration.ice_servers[0].urls.clear();
        assert!(options.validate(PeerMode::Recvonly).is_err());
    }

    #[test]
    fn test_validation_rejects_source_without_media() {
        let options = PeerOptions {
            send_source: Some(SendSource::Camera),
            media_constraints: Some(MediaConstraints {
                audio: TrackConstraints::Bool(false),
                video: TrackConstraints::Bool(false),
            }),
            ..Default::default()
        };
        assert!(options.validate(PeerMode::Sendonly).is_err());
        assert!(options.validate(PeerMode::Recvonly).is_ok());
    }

    #[test]
    fn test_effective_configuration_fills_stun() {
        let mut options = PeerOptions::default();
        options.configuration.ice_servers.clear();
        let config = options.effective_configuration();
        assert!(!config.ice_servers.is_empty());
    }

    #[test]
    fn test_options_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("peer.toml");

        let options = PeerOptions {
            id: Some("presenter".to_string()),
            simulcast: true,
            send_source: Some(SendSource::Screen),
            data_channels: true,
            data_channel_config: Some(DataChannelConfig {
                id: Some("chat".to_string()),
                options: DataChannelOptions {
                    ordered: Some(true),
                    ..Default::default()
                },
            }),
            ..Default::default()
        };
        options.save_to_file(&path).unwrap();

        let loaded = PeerOptions::load_from_file(&path).unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_toml_sections() {
        let toml_string = toml::to_string_pretty(&PeerOptions::default()).unwrap();
        assert!(toml_string.contains("[configuration]"));
        assert!(toml_string.contains("simulcast"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = PeerOptions::load_from_file("nonexistent_crabpeer.toml");
        assert_eq!(result.unwrap(), PeerOptions::default());
    }

    #[test]
    fn test_layered_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layered.toml");
        fs::write(&path, "multistream = true\nsend_source = \"camera\"\n").unwrap();

        std::env::set_var("CRABPEER_SIMULCAST", "true");
        let loaded = PeerOptions::load_layered(Some(&path));
        std::env::remove_var("CRABPEER_SIMULCAST");

        let loaded = loaded.unwrap();
        assert!(loaded.multistream);
        assert!(loaded.simulcast);
        assert_eq!(loaded.send_source, Some(SendSource::Camera));
    }
}
