use serde::{Deserialize, Serialize};

/// Host browser family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Browser {
    Chrome,
    Chromium,
    Electron,
    Firefox,
    Safari,
    Edge,
    Opera,
    Unknown,
}

impl Browser {
    /// Detect the browser family from a user agent string.
    ///
    /// Order matters: Electron, Edge and Opera agents also carry a Chrome token.
    pub fn from_user_agent(ua: &str) -> Self {
        if ua.contains("Electron/") {
            Browser::Electron
        } else if ua.contains("Edg/") || ua.contains("Edge/") {
            Browser::Edge
        } else if ua.contains("OPR/") || ua.contains("Opera") {
            Browser::Opera
        } else if ua.contains("Chromium/") {
            Browser::Chromium
        } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
            Browser::Chrome
        } else if ua.contains("Firefox/") || ua.contains("FxiOS/") {
            Browser::Firefox
        } else if ua.contains("Safari/") {
            Browser::Safari
        } else {
            Browser::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "Chrome",
            Browser::Chromium => "Chromium",
            Browser::Electron => "Electron",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Edge => "Edge",
            Browser::Opera => "Opera",
            Browser::Unknown => "Unknown",
        }
    }
}

/// Capabilities of the host the session runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub browser: Browser,
    /// Desktop source picked by the user, used for Electron screen capture.
    #[serde(default)]
    pub media_source_id: Option<String>,
}

impl Default for PlatformInfo {
    fn default() -> Self {
        Self {
            browser: Browser::Unknown,
            media_source_id: None,
        }
    }
}

impl PlatformInfo {
    pub fn new(browser: Browser) -> Self {
        Self {
            browser,
            media_source_id: None,
        }
    }

    pub fn from_user_agent(ua: &str) -> Self {
        let info = Self::new(Browser::from_user_agent(ua));
        if info.uses_plan_b() {
            log::debug!("{}: using SDP PlanB", info.browser.as_str());
        }
        info
    }

    pub fn with_media_source_id(mut self, id: impl Into<String>) -> Self {
        self.media_source_id = Some(id.into());
        self
    }

    pub fn uses_plan_b(&self) -> bool {
        matches!(self.browser, Browser::Chrome | Browser::Chromium)
    }

    pub fn supports_simulcast(&self) -> bool {
        matches!(self.browser, Browser::Chrome | Browser::Chromium)
    }

    pub fn is_electron(&self) -> bool {
        self.browser == Browser::Electron
    }
}
