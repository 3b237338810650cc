//! Coarse device classification from the user agent.
//!
//! Patterns are checked tablet first, then mobile, then connected TV. The
//! order decides ambiguous agents (an Android tablet also matches "android"),
//! and the vendor keys off the resulting codes, so it must not change.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TABLET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ipad|android 3.0|xoom|sch-i800|playbook|tablet|kindle")
        .expect("tablet pattern should compile")
});

static MOBILE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)iphone|ipod|android|blackberry|opera|mini|windows\sce|palm|smartphone|iemobile",
    )
    .expect("mobile pattern should compile")
});

static TV_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)smart[-_\s]?tv|hbbtv|appletv|googletv|hdmi|netcast|viera|nettv|roku|\bdtv\b|sonydtv|inettvbrowser|\btv\b",
    )
    .expect("tv pattern should compile")
});

/// Device class codes understood by the vendor endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Desktop,
    ConnectedTv,
    Mobile,
    Tablet,
}

impl DeviceType {
    /// Classify a user agent string.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        if TABLET_PATTERN.is_match(user_agent) {
            DeviceType::Tablet
        } else if MOBILE_PATTERN.is_match(user_agent) {
            DeviceType::Mobile
        } else if TV_PATTERN.is_match(user_agent) {
            DeviceType::ConnectedTv
        } else {
            DeviceType::Desktop
        }
    }

    /// Wire code for this class.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            DeviceType::Desktop => "1",
            DeviceType::ConnectedTv => "3",
            DeviceType::Mobile => "4",
            DeviceType::Tablet => "5",
        }
    }
}

impl Serialize for DeviceType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code())
    }
}
