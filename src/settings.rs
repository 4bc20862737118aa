//! Visitor preferences
//!
//! Persisted in LocalStorage, separate from wish data.

use serde::{Deserialize, Serialize};

/// Motion preference override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MotionPreference {
    /// Follow the platform's reduced-motion setting
    #[default]
    Auto,
    /// Always disable scroll animations
    Reduce,
    /// Always animate
    Full,
}

impl MotionPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionPreference::Auto => "Auto",
            MotionPreference::Reduce => "Reduce",
            MotionPreference::Full => "Full",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" | "system" => Some(MotionPreference::Auto),
            "reduce" | "reduced" | "off" => Some(MotionPreference::Reduce),
            "full" | "on" => Some(MotionPreference::Full),
            _ => None,
        }
    }

    /// Resolve against the platform signal
    pub fn reduced(&self, platform_prefers_reduced: bool) -> bool {
        match self {
            MotionPreference::Auto => platform_prefers_reduced,
            MotionPreference::Reduce => true,
            MotionPreference::Full => false,
        }
    }
}

/// Site settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Accessibility ===
    /// Scroll animation override
    pub motion: MotionPreference,

    // === Diagnostics ===
    /// Console log level ("error", "warn", "info", "debug", "trace")
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            motion: MotionPreference::Auto,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Parsed log level, falling back to `Info`
    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "birthday_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        use crate::platform::storage::{load_json, local_storage};

        if let Some(settings) = local_storage().and_then(|s| load_json(&s, Self::STORAGE_KEY)) {
            return settings;
        }
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        use crate::platform::storage::{local_storage, save_json};

        if let Some(storage) = local_storage() {
            if save_json(&storage, Self::STORAGE_KEY, self) {
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_preference_resolution() {
        assert!(MotionPreference::Auto.reduced(true));
        assert!(!MotionPreference::Auto.reduced(false));
        assert!(MotionPreference::Reduce.reduced(false));
        assert!(!MotionPreference::Full.reduced(true));
    }

    #[test]
    fn test_motion_preference_from_str() {
        assert_eq!(MotionPreference::from_str("Reduced"), Some(MotionPreference::Reduce));
        assert_eq!(MotionPreference::from_str("on"), Some(MotionPreference::Full));
        assert_eq!(MotionPreference::from_str("nope"), None);
        assert_eq!(MotionPreference::Full.as_str(), "Full");
    }

    #[test]
    fn test_log_level_fallback() {
        let mut settings = Settings::default();
        assert_eq!(settings.log_level(), log::Level::Info);
        settings.log_level = "debug".into();
        assert_eq!(settings.log_level(), log::Level::Debug);
        settings.log_level = "chatty".into();
        assert_eq!(settings.log_level(), log::Level::Info);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"motion":"Reduce"}"#).unwrap();
        assert_eq!(settings.motion, MotionPreference::Reduce);
        assert_eq!(settings.log_level, "info");
    }
}
