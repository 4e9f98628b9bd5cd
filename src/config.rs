//! User preferences and AI coach connection settings.
//!
//! Settings live next to the map in eframe's key-value storage. A few
//! environment variables override the coach settings at startup so the proxy
//! location can be changed without touching the UI.

use serde::{Deserialize, Serialize};

/// Storage key for [`Settings`].
pub const SETTINGS_KEY: &str = "app_settings";

/// Default location of the chat proxy.
pub const DEFAULT_COACH_ENDPOINT: &str = "http://localhost:3001/api/claude";
/// Default model requested from the proxy.
pub const DEFAULT_COACH_MODEL: &str = "claude-sonnet-4-20250514";
/// Default reply length limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Where and how the coach sends chat requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachSettings {
    /// URL of the chat proxy
    pub endpoint: String,
    /// Model name forwarded to the proxy
    pub model: String,
    /// Maximum reply length in tokens
    pub max_tokens: u32,
}

impl Default for CoachSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COACH_ENDPOINT.to_string(),
            model: DEFAULT_COACH_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Persisted application preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether to use dark mode
    pub dark_mode: bool,
    /// Whether the stage titles are drawn along the top of the canvas
    pub show_stage_labels: bool,
    /// Chat proxy settings
    pub coach: CoachSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            show_stage_labels: true,
            coach: CoachSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from storage, falling back to defaults, then applies
    /// environment overrides.
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        let mut settings = storage
            .and_then(|s| s.get_string(SETTINGS_KEY))
            .and_then(|json| match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => Some(settings),
                Err(err) => {
                    log::warn!("ignoring unreadable settings: {err}");
                    None
                }
            })
            .unwrap_or_default();
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings
    }

    /// Writes the settings to storage.
    pub fn save(&self, storage: &mut dyn eframe::Storage) {
        match serde_json::to_string(self) {
            Ok(json) => storage.set_string(SETTINGS_KEY, json),
            Err(err) => log::error!("Failed to serialize settings: {err}"),
        }
    }

    /// Applies `WARDLEY_COACH_ENDPOINT`, `WARDLEY_COACH_MODEL` and
    /// `WARDLEY_COACH_MAX_TOKENS` from `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("WARDLEY_COACH_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            self.coach.endpoint = endpoint.trim().to_string();
        }
        if let Some(model) = lookup("WARDLEY_COACH_MODEL").filter(|v| !v.trim().is_empty()) {
            self.coach.model = model.trim().to_string();
        }
        if let Some(raw) = lookup("WARDLEY_COACH_MAX_TOKENS") {
            match raw.trim().parse::<u32>() {
                Ok(max_tokens) if max_tokens > 0 => self.coach.max_tokens = max_tokens,
                _ => log::warn!("ignoring invalid WARDLEY_COACH_MAX_TOKENS value {raw:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.show_stage_labels);
        assert!(!settings.dark_mode);
        assert_eq!(settings.coach.endpoint, DEFAULT_COACH_ENDPOINT);
        assert_eq!(settings.coach.max_tokens, 1024);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("WARDLEY_COACH_ENDPOINT", "https://proxy.example/api/claude"),
            ("WARDLEY_COACH_MAX_TOKENS", "2048"),
        ]
        .into_iter()
        .collect();
        let mut settings = Settings::default();
        settings.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.coach.endpoint, "https://proxy.example/api/claude");
        assert_eq!(settings.coach.max_tokens, 2048);
        assert_eq!(settings.coach.model, DEFAULT_COACH_MODEL);
    }

    #[test]
    fn test_invalid_max_tokens_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(|key| (key == "WARDLEY_COACH_MAX_TOKENS").then(|| "lots".to_string()));
        assert_eq!(settings.coach.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_save_and_load_partial_settings() {
        let mut storage = MemoryStorage::default();
        let settings = Settings {
            dark_mode: true,
            ..Settings::default()
        };
        settings.save(&mut storage);
        let loaded = Settings::load(Some(&storage));
        assert!(loaded.dark_mode);

        eframe::Storage::set_string(&mut storage, SETTINGS_KEY, r#"{"dark_mode": true}"#.to_string());
        let loaded = Settings::load(Some(&storage));
        assert!(loaded.dark_mode);
        assert!(loaded.show_stage_labels);
    }
}
