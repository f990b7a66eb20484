//! Game settings and tuning
//!
//! Persisted in LocalStorage on the web; defaults everywhere else.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::input::InputConfig;
use crate::sim::DifficultyConfig;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Gameplay ===
    /// Input classifier tuning
    pub input: InputConfig,
    /// Difficulty curve (also carries the minimum step time)
    pub difficulty: DifficultyConfig,
    /// Longest frame delta fed to the step timer (seconds)
    pub max_frame_delta: f32,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (minimize shake, flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            difficulty: DifficultyConfig::default(),
            max_frame_delta: MAX_FRAME_DELTA,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            mute_on_blur: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Parse settings JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Settings>(json).map(Settings::normalized)
    }

    /// Clamp values that would break the simulation
    pub fn normalized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            self.max_frame_delta = MAX_FRAME_DELTA;
        }
        if !(self.difficulty.min_step_time.is_finite() && self.difficulty.min_step_time > 0.0) {
            self.difficulty.min_step_time = MIN_STEP_TIME;
        }
        if !(self.input.debounce_ms.is_finite() && self.input.debounce_ms >= 0.0) {
            self.input.debounce_ms = DEBOUNCE_WINDOW_MS;
        }
        // Zero or negative bias would make left/right unreachable
        if !(self.input.horizontal_bias.is_finite() && self.input.horizontal_bias > 0.0) {
            self.input.horizontal_bias = InputConfig::default().horizontal_bias;
        }
        if !(self.input.dead_zone.is_finite() && self.input.dead_zone >= 0.0) {
            self.input.dead_zone = JOYSTICK_DEAD_ZONE;
        }
        self
    }

    /// Effective sound effect gain
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "its_alive_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        if let Some(storage) = crate::platform::local_storage() {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        if let Some(storage) = crate::platform::local_storage() {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
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
    use crate::sim::InputAction;

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json(r#"{"muted": true, "input": {"debounce_ms": 80.0}}"#).unwrap();
        assert!(s.muted);
        assert_eq!(s.input.debounce_ms, 80.0);
        assert_eq!(s.input.default_direction, InputAction::Up);
        assert_eq!(s.difficulty, DifficultyConfig::default());
        assert_eq!(s.effective_volume(), 0.0);
    }

    #[test]
    fn test_normalize_bad_values() {
        let s = Settings::from_json(
            r#"{"master_volume": 3.0, "max_frame_delta": -1.0, "difficulty": {"min_step_time": 0.0}}"#,
        )
        .unwrap();
        assert_eq!(s.master_volume, 1.0);
        assert_eq!(s.max_frame_delta, MAX_FRAME_DELTA);
        assert_eq!(s.difficulty.min_step_time, MIN_STEP_TIME);
    }

    #[test]
    fn test_normalize_stick_tuning() {
        let s = Settings::from_json(r#"{"input": {"horizontal_bias": -2.0, "dead_zone": -0.5}}"#)
            .unwrap();
        assert_eq!(s.input.horizontal_bias, 1.0);
        assert_eq!(s.input.dead_zone, JOYSTICK_DEAD_ZONE);
        assert_eq!(
            crate::input::resolve_direction(glam::Vec2::new(-0.4, 0.1), &s.input),
            InputAction::Left
        );

        let kept = Settings::from_json(r#"{"input": {"horizontal_bias": 1.5, "dead_zone": 0.0}}"#)
            .unwrap();
        assert_eq!(kept.input.horizontal_bias, 1.5);
        assert_eq!(kept.input.dead_zone, 0.0);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Settings::from_json("not json").is_err());
        assert_eq!(Settings::load(), Settings::default());
    }
}
