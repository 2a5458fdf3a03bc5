//! Player preferences, persisted apart from scores

use serde::{Deserialize, Serialize};

use crate::storage;

/// Visual density; scales the particle budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        }
    }

    /// Case-insensitive; accepts "med" for settings menus
    pub fn parse(name: &str) -> Option<Self> {
        let preset = match name.trim().to_ascii_lowercase().as_str() {
            "low" => QualityPreset::Low,
            "medium" | "med" => QualityPreset::Medium,
            "high" => QualityPreset::High,
            _ => return None,
        };
        Some(preset)
    }

    pub fn particle_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.5,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub quality: QualityPreset,
    /// Powerup bursts, boost sparks, trails
    pub particles: bool,
    /// 0.0 - 1.0
    pub master_volume: f32,
    /// 0.0 - 1.0, applied on top of `master_volume`
    pub sfx_volume: f32,
    /// Pause when the tab is hidden or the window loses focus
    pub pause_on_blur: bool,
    /// Camera snaps instead of easing
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::default(),
            particles: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            pause_on_blur: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "arcade_sim_settings";

    pub fn from_preset(quality: QualityPreset) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }

    pub fn effective_volume(&self) -> f32 {
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    /// Stored settings, or defaults on first run
    pub fn load() -> Self {
        match storage::load_json::<Self>(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings ({} quality)", settings.quality.as_str());
                settings
            }
            None => Self::default(),
        }
    }

    pub fn save(&self) {
        match storage::save_json(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_preset_names() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse(" high "), Some(QualityPreset::High));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::Low.as_str(), "low");
    }

    #[test]
    fn settings_json_tolerates_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{ "quality": "high" }"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(settings.particles);
        assert!((settings.effective_volume() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn volume_is_clamped() {
        let settings = Settings {
            master_volume: 2.0,
            sfx_volume: 1.0,
            ..Settings::default()
        };
        assert_eq!(settings.effective_volume(), 1.0);
    }
}
