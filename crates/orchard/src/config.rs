//! Application configuration. Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Letter dataset (JSON).
    #[serde(default = "default_letters_path")]
    pub letters_path: PathBuf,
    /// Directory letter audio files are resolved against.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    /// Seed for every procedural generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Canopy leaf count multiplier (1.0 = full canopy).
    #[serde(default = "default_leaf_density")]
    pub leaf_density: f32,
    /// Frames per second of the update loop.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Start with sound muted.
    #[serde(default)]
    pub muted: bool,
    /// Disable all audio output (no device is opened).
    #[serde(default)]
    pub disable_audio: bool,
    /// Pace the update loop against the wall clock.
    #[serde(default = "default_true")]
    pub realtime: bool,
}

fn default_letters_path() -> PathBuf {
    PathBuf::from("data/letters.json")
}
fn default_audio_dir() -> PathBuf {
    PathBuf::from("data/audio")
}
fn default_seed() -> u64 {
    0x7ee5_eed
}
fn default_leaf_density() -> f32 {
    1.0
}
fn default_tick_rate() -> u32 {
    60
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            letters_path: default_letters_path(),
            audio_dir: default_audio_dir(),
            seed: default_seed(),
            leaf_density: default_leaf_density(),
            tick_rate: default_tick_rate(),
            muted: false,
            disable_audio: false,
            realtime: default_true(),
        }
    }
}

impl AppConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &Path) {
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }

    /// Length of one frame of the update loop.
    pub fn frame_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: AppConfig = ron::from_str("(seed: 42, muted: true)").unwrap();
        assert_eq!(config.seed, 42);
        assert!(config.muted);
        assert_eq!(config.letters_path, default_letters_path());
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn invalid_file_falls_back() {
        let path = std::env::temp_dir().join("memory_tree_bad_config.ron");
        std::fs::write(&path, "(seed: \"not a number\")").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join("memory_tree_saved_config.ron");
        let config = AppConfig {
            seed: 7,
            leaf_density: 0.5,
            ..Default::default()
        };
        config.save_to(&path);
        assert_eq!(AppConfig::load_from(&path), config);
        let _ = std::fs::remove_file(&path);
    }
}
