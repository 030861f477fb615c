use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::device::DeviceSpec;
use crate::pool::DEFAULT_CHANNELS;

/// User-facing audio preferences, supplied to [`crate::AudioEngine::init`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub sound_enabled: bool,
    pub music_enabled: bool,
    /// Device sample rate in Hz.
    pub sample_rate: u32,
    /// Device buffer size in sample frames.
    pub buffer_size: u16,
    /// Maximum concurrently playing sound effects.
    pub channel_limit: usize,
    /// Sound effect volume (0.0 - 1.0).
    pub sound_volume: f32,
    /// Music volume (0.0 - 1.0).
    pub music_volume: f32,
    /// Default directory searched for bare sound filenames.
    pub sound_dir: PathBuf,
    /// Default directory searched for bare music filenames.
    pub music_dir: PathBuf,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: true,
            sample_rate: 44100,
            buffer_size: 2048,
            channel_limit: DEFAULT_CHANNELS,
            sound_volume: 1.0,
            music_volume: 0.8,
            sound_dir: PathBuf::from("data/sounds"),
            music_dir: PathBuf::from("data/music"),
        }
    }
}

impl AudioSettings {
    /// Device parameters derived from these preferences.
    pub fn device_spec(&self) -> DeviceSpec {
        DeviceSpec {
            sample_rate: self.sample_rate,
            channels: 2,
            buffer_size: self.buffer_size,
        }
    }

    /// Load settings from the platform config directory, falling back to
    /// defaults when the file is missing or unreadable.
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to the platform config directory.
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn settings_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("com", "soundstage", "soundstage") {
            Ok(proj_dirs.config_dir().join("audio.json"))
        } else {
            Ok(PathBuf::from(".soundstage-audio.json"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = AudioSettings::default();
        assert!(settings.sound_enabled);
        assert!(settings.music_enabled);
        assert_eq!(settings.channel_limit, DEFAULT_CHANNELS);
        assert_eq!(settings.device_spec().sample_rate, 44100);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: AudioSettings = serde_json::from_str(r#"{"sample_rate": 48000}"#).unwrap();
        assert_eq!(settings.sample_rate, 48000);
        assert_eq!(settings.channel_limit, DEFAULT_CHANNELS);
        assert!(settings.music_enabled);
    }
}
