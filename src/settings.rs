//! Player preferences
//!
//! Each preference is its own entry in the [`ConfigStore`]. Missing or
//! unreadable entries fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::persistence::ConfigStore;
use crate::persistence::store::{format_bool, read_bool, read_parsed};

/// Mixer channels with a user-facing volume slider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioChannel {
    Master,
    Music,
    Sfx,
}

impl AudioChannel {
    pub const ALL: &'static [AudioChannel] =
        &[AudioChannel::Master, AudioChannel::Music, AudioChannel::Sfx];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioChannel::Master => "Master",
            AudioChannel::Music => "Music",
            AudioChannel::Sfx => "Sfx",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "master" => Some(AudioChannel::Master),
            "music" => Some(AudioChannel::Music),
            "sfx" | "effects" => Some(AudioChannel::Sfx),
            _ => None,
        }
    }

    fn storage_key(&self) -> String {
        format!("volume_{}", self.as_str())
    }

    fn default_volume(&self) -> f32 {
        match self {
            AudioChannel::Master => 0.8,
            AudioChannel::Music => 0.7,
            AudioChannel::Sfx => 1.0,
        }
    }
}

/// Frame rate cap choices, indexed by `fpsIndex`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FpsCap {
    Fps30,
    #[default]
    Fps60,
    Fps120,
    Fps144,
    Unlimited,
}

impl FpsCap {
    pub const ALL: &'static [FpsCap] = &[
        FpsCap::Fps30,
        FpsCap::Fps60,
        FpsCap::Fps120,
        FpsCap::Fps144,
        FpsCap::Unlimited,
    ];

    /// Cap for a stored index, clamped into range
    pub fn from_index(index: i64) -> Self {
        let last = Self::ALL.len() as i64 - 1;
        Self::ALL[index.clamp(0, last) as usize]
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(1)
    }

    /// Frames per second, `None` when uncapped
    pub fn frames_per_second(&self) -> Option<u32> {
        match self {
            FpsCap::Fps30 => Some(30),
            FpsCap::Fps60 => Some(60),
            FpsCap::Fps120 => Some(120),
            FpsCap::Fps144 => Some(144),
            FpsCap::Unlimited => None,
        }
    }

    pub fn label(&self) -> String {
        match self.frames_per_second() {
            Some(fps) => fps.to_string(),
            None => "Unlimited".to_string(),
        }
    }
}

/// Slider position (0..1) to mixer gain in decibels
pub fn to_decibels(volume: f32) -> f32 {
    20.0 * volume.max(0.0001).log10()
}

const FPS_INDEX_KEY: &str = "fpsIndex";
const SHOW_FPS_KEY: &str = "mostrarFps";
const VSYNC_KEY: &str = "vsync";

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Display ===
    pub fps_cap: FpsCap,
    /// Show FPS counter
    pub show_fps: bool,
    pub vsync: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: AudioChannel::Master.default_volume(),
            music_volume: AudioChannel::Music.default_volume(),
            sfx_volume: AudioChannel::Sfx.default_volume(),
            fps_cap: FpsCap::default(),
            show_fps: false,
            vsync: true,
        }
    }
}

impl Settings {
    pub fn volume(&self, channel: AudioChannel) -> f32 {
        match channel {
            AudioChannel::Master => self.master_volume,
            AudioChannel::Music => self.music_volume,
            AudioChannel::Sfx => self.sfx_volume,
        }
    }

    /// Set a channel volume (clamped to 0..1)
    pub fn set_volume(&mut self, channel: AudioChannel, volume: f32) {
        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        match channel {
            AudioChannel::Master => self.master_volume = volume,
            AudioChannel::Music => self.music_volume = volume,
            AudioChannel::Sfx => self.sfx_volume = volume,
        }
    }

    /// Gain to hand the mixer for a channel
    pub fn decibels(&self, channel: AudioChannel) -> f32 {
        to_decibels(self.volume(channel))
    }

    pub fn load(store: &dyn ConfigStore) -> Self {
        let mut settings = Self::default();
        for &channel in AudioChannel::ALL {
            let value = read_parsed(store, &channel.storage_key(), channel.default_volume());
            settings.set_volume(channel, value);
        }
        let fps_index = read_parsed(store, FPS_INDEX_KEY, settings.fps_cap.index() as i64);
        settings.fps_cap = FpsCap::from_index(fps_index);
        settings.show_fps = read_bool(store, SHOW_FPS_KEY, settings.show_fps);
        settings.vsync = read_bool(store, VSYNC_KEY, settings.vsync);
        log::info!(
            "Settings loaded (fps cap {}, vsync {})",
            settings.fps_cap.label(),
            settings.vsync
        );
        settings
    }

    pub fn save(&self, store: &mut dyn ConfigStore) {
        for &channel in AudioChannel::ALL {
            store.save(&channel.storage_key(), &self.volume(channel).to_string());
        }
        store.save(FPS_INDEX_KEY, &self.fps_cap.index().to_string());
        store.save(SHOW_FPS_KEY, format_bool(self.show_fps));
        store.save(VSYNC_KEY, format_bool(self.vsync));
        log::info!("Settings saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults_when_store_empty() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_save_uses_expected_keys() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.show_fps = true;
        settings.fps_cap = FpsCap::Fps144;
        settings.set_volume(AudioChannel::Music, 0.25);
        settings.save(&mut store);

        assert_eq!(store.read("mostrarFps").as_deref(), Some("True"));
        assert_eq!(store.read("vsync").as_deref(), Some("True"));
        assert_eq!(store.read("fpsIndex").as_deref(), Some("3"));
        assert_eq!(store.read("volume_Music").as_deref(), Some("0.25"));
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_fps_index_is_clamped() {
        let mut store = MemoryStore::new();
        store.save("fpsIndex", "42");
        assert_eq!(Settings::load(&store).fps_cap, FpsCap::Unlimited);
        store.save("fpsIndex", "-3");
        assert_eq!(Settings::load(&store).fps_cap, FpsCap::Fps30);
        store.save("fpsIndex", "lots");
        assert_eq!(Settings::load(&store).fps_cap, FpsCap::Fps60);
    }

    #[test]
    fn test_volume_is_clamped_on_load() {
        let mut store = MemoryStore::new();
        store.save("volume_Master", "3.5");
        store.save("volume_Sfx", "-1");
        let settings = Settings::load(&store);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.sfx_volume, 0.0);
    }

    #[test]
    fn test_decibel_conversion() {
        assert!(to_decibels(1.0).abs() < 1e-5);
        assert!((to_decibels(0.1) + 20.0).abs() < 1e-3);
        // Silence floors at the minimum gain instead of -inf
        assert!((to_decibels(0.0) + 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_fps_cap_labels() {
        assert_eq!(FpsCap::Fps30.label(), "30");
        assert_eq!(FpsCap::Unlimited.label(), "Unlimited");
        assert_eq!(FpsCap::Unlimited.frames_per_second(), None);
        for (i, cap) in FpsCap::ALL.iter().enumerate() {
            assert_eq!(cap.index(), i);
        }
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!(AudioChannel::from_str("MUSIC"), Some(AudioChannel::Music));
        assert_eq!(AudioChannel::from_str("voice"), None);
    }
}
