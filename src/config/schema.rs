use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/canto/config.toml` or `~/.config/canto/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CANTO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub estimator: EstimatorSettings,
    pub exclusions: ExclusionSettings,
    pub playlist: PlaylistSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// How often the audio thread checks the output queue (milliseconds).
    pub poll_interval_ms: u64,
    /// Request more audio once fewer than this many segments are queued.
    pub low_water_buffers: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            low_water_buffers: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Whether the playlist wraps around at either end.
    pub loop_playlist: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            loop_playlist: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Extension of playable track manifests (case-insensitive, without dot).
    pub track_extension: String,
    /// Extension of the segment audio files a manifest refers to.
    pub segment_extension: String,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            track_extension: "mus".to_string(),
            segment_extension: "wav".to_string(),
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Compute unknown track durations in the background.
    pub enabled: bool,
    /// Number of worker threads used for duration jobs.
    pub workers: usize,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            workers: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExclusionSettings {
    /// Whether the segment exclusion filter starts enabled.
    pub enabled: bool,
    /// Segment names to skip during playback, e.g. `["SPC1", "SPC2"]`.
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaylistSettings {
    /// Encoding used by `export` when the target file has no telling extension.
    pub export_format: PlaylistFormatSetting,
}

#[derive(Debug, Copy, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaylistFormatSetting {
    /// ISO-8859-1, no byte-order mark.
    #[serde(alias = "latin1", alias = "latin-1", alias = "iso-8859-1")]
    M3u,
    /// UTF-8 with byte-order mark.
    #[default]
    #[serde(alias = "utf8", alias = "utf-8")]
    M3u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Where the session state is kept. Defaults to `$XDG_STATE_HOME/canto/session.toml`.
    pub state_path: Option<PathBuf>,
}
