use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::config::PlaylistFormatSetting;

use super::PlaylistEntry;
use super::charset;

/// Target encoding of an exported playlist.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaylistFormat {
    /// ISO-8859-1, no byte-order mark.
    M3u,
    /// UTF-8 with byte-order mark.
    M3u8,
}

impl PlaylistFormat {
    /// Format implied by the file extension, if it names one.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("m3u8") {
            Some(Self::M3u8)
        } else if ext.eq_ignore_ascii_case("m3u") {
            Some(Self::M3u)
        } else {
            None
        }
    }
}

impl From<PlaylistFormatSetting> for PlaylistFormat {
    fn from(s: PlaylistFormatSetting) -> Self {
        match s {
            PlaylistFormatSetting::M3u => Self::M3u,
            PlaylistFormatSetting::M3u8 => Self::M3u8,
        }
    }
}

/// Whole seconds for `#EXTINF`, rounding half a second up.
pub(crate) fn duration_to_seconds(d: Duration) -> u64 {
    let millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
    millis.saturating_add(500) / 1000
}

/// Render `entries` as playlist bytes in `format`.
pub fn render(entries: &[PlaylistEntry], format: PlaylistFormat) -> Vec<u8> {
    let mut text = String::from("#EXTM3U\n");
    for entry in entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _ = match entry.duration {
            Some(d) => writeln!(text, "#EXTINF:{},{}", duration_to_seconds(d), name),
            None => writeln!(text, "#EXTINF:-1,{}", name),
        };
        let _ = writeln!(text, "{}", entry.path.display());
    }

    match format {
        PlaylistFormat::M3u8 => charset::encode_utf8_bom(&text),
        PlaylistFormat::M3u => charset::encode_latin1(&text),
    }
}
