use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::PlaylistError;
use crate::library::{has_extension, require_file};

use super::PlaylistEntry;
use super::charset;

const HEADER: &str = "#EXTM3U";
const EXTINF: &str = "#EXTINF:";

/// Directives we recognize but have no use for.
const IGNORED_DIRECTIVES: &[&str] = &[
    "#PLAYLIST", "#EXTGRP", "#EXTALB", "#EXTART", "#EXTGENRE", "#EXTM3A", "#EXTBYT", "#EXTBIN",
    "#EXTENC", "#EXTIMG",
];

/// A directive waiting for the path line it describes.
struct Pending {
    line: usize,
    duration: Option<Duration>,
}

/// Parse raw playlist bytes.
///
/// Relative paths are resolved against `base_dir`. Paths that are not
/// regular files are logged and dropped; paths without `track_extension`
/// are logged and kept.
pub fn parse(
    bytes: &[u8],
    base_dir: &Path,
    track_extension: &str,
) -> Result<Vec<PlaylistEntry>, PlaylistError> {
    let text = charset::decode(bytes, charset::detect(bytes));
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);

    let mut lines = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    match lines.next() {
        Some((_, HEADER)) => {}
        Some((line, found)) => {
            return Err(PlaylistError::MalformedHeader {
                line,
                found: found.to_string(),
            });
        }
        None => {
            return Err(PlaylistError::MalformedHeader {
                line: 1,
                found: String::new(),
            });
        }
    }

    let mut entries = Vec::new();
    let mut pending: Option<Pending> = None;

    for (line, content) in lines {
        let content = content.trim();
        if content.starts_with('#') {
            if let Some(info) = content.strip_prefix(EXTINF) {
                pending = Some(Pending {
                    line,
                    duration: parse_extinf(info, line),
                });
            } else if is_ignored_directive(content) {
                // Keep a pending #EXTINF; these never carry a length.
                pending.get_or_insert(Pending {
                    line,
                    duration: None,
                });
            } else {
                return Err(PlaylistError::UnknownDirective {
                    line,
                    directive: directive_name(content).to_string(),
                });
            }
            continue;
        }

        let duration = pending.take().and_then(|p| p.duration);
        let path = resolve(base_dir, content);
        if let Err(e) = require_file(&path) {
            warn!(line, error = %e, "skipping playlist entry");
            continue;
        }
        if !has_extension(&path, track_extension) {
            warn!(line, path = %path.display(), expected = track_extension, "unexpected track extension");
        }
        entries.push(PlaylistEntry { path, duration });
    }

    if let Some(p) = pending {
        warn!(line = p.line, "directive without a following path line");
    }

    Ok(entries)
}

fn is_ignored_directive(line: &str) -> bool {
    let name = directive_name(line);
    IGNORED_DIRECTIVES.iter().any(|d| name == *d)
}

/// `#EXTALB:Foo` -> `#EXTALB`
fn directive_name(line: &str) -> &str {
    line.split(':').next().unwrap_or(line).trim_end()
}

/// Length part of `#EXTINF:<seconds>,<name>`. Negative means unknown.
fn parse_extinf(info: &str, line: usize) -> Option<Duration> {
    let secs = info.split(',').next().unwrap_or("").trim();
    match secs.parse::<f64>() {
        Ok(s) if s.is_finite() && s >= 0.0 => Some(seconds_to_duration(s)),
        Ok(_) => None,
        Err(_) => {
            warn!(line, value = secs, "unreadable #EXTINF length");
            None
        }
    }
}

/// Seconds to a millisecond duration, rounded to the nearest whole second.
pub(crate) fn seconds_to_duration(secs: f64) -> Duration {
    let millis = (secs * 1000.0) as u64;
    Duration::from_millis(millis.saturating_add(500) / 1000 * 1000)
}

fn resolve(base_dir: &Path, line: &str) -> PathBuf {
    let p = PathBuf::from(line);
    if p.is_absolute() { p } else { base_dir.join(p) }
}
