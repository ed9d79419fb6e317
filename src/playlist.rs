//! M3U/M3U8 playlist import and export.
//!
//! Import sniffs the charset from the byte-order mark (UTF-8, UTF-16LE,
//! UTF-16BE, else ISO-8859-1), requires the `#EXTM3U` header and reads
//! `#EXTINF` lengths. Export writes the same grammar back, as UTF-8 with a
//! BOM or as ISO-8859-1.

mod charset;
mod export;
mod parse;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::error::{Error, Result};
use crate::library::{Catalog, Track};

pub use export::{PlaylistFormat, render};
pub use parse::parse;

/// One playable line of a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub path: PathBuf,
    pub duration: Option<Duration>,
}

impl From<&Track> for PlaylistEntry {
    fn from(t: &Track) -> Self {
        Self {
            path: t.path.clone(),
            duration: t.duration,
        }
    }
}

/// Read and parse a playlist file. Relative entries resolve against its directory.
pub fn import(path: &Path, track_extension: &str) -> Result<Vec<PlaylistEntry>> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let base = path.parent().unwrap_or(Path::new("."));
    let entries = parse(&bytes, base, track_extension)?;
    info!(path = %path.display(), entries = entries.len(), "imported playlist");
    Ok(entries)
}

/// Write `entries` to `path`.
pub fn export(path: &Path, entries: &[PlaylistEntry], format: PlaylistFormat) -> Result<()> {
    fs::write(path, render(entries, format)).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), entries = entries.len(), ?format, "exported playlist");
    Ok(())
}

/// Playlist entries for the catalog's current playlist, in order.
pub fn entries_from_catalog(catalog: &Catalog) -> Vec<PlaylistEntry> {
    (0..catalog.playlist_len())
        .filter_map(|i| catalog.playlist_track(i))
        .map(PlaylistEntry::from)
        .collect()
}

/// Add imported entries to the catalog and append them to the playlist.
///
/// Entries already known by path keep their catalog identity. A known
/// track with no duration takes the imported one. Returns how many
/// playlist slots were appended.
pub fn apply_to_catalog(catalog: &mut Catalog, entries: &[PlaylistEntry]) -> Result<usize> {
    let mut appended = 0;
    for entry in entries {
        let id = match catalog.add(&entry.path, entry.duration)? {
            Some(id) => id,
            None => match catalog.id_for_path(&entry.path) {
                Some(id) => {
                    if let (Some(d), Some(t)) = (entry.duration, catalog.track(id)) {
                        if t.duration.is_none() {
                            catalog.set_duration(id, d);
                        }
                    }
                    id
                }
                None => continue,
            },
        };
        catalog.push_playlist(id)?;
        appended += 1;
    }
    Ok(appended)
}
