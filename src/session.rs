//! Persisted player state between runs.
//!
//! Stored as TOML:
//!
//! ```toml
//! available = ["/music/bd1.mus;183000", "/music/bd2.mus"]
//! playlist = [1, 0]
//! selected = 0
//! loop_playlist = true
//! shuffle = false
//! exclusion_enabled = true
//! exclusions = ["SPC1"]
//! ```
//!
//! `available` holds paths with an optional `;<milliseconds>` duration,
//! `playlist` indexes into it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::{PlayerSnapshot, Scheduler};
use crate::error::{Error, Result};
use crate::library::{Catalog, ExclusionSet, TrackId, require_file};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub available: Vec<String>,
    pub playlist: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,
    pub loop_playlist: bool,
    pub shuffle: bool,
    pub exclusion_enabled: bool,
    pub exclusions: Vec<String>,
}

/// Engine state rebuilt from a `SessionState`.
#[derive(Debug)]
pub struct Restored {
    pub catalog: Catalog,
    pub scheduler: Scheduler,
    pub exclusions: ExclusionSet,
}

impl SessionState {
    pub fn capture(catalog: &Catalog, player: &PlayerSnapshot) -> Self {
        let available = catalog
            .available()
            .iter()
            .map(|t| encode_entry(&t.path, t.duration))
            .collect();
        let playlist = catalog
            .playlist()
            .iter()
            .filter_map(|id| catalog.position_available(*id))
            .collect();

        Self {
            available,
            playlist,
            selected: player.selected.filter(|i| *i < catalog.playlist_len()),
            loop_playlist: player.loop_playlist,
            shuffle: player.shuffle,
            exclusion_enabled: player.exclusions.is_enabled(),
            exclusions: player.exclusions.names().map(str::to_string).collect(),
        }
    }

    /// Rebuild the catalog, scheduler flags and exclusion filter.
    ///
    /// Tracks whose files are gone are dropped and the playlist indices are
    /// remapped around them. A selection that no longer points into the
    /// playlist is cleared.
    pub fn restore(&self, scheduler: Scheduler) -> Restored {
        let mut catalog = Catalog::new();
        let mut ids: Vec<Option<TrackId>> = Vec::with_capacity(self.available.len());
        for raw in &self.available {
            let (path, duration) = decode_entry(raw);
            if let Err(e) = require_file(&path) {
                warn!(error = %e, "dropping session track");
                ids.push(None);
                continue;
            }
            match catalog.add(&path, duration) {
                Ok(Some(id)) => ids.push(Some(id)),
                Ok(None) => {
                    debug!(path = %path.display(), "duplicate session track");
                    ids.push(None);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot restore session track");
                    ids.push(None);
                }
            }
        }

        let mut playlist = Vec::with_capacity(self.playlist.len());
        let mut selected = None;
        for (pos, index) in self.playlist.iter().enumerate() {
            match ids.get(*index).copied().flatten() {
                Some(id) => {
                    if self.selected == Some(pos) {
                        selected = Some(playlist.len());
                    }
                    playlist.push(id);
                }
                None => debug!(index, "dropping playlist entry without a track"),
            }
        }
        if let Err(e) = catalog.set_playlist(playlist) {
            warn!(error = %e, "cannot restore session playlist");
        }

        let mut scheduler = scheduler;
        scheduler.reset();
        scheduler.set_loop(self.loop_playlist);
        scheduler.set_shuffle(self.shuffle);
        if let Some(i) = selected {
            if let Err(e) = scheduler.select(i, catalog.playlist_len()) {
                warn!(error = %e, "dropping session selection");
            }
        }

        Restored {
            catalog,
            scheduler,
            exclusions: ExclusionSet::from_names(&self.exclusions, self.exclusion_enabled),
        }
    }

    /// Read a saved session. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(path, e)),
        };
        let state = toml::from_str(&text).map_err(|e| Error::Session(format!("{}: {e}", path.display())))?;
        Ok(Some(state))
    }

    /// Write the session next to `path` and move it into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let text = toml::to_string(self).map_err(|e| Error::Session(e.to_string()))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, text).map_err(|e| Error::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;

        info!(
            path = %path.display(),
            tracks = self.available.len(),
            playlist = self.playlist.len(),
            "session saved"
        );
        Ok(())
    }
}

fn encode_entry(path: &Path, duration: Option<Duration>) -> String {
    let path = path.to_string_lossy();
    match duration {
        Some(d) => format!("{path};{}", d.as_millis()),
        None => path.into_owned(),
    }
}

fn decode_entry(raw: &str) -> (PathBuf, Option<Duration>) {
    if let Some((path, ms)) = raw.rsplit_once(';') {
        if let Ok(ms) = ms.trim().parse::<u64>() {
            return (PathBuf::from(path), Some(Duration::from_millis(ms)));
        }
    }
    (PathBuf::from(raw), None)
}

#[cfg(test)]
mod tests;
