//! The track catalog: every known track plus the ordered playlist.
//!
//! `available` is unique by file path. `playlist` holds ids into
//! `available` and may repeat them. Removing a track from `available`
//! removes every playlist occurrence so the playlist never dangles.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

use super::model::{Track, TrackId};

pub type CatalogHandle = Arc<Mutex<Catalog>>;

/// Lock a shared catalog, recovering the data if a holder panicked.
pub fn lock_catalog(handle: &CatalogHandle) -> MutexGuard<'_, Catalog> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct Catalog {
    available: Vec<Track>,
    playlist: Vec<TrackId>,
    by_path: HashMap<PathBuf, TrackId>,
    next_id: u64,
    mutation_locked: bool,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_handle(self) -> CatalogHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn available(&self) -> &[Track] {
        &self.available
    }

    pub fn playlist(&self) -> &[TrackId] {
        &self.playlist
    }

    pub fn playlist_len(&self) -> usize {
        self.playlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    /// Add a track unless its path is already known.
    ///
    /// Returns the new id, or `None` for a duplicate.
    pub fn add(&mut self, path: impl Into<PathBuf>, duration: Option<Duration>) -> Result<Option<TrackId>> {
        self.ensure_unlocked()?;
        let path = path.into();
        let key = path_key(&path);
        if self.by_path.contains_key(&key) {
            debug!(path = %path.display(), "track already in catalog");
            return Ok(None);
        }

        let id = TrackId(self.next_id);
        self.next_id += 1;
        self.by_path.insert(key, id);
        self.available.push(Track::new(id, path, duration));
        Ok(Some(id))
    }

    /// Remove the available track at `index` and all its playlist occurrences.
    pub fn remove_at(&mut self, index: usize) -> Result<Track> {
        self.ensure_unlocked()?;
        if index >= self.available.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.available.len(),
            });
        }
        let track = self.available.remove(index);
        self.forget(&track);
        Ok(track)
    }

    /// Remove a track by identity. `None` if it was not in the catalog.
    pub fn remove(&mut self, id: TrackId) -> Result<Option<Track>> {
        self.ensure_unlocked()?;
        match self.position_available(id) {
            Some(index) => self.remove_at(index).map(Some),
            None => Ok(None),
        }
    }

    fn forget(&mut self, track: &Track) {
        self.by_path.retain(|_, id| *id != track.id);
        self.playlist.retain(|id| *id != track.id);
    }

    /// Append a known track to the playlist.
    pub fn push_playlist(&mut self, id: TrackId) -> Result<()> {
        self.ensure_unlocked()?;
        if !self.contains(id) {
            return Err(Error::OutOfRange {
                index: id.0 as usize,
                len: self.available.len(),
            });
        }
        self.playlist.push(id);
        Ok(())
    }

    pub fn remove_playlist_at(&mut self, index: usize) -> Result<TrackId> {
        self.ensure_unlocked()?;
        if index >= self.playlist.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.playlist.len(),
            });
        }
        Ok(self.playlist.remove(index))
    }

    /// Replace the playlist. Ids not in `available` are dropped.
    pub fn set_playlist(&mut self, ids: impl IntoIterator<Item = TrackId>) -> Result<()> {
        self.ensure_unlocked()?;
        let ids: Vec<TrackId> = ids.into_iter().filter(|id| self.contains(*id)).collect();
        self.playlist = ids;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        self.available.clear();
        self.playlist.clear();
        self.by_path.clear();
        Ok(())
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.available.iter().any(|t| t.id == id)
    }

    pub fn id_for_path(&self, path: &Path) -> Option<TrackId> {
        self.by_path.get(&path_key(path)).copied()
    }

    pub fn position_available(&self, id: TrackId) -> Option<usize> {
        self.available.iter().position(|t| t.id == id)
    }

    /// First playlist position holding `id`.
    pub fn position_playlist(&self, id: TrackId) -> Option<usize> {
        self.playlist.iter().position(|p| *p == id)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.available.iter().find(|t| t.id == id)
    }

    pub fn playlist_track(&self, index: usize) -> Option<&Track> {
        self.playlist.get(index).and_then(|id| self.track(*id))
    }

    /// Store a computed duration. No-op (returns `false`) if the track is gone.
    pub fn set_duration(&mut self, id: TrackId, duration: Duration) -> bool {
        match self.available.iter_mut().find(|t| t.id == id) {
            Some(track) => {
                track.duration = Some(duration);
                track.pending = false;
                true
            }
            None => false,
        }
    }

    pub fn mark_pending(&mut self, id: TrackId) -> bool {
        self.set_pending(id, true)
    }

    pub fn clear_pending(&mut self, id: TrackId) -> bool {
        self.set_pending(id, false)
    }

    fn set_pending(&mut self, id: TrackId, pending: bool) -> bool {
        match self.available.iter_mut().find(|t| t.id == id) {
            Some(track) => {
                track.pending = pending;
                true
            }
            None => false,
        }
    }

    /// Forbid add/remove while playback is active. Duration write-back stays allowed.
    pub fn lock_mutation(&mut self) {
        self.mutation_locked = true;
    }

    pub fn unlock_mutation(&mut self) {
        self.mutation_locked = false;
    }

    pub fn is_mutation_locked(&self) -> bool {
        self.mutation_locked
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.mutation_locked {
            Err(Error::CatalogLocked)
        } else {
            Ok(())
        }
    }
}

fn path_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
