//! Which playlist entry plays next.
//!
//! Outside shuffle the scheduler steps through the playlist, wrapping only
//! when loop is on. In shuffle it draws a random entry other than the
//! current one and remembers where it came from, so "previous" rewinds the
//! actual history instead of drawing again.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Scheduler {
    current: Option<usize>,
    loop_playlist: bool,
    shuffle: bool,
    history: Vec<usize>,
    rng: StdRng,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic shuffle order, for tests and reproducible sessions.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            current: None,
            loop_playlist: false,
            shuffle: false,
            history: Vec::new(),
            rng,
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Jump to `index`. In shuffle mode the jump can be undone with `select_previous`.
    pub fn select(&mut self, index: usize, len: usize) -> Result<usize> {
        if index >= len {
            return Err(Error::OutOfRange { index, len });
        }
        if self.shuffle {
            if let Some(prev) = self.current.filter(|p| *p != index) {
                self.history.push(prev);
            }
        }
        self.current = Some(index);
        Ok(index)
    }

    /// The selected entry, defaulting to the first one.
    pub fn select_current(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = match self.current {
            Some(i) if i < len => i,
            _ => 0,
        };
        self.current = Some(index);
        Some(index)
    }

    /// Advance. `None` at the end of a non-looping playlist; the selection is kept.
    pub fn select_next(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        if self.shuffle {
            let from = self.select_current(len)?;
            let pick = self.random_other(len);
            self.history.push(from);
            self.current = Some(pick);
            return Some(pick);
        }

        let next = match self.current {
            Some(i) if i < len => i + 1,
            _ => 0,
        };
        let next = if next < len {
            next
        } else if self.loop_playlist {
            0
        } else {
            return None;
        };
        self.current = Some(next);
        Some(next)
    }

    /// Step back. `None` before the start of a non-looping playlist.
    pub fn select_previous(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        if self.shuffle {
            // Entries past the end are stale after the playlist shrank.
            while let Some(prev) = self.history.pop() {
                if prev < len {
                    self.current = Some(prev);
                    return Some(prev);
                }
            }
            let pick = self.random_other(len);
            self.current = Some(pick);
            return Some(pick);
        }

        let prev = match self.current {
            Some(i) if i > 0 && i < len => i - 1,
            _ if self.loop_playlist => len - 1,
            _ => return None,
        };
        self.current = Some(prev);
        Some(prev)
    }

    /// Uniform index in `0..len`, different from the current one when possible.
    fn random_other(&mut self, len: usize) -> usize {
        match self.current {
            Some(cur) if cur < len && len > 1 => {
                let r = self.rng.gen_range(0..len - 1);
                if r >= cur { r + 1 } else { r }
            }
            Some(cur) if cur < len => cur,
            _ => self.rng.gen_range(0..len),
        }
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    /// Set shuffle mode. Always clears the undo history.
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
        self.history.clear();
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.set_shuffle(!self.shuffle);
        self.shuffle
    }

    pub fn is_loop(&self) -> bool {
        self.loop_playlist
    }

    pub fn set_loop(&mut self, loop_playlist: bool) {
        self.loop_playlist = loop_playlist;
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.loop_playlist = !self.loop_playlist;
        self.loop_playlist
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Forget the selection, e.g. after the playlist was replaced.
    pub fn reset(&mut self) {
        self.current = None;
        self.history.clear();
    }
}
