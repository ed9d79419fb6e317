//! Audio-related small types and handles.
//!
//! This module defines the events the output sink emits, the commands the
//! audio thread accepts, and the playback info shared with the front end.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::library::ExclusionSet;

/// Lifecycle events emitted by an output sink, processed in arrival order.
#[derive(Debug)]
pub enum SinkEvent {
    /// The output device was opened.
    Open,
    /// The output device went away.
    Close,
    /// The sink began producing sound.
    Start,
    /// The sink stopped; queued audio has been discarded.
    Stop,
    Pause,
    Resume,
    /// The sink's queue is running dry.
    BufferRequest,
    /// Decoding or output failed.
    Error(Error),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Playing,
    Paused,
    /// A track switch is stopping the sink; it starts again on `Stop`.
    AwaitingRestart,
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Play the playlist entry at the given index, or resume/start the current one.
    Play(Option<usize>),
    /// Stop playback.
    Stop,
    /// Toggle pause/resume.
    TogglePause,
    /// Skip to the next track.
    Next,
    /// Go to the previous track.
    Prev,
    ToggleShuffle,
    ToggleLoop,
    /// Add a segment name to the exclusion filter.
    Exclude(String),
    /// Remove a segment name from the exclusion filter.
    Include(String),
    SetExclusionEnabled(bool),
    /// Stop and leave the audio thread.
    Quit,
}

#[derive(Debug, Clone, Default)]
/// Runtime playback information shared with the front end.
pub struct PlaybackInfo {
    /// Selected playlist index (if any).
    pub index: Option<usize>,
    pub state: PlayerState,
    /// Elapsed playback time for the current track.
    pub elapsed: Duration,
    pub shuffle: bool,
    pub loop_playlist: bool,
    /// Last playback failure, for display.
    pub last_error: Option<String>,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;

/// Elapsed time of the current track, frozen while paused.
#[derive(Debug, Clone, Default)]
pub struct Elapsed {
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl Elapsed {
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = None;
    }

    /// Reset and start counting.
    pub fn restart(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = Some(Instant::now());
    }

    pub fn freeze(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    pub fn resume(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn get(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

/// What the audio thread hands back when it exits, for saving the session.
#[derive(Debug, Clone, Default)]
pub struct PlayerSnapshot {
    pub selected: Option<usize>,
    pub shuffle: bool,
    pub loop_playlist: bool,
    pub exclusions: ExclusionSet,
}
