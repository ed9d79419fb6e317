use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::AudioSettings;
use crate::error::{Error, Result};
use crate::library::{CatalogHandle, ExclusionSet};
use crate::segment::SegmentDecoder;

use super::scheduler::Scheduler;
use super::thread::{AudioSetup, spawn_audio_thread};
use super::types::{AudioCmd, PlaybackHandle, PlaybackInfo, PlayerSnapshot};

/// Front-end handle to the audio thread.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<PlayerSnapshot>>>,
}

impl AudioPlayer {
    pub fn new(
        catalog: CatalogHandle,
        decoder: Arc<dyn SegmentDecoder>,
        scheduler: Scheduler,
        exclusions: ExclusionSet,
        audio_settings: AudioSettings,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo {
            index: scheduler.current(),
            shuffle: scheduler.is_shuffle(),
            loop_playlist: scheduler.is_loop(),
            ..PlaybackInfo::default()
        }));

        let setup = AudioSetup {
            catalog,
            decoder,
            scheduler,
            exclusions,
            settings: audio_settings,
        };
        let audio_handle = spawn_audio_thread(setup, rx, playback_info.clone())
            .map_err(|e| Error::Output(format!("cannot start audio thread: {e}")))?;

        Ok(Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
        })
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    pub fn send(&self, cmd: AudioCmd) -> std::result::Result<(), mpsc::SendError<AudioCmd>> {
        self.tx.send(cmd)
    }

    /// Stop playback, wait for the audio thread and return its final state.
    ///
    /// Returns `None` if the thread was already joined or panicked.
    pub fn quit(&self) -> Option<PlayerSnapshot> {
        let _ = self.send(AudioCmd::Quit);

        let handle = self.join.lock().ok().and_then(|mut j| j.take())?;
        handle.join().ok()
    }
}
