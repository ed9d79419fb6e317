//! The playback state machine.
//!
//! The controller never pulls audio on its own: it reacts to `SinkEvent`s.
//! A track switch always goes through a real stop/start pair on the sink
//! (`AwaitingRestart`), so the bridge of the old track is closed before the
//! bridge of the new one is opened and nothing from the old track is
//! pushed after the switch was requested.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::library::{CatalogHandle, ExclusionSet, lock_catalog};
use crate::segment::{SegmentBridge, SegmentDecoder};

use super::scheduler::Scheduler;
use super::sink::OutputSink;
use super::types::{Elapsed, PlaybackHandle, PlayerSnapshot, PlayerState, SinkEvent};

pub struct Controller<S: OutputSink> {
    sink: S,
    catalog: CatalogHandle,
    decoder: Arc<dyn SegmentDecoder>,
    scheduler: Scheduler,
    exclusions: ExclusionSet,
    bridge: Option<SegmentBridge>,
    state: PlayerState,
    /// Set when a switch stopped the sink; the next `Stop` starts it again.
    restart_pending: bool,
    /// Set when a full stop was requested; buffer requests are ignored until `Stop`.
    stop_pending: bool,
    elapsed: Elapsed,
}

impl<S: OutputSink> Controller<S> {
    pub fn new(
        sink: S,
        catalog: CatalogHandle,
        decoder: Arc<dyn SegmentDecoder>,
        scheduler: Scheduler,
        exclusions: ExclusionSet,
    ) -> Self {
        Self {
            sink,
            catalog,
            decoder,
            scheduler,
            exclusions,
            bridge: None,
            state: PlayerState::Idle,
            restart_pending: false,
            stop_pending: false,
            elapsed: Elapsed::default(),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state != PlayerState::Idle
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn exclusions_mut(&mut self) -> &mut ExclusionSet {
        &mut self.exclusions
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            selected: self.scheduler.current(),
            shuffle: self.scheduler.is_shuffle(),
            loop_playlist: self.scheduler.is_loop(),
            exclusions: self.exclusions.clone(),
        }
    }

    fn playlist_len(&self) -> usize {
        lock_catalog(&self.catalog).playlist_len()
    }

    /// React to one sink event.
    ///
    /// Errors are returned after playback has been halted; the catalog and
    /// playlist are left as they were.
    pub fn handle(&mut self, event: SinkEvent) -> Result<()> {
        debug!(?event, state = ?self.state, "sink event");
        match event {
            SinkEvent::Open => Ok(()),
            SinkEvent::Close => {
                self.close_bridge();
                self.restart_pending = false;
                self.enter_idle();
                Ok(())
            }
            SinkEvent::Start => {
                self.on_start();
                Ok(())
            }
            SinkEvent::BufferRequest => self.on_buffer_request(),
            SinkEvent::Stop => {
                self.on_stop();
                Ok(())
            }
            SinkEvent::Pause => {
                if self.state == PlayerState::Playing {
                    self.state = PlayerState::Paused;
                    self.elapsed.freeze();
                }
                Ok(())
            }
            SinkEvent::Resume => {
                if self.state == PlayerState::Paused {
                    self.state = PlayerState::Playing;
                    self.elapsed.resume();
                }
                Ok(())
            }
            SinkEvent::Error(e) => self.fail(e),
        }
    }

    fn on_start(&mut self) {
        self.stop_pending = false;
        self.state = PlayerState::Playing;
        self.elapsed.restart();
        lock_catalog(&self.catalog).lock_mutation();
        info!(index = ?self.scheduler.current(), "playback started");
    }

    fn on_stop(&mut self) {
        self.close_bridge();
        if self.restart_pending {
            self.restart_pending = false;
            debug!(index = ?self.scheduler.current(), "restarting on next track");
            self.sink.start();
        } else {
            self.enter_idle();
        }
    }

    fn enter_idle(&mut self) {
        self.stop_pending = false;
        self.state = PlayerState::Idle;
        self.elapsed.reset();
        lock_catalog(&self.catalog).unlock_mutation();
    }

    fn on_buffer_request(&mut self) -> Result<()> {
        if self.state != PlayerState::Playing || self.restart_pending || self.stop_pending {
            return Ok(());
        }

        if self.bridge.is_none() {
            let Some(path) = self.current_path() else {
                info!("playlist is empty, stopping");
                self.request_stop();
                return Ok(());
            };
            match SegmentBridge::open(self.decoder.as_ref(), &path) {
                Ok(bridge) => self.bridge = Some(bridge),
                Err(e) => return self.fail(e.into()),
            }
        }

        let next = match self.bridge.as_mut() {
            Some(bridge) => bridge.next_buffer(&self.exclusions),
            None => Ok(None),
        };
        match next {
            Ok(Some(buffer)) => match self.sink.add_buffer(buffer) {
                Ok(()) => Ok(()),
                Err(e) => self.fail(e),
            },
            Ok(None) => {
                // Let the tail of the track play out before switching.
                if self.sink.queued() > 0 {
                    return Ok(());
                }
                self.advance_after_track_end();
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    fn advance_after_track_end(&mut self) {
        let len = self.playlist_len();
        match self.scheduler.select_next(len) {
            Some(index) => {
                debug!(index, "track finished, switching");
                self.request_restart();
            }
            None => {
                info!("end of playlist");
                self.request_stop();
            }
        }
    }

    fn current_path(&mut self) -> Option<PathBuf> {
        let catalog = lock_catalog(&self.catalog);
        let index = self.scheduler.select_current(catalog.playlist_len())?;
        catalog.playlist_track(index).map(|t| t.path.clone())
    }

    fn close_bridge(&mut self) {
        if let Some(mut bridge) = self.bridge.take() {
            bridge.close();
        }
    }

    fn request_restart(&mut self) {
        self.restart_pending = true;
        self.state = PlayerState::AwaitingRestart;
        self.sink.stop();
    }

    fn request_stop(&mut self) {
        self.restart_pending = false;
        self.stop_pending = true;
        self.sink.stop();
    }

    fn fail(&mut self, err: Error) -> Result<()> {
        error!(error = %err, "playback halted");
        self.request_stop();
        Err(err)
    }

    /// Play `index` (or the current selection). Switches tracks if already playing.
    pub fn play(&mut self, index: Option<usize>) -> Result<()> {
        let len = self.playlist_len();
        match index {
            Some(i) => {
                self.scheduler.select(i, len)?;
            }
            None => {
                if self.state == PlayerState::Paused {
                    self.sink.resume();
                    return Ok(());
                }
                if self.scheduler.select_current(len).is_none() {
                    return Ok(());
                }
            }
        }

        match self.state {
            PlayerState::Idle if !self.stop_pending => self.sink.start(),
            PlayerState::Idle => self.restart_pending = true,
            PlayerState::Playing | PlayerState::Paused if index.is_some() => self.request_restart(),
            _ => {}
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state != PlayerState::Idle || self.restart_pending {
            self.request_stop();
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            PlayerState::Playing => self.sink.pause(),
            PlayerState::Paused => self.sink.resume(),
            _ => {}
        }
    }

    /// Skip forward. Does nothing past the end of a non-looping playlist.
    pub fn next(&mut self) {
        let len = self.playlist_len();
        if self.scheduler.select_next(len).is_some() {
            self.switch_if_active();
        }
    }

    pub fn previous(&mut self) {
        let len = self.playlist_len();
        if self.scheduler.select_previous(len).is_some() {
            self.switch_if_active();
        }
    }

    fn switch_if_active(&mut self) {
        if matches!(self.state, PlayerState::Playing | PlayerState::Paused) {
            self.request_restart();
        }
    }

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.scheduler.set_shuffle(shuffle);
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.scheduler.toggle_shuffle()
    }

    pub fn set_loop(&mut self, loop_playlist: bool) {
        self.scheduler.set_loop(loop_playlist);
    }

    pub fn toggle_loop(&mut self) -> bool {
        self.scheduler.toggle_loop()
    }

    /// Copy the current status into the shared handle.
    pub fn publish(&self, handle: &PlaybackHandle) {
        if let Ok(mut info) = handle.lock() {
            info.index = self.scheduler.current();
            info.state = self.state;
            info.elapsed = self.elapsed.get();
            info.shuffle = self.scheduler.is_shuffle();
            info.loop_playlist = self.scheduler.is_loop();
        }
    }
}
