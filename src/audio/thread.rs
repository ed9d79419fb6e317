use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::AudioSettings;
use crate::library::{CatalogHandle, ExclusionSet};
use crate::segment::SegmentDecoder;

use super::controller::Controller;
use super::scheduler::Scheduler;
use super::sink::{OutputSink, RodioSink};
use super::types::{AudioCmd, PlaybackHandle, PlayerSnapshot, SinkEvent};

/// Everything the audio thread takes ownership of.
pub(super) struct AudioSetup {
    pub catalog: CatalogHandle,
    pub decoder: Arc<dyn SegmentDecoder>,
    pub scheduler: Scheduler,
    pub exclusions: ExclusionSet,
    pub settings: AudioSettings,
}

pub(super) fn spawn_audio_thread(
    setup: AudioSetup,
    rx: Receiver<AudioCmd>,
    playback_info: PlaybackHandle,
) -> std::io::Result<JoinHandle<PlayerSnapshot>> {
    thread::Builder::new()
        .name("canto-audio".to_string())
        .spawn(move || {
            let AudioSetup {
                catalog,
                decoder,
                scheduler,
                exclusions,
                settings,
            } = setup;

            let (events_tx, events_rx) = mpsc::channel::<SinkEvent>();
            let sink = match RodioSink::open(events_tx) {
                Ok(sink) => sink,
                Err(e) => {
                    error!(error = %e, "no audio output device");
                    if let Ok(mut info) = playback_info.lock() {
                        info.last_error = Some(e.to_string());
                    }
                    return PlayerSnapshot {
                        selected: scheduler.current(),
                        shuffle: scheduler.is_shuffle(),
                        loop_playlist: scheduler.is_loop(),
                        exclusions,
                    };
                }
            };

            let mut controller = Controller::new(sink, catalog, decoder, scheduler, exclusions);
            let poll_interval = Duration::from_millis(settings.poll_interval_ms.max(1));
            let low_water = settings.low_water_buffers.max(1);

            loop {
                match rx.recv_timeout(poll_interval) {
                    Ok(cmd) => {
                        if !apply_command(&mut controller, cmd) {
                            break;
                        }
                        // Drain whatever else is queued before touching the sink again.
                        let mut quit = false;
                        while let Ok(cmd) = rx.try_recv() {
                            if !apply_command(&mut controller, cmd) {
                                quit = true;
                                break;
                            }
                        }
                        if quit {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                controller.sink_mut().poll(low_water);
                drain_events(&mut controller, &events_rx, &playback_info);
                controller.publish(&playback_info);
            }

            controller.stop();
            drain_events(&mut controller, &events_rx, &playback_info);
            controller.sink_mut().close();
            drain_events(&mut controller, &events_rx, &playback_info);
            controller.publish(&playback_info);
            info!("audio thread finished");
            controller.snapshot()
        })
}

/// Apply one command. Returns `false` when the thread should exit.
pub(super) fn apply_command<S: OutputSink>(controller: &mut Controller<S>, cmd: AudioCmd) -> bool {
    debug!(?cmd, "audio command");
    match cmd {
        AudioCmd::Play(index) => {
            if let Err(e) = controller.play(index) {
                warn!(error = %e, "cannot play");
            }
        }
        AudioCmd::Stop => controller.stop(),
        AudioCmd::TogglePause => controller.toggle_pause(),
        AudioCmd::Next => controller.next(),
        AudioCmd::Prev => controller.previous(),
        AudioCmd::ToggleShuffle => {
            controller.toggle_shuffle();
        }
        AudioCmd::ToggleLoop => {
            controller.toggle_loop();
        }
        AudioCmd::Exclude(name) => {
            controller.exclusions_mut().insert(&name);
        }
        AudioCmd::Include(name) => {
            controller.exclusions_mut().remove(&name);
        }
        AudioCmd::SetExclusionEnabled(enabled) => controller.exclusions_mut().set_enabled(enabled),
        AudioCmd::Quit => return false,
    }
    true
}

/// Feed every pending sink event to the controller, in arrival order.
pub(super) fn drain_events<S: OutputSink>(
    controller: &mut Controller<S>,
    events: &Receiver<SinkEvent>,
    playback_info: &PlaybackHandle,
) {
    while let Ok(event) = events.try_recv() {
        let starting = matches!(event, SinkEvent::Start);
        match controller.handle(event) {
            Ok(()) if starting => {
                if let Ok(mut info) = playback_info.lock() {
                    info.last_error = None;
                }
            }
            Ok(()) => {}
            Err(e) => {
                if let Ok(mut info) = playback_info.lock() {
                    info.last_error = Some(e.to_string());
                }
            }
        }
    }
}
