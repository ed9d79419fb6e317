use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::audio::{AudioCmd, AudioPlayer, PlaybackHandle, PlayerSnapshot, PlayerState};
use crate::config::Settings;
use crate::estimator::{DurationEstimator, WorkerPool};
use crate::library::{CatalogHandle, lock_catalog};
use crate::playlist::{self, PlaylistFormat};
use crate::segment::{ManifestDecoder, SegmentDecoder};
use crate::session::SessionState;

use self::commands::Command;

mod commands;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "canto=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let settings = settings::load_settings();
    let source = startup::Source::from_arg(env::args().nth(1));
    let engine = startup::build_engine(&settings, source);

    let catalog = engine.catalog.into_handle();
    let decoder: Arc<dyn SegmentDecoder> =
        Arc::new(ManifestDecoder::new(settings.library.segment_extension.clone()));

    let estimator = if settings.estimator.enabled {
        match WorkerPool::new("canto-estimate", settings.estimator.workers) {
            Ok(pool) => {
                let estimator = DurationEstimator::new(Arc::new(pool), decoder.clone(), catalog.clone());
                estimator.estimate_unknown();
                Some(estimator)
            }
            Err(e) => {
                warn!(error = %e, "cannot start duration workers");
                None
            }
        }
    } else {
        None
    };

    let player = AudioPlayer::new(
        catalog.clone(),
        decoder,
        engine.scheduler,
        engine.exclusions,
        settings.audio.clone(),
    )?;

    let mut shell = Shell {
        settings: &settings,
        catalog: &catalog,
        player: &player,
        estimator: estimator.as_ref(),
        playback: player.playback_handle(),
    };
    println!("canto: {} tracks. Type `help` for commands.", lock_catalog(&catalog).playlist_len());
    shell.run(io::stdin().lock())?;

    let snapshot = player.quit().unwrap_or_default();
    save_session(&settings, &catalog, &snapshot);
    Ok(())
}

fn save_session(settings: &Settings, catalog: &CatalogHandle, snapshot: &PlayerSnapshot) {
    let Some(path) = settings.session_path() else {
        warn!("no place to keep the session, not saving");
        return;
    };
    let state = SessionState::capture(&lock_catalog(catalog), snapshot);
    if let Err(e) = state.save(&path) {
        warn!(error = %e, "cannot save session");
    }
}

struct Shell<'a> {
    settings: &'a Settings,
    catalog: &'a CatalogHandle,
    player: &'a AudioPlayer,
    estimator: Option<&'a DurationEstimator>,
    playback: PlaybackHandle,
}

impl Shell<'_> {
    fn run(&mut self, input: impl BufRead) -> io::Result<()> {
        prompt()?;
        for line in input.lines() {
            match commands::parse(&line?) {
                Ok(Some(Command::Quit)) => return Ok(()),
                Ok(Some(cmd)) => self.execute(cmd),
                Ok(None) => {}
                Err(msg) => println!("{msg}"),
            }
            prompt()?;
        }
        Ok(())
    }

    fn send(&self, cmd: AudioCmd) {
        if self.player.send(cmd).is_err() {
            println!("audio thread is gone");
        }
    }

    fn execute(&mut self, cmd: Command) {
        match cmd {
            Command::List => self.list(),
            Command::Play(index) => {
                if let Some(i) = index {
                    let len = lock_catalog(self.catalog).playlist_len();
                    if i >= len {
                        println!("no entry {} (playlist has {len})", i + 1);
                        return;
                    }
                }
                self.send(AudioCmd::Play(index));
            }
            Command::Pause => self.send(AudioCmd::TogglePause),
            Command::Stop => self.send(AudioCmd::Stop),
            Command::Next => self.send(AudioCmd::Next),
            Command::Prev => self.send(AudioCmd::Prev),
            Command::Shuffle => self.send(AudioCmd::ToggleShuffle),
            Command::Loop => self.send(AudioCmd::ToggleLoop),
            Command::Exclude(name) => self.send(AudioCmd::Exclude(name)),
            Command::Include(name) => self.send(AudioCmd::Include(name)),
            Command::Filter(on) => self.send(AudioCmd::SetExclusionEnabled(on)),
            Command::Remove(index) => {
                let mut catalog = lock_catalog(self.catalog);
                match catalog.remove_playlist_at(index) {
                    Ok(id) => {
                        let name = catalog.track(id).map(|t| t.name()).unwrap_or_default();
                        println!("removed {name}");
                    }
                    Err(e) => println!("{e}"),
                }
            }
            Command::Import(path) => self.import(&path),
            Command::Export(path) => self.export(&path),
            Command::Status => self.status(),
            Command::Help => println!("{}", commands::HELP),
            Command::Quit => {}
        }
    }

    fn list(&self) {
        let catalog = lock_catalog(self.catalog);
        let current = self.playback.lock().ok().and_then(|i| i.index);
        for i in 0..catalog.playlist_len() {
            let Some(track) = catalog.playlist_track(i) else {
                continue;
            };
            let marker = if current == Some(i) { '>' } else { ' ' };
            let length = match (track.duration, track.pending) {
                (Some(d), _) => format_duration(d.as_secs()),
                (None, true) => "...".to_string(),
                (None, false) => "--:--".to_string(),
            };
            println!("{marker}{:>4}  {:<24} {:>6}  {}", i + 1, track.name(), length, track.location);
        }
    }

    fn status(&self) {
        let Ok(info) = self.playback.lock().map(|i| i.clone()) else {
            return;
        };
        let name = info
            .index
            .and_then(|i| lock_catalog(self.catalog).playlist_track(i).map(|t| t.name()))
            .unwrap_or_else(|| "-".to_string());
        let state = match info.state {
            PlayerState::Idle => "stopped",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::AwaitingRestart => "switching",
        };
        println!(
            "{state} {name} [{}] shuffle={} loop={}",
            format_duration(info.elapsed.as_secs()),
            on_off(info.shuffle),
            on_off(info.loop_playlist)
        );
        if let Some(err) = info.last_error {
            println!("last error: {err}");
        }
    }

    fn import(&self, path: &Path) {
        let entries = match playlist::import(path, &self.settings.library.track_extension) {
            Ok(entries) => entries,
            Err(e) => {
                println!("{e}");
                return;
            }
        };
        let added = playlist::apply_to_catalog(&mut lock_catalog(self.catalog), &entries);
        match added {
            Ok(n) => {
                println!("added {n} entries");
                if let Some(estimator) = self.estimator {
                    estimator.estimate_unknown();
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    fn export(&self, path: &Path) {
        let format = PlaylistFormat::from_path(path)
            .unwrap_or_else(|| PlaylistFormat::from(self.settings.playlist.export_format));
        let entries = playlist::entries_from_catalog(&lock_catalog(self.catalog));
        match playlist::export(path, &entries, format) {
            Ok(()) => println!("wrote {} entries to {}", entries.len(), path.display()),
            Err(e) => println!("{e}"),
        }
    }
}

fn prompt() -> io::Result<()> {
    let mut out = io::stdout().lock();
    write!(out, "canto> ")?;
    out.flush()
}

fn on_off(b: bool) -> &'static str {
    if b { "on" } else { "off" }
}

fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
