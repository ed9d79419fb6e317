use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::audio::Scheduler;
use crate::config;
use crate::library::{Catalog, ExclusionSet, scan};
use crate::playlist::{self, PlaylistFormat};
use crate::session::SessionState;

/// Where the initial track list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The saved session, or the working directory if there is none.
    Session,
    Playlist(PathBuf),
    Directory(PathBuf),
}

impl Source {
    pub fn from_arg(arg: Option<String>) -> Self {
        match arg {
            None => Source::Session,
            Some(a) => {
                let path = PathBuf::from(a);
                if PlaylistFormat::from_path(&path).is_some() && path.is_file() {
                    Source::Playlist(path)
                } else {
                    Source::Directory(path)
                }
            }
        }
    }
}

pub struct Engine {
    pub catalog: Catalog,
    pub scheduler: Scheduler,
    pub exclusions: ExclusionSet,
}

pub fn build_engine(settings: &config::Settings, source: Source) -> Engine {
    let track_ext = settings.library.track_extension.as_str();
    match source {
        Source::Session => {
            if let Some(engine) = from_session(settings) {
                return engine;
            }
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            from_directory(settings, &cwd)
        }
        Source::Playlist(path) => {
            let mut engine = fresh(settings);
            match playlist::import(&path, track_ext) {
                Ok(entries) => {
                    if let Err(e) = playlist::apply_to_catalog(&mut engine.catalog, &entries) {
                        warn!(error = %e, "cannot apply playlist");
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "cannot import playlist"),
            }
            engine
        }
        Source::Directory(dir) => from_directory(settings, &dir),
    }
}

fn from_session(settings: &config::Settings) -> Option<Engine> {
    let path = settings.session_path()?;
    match SessionState::load(&path) {
        Ok(Some(state)) => {
            let restored = state.restore(Scheduler::new());
            info!(
                path = %path.display(),
                tracks = restored.catalog.available().len(),
                "restored session"
            );
            Some(Engine {
                catalog: restored.catalog,
                scheduler: restored.scheduler,
                exclusions: restored.exclusions,
            })
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable session");
            None
        }
    }
}

/// Every track under `dir`, in scan order, all in the playlist.
fn from_directory(settings: &config::Settings, dir: &Path) -> Engine {
    let mut engine = fresh(settings);
    for path in scan(dir, &settings.library) {
        if let Ok(Some(id)) = engine.catalog.add(path, None) {
            let _ = engine.catalog.push_playlist(id);
        }
    }
    info!(dir = %dir.display(), tracks = engine.catalog.available().len(), "scanned library");
    engine
}

fn fresh(settings: &config::Settings) -> Engine {
    let mut scheduler = Scheduler::new();
    apply_playback_defaults(&mut scheduler, settings);
    Engine {
        catalog: Catalog::new(),
        scheduler,
        exclusions: ExclusionSet::from_names(&settings.exclusions.names, settings.exclusions.enabled),
    }
}

pub fn apply_playback_defaults(scheduler: &mut Scheduler, settings: &config::Settings) {
    scheduler.set_shuffle(settings.playback.shuffle);
    scheduler.set_loop(settings.playback.loop_playlist);
}
