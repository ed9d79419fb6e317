//! Playback: the event-driven controller, its scheduler, the output sink and
//! the thread that ties them together.

mod controller;
mod player;
mod scheduler;
mod sink;
mod thread;
mod types;

pub use controller::Controller;
pub use player::AudioPlayer;
pub use scheduler::Scheduler;
pub use sink::{OutputSink, RodioSink};
pub use types::{AudioCmd, Elapsed, PlaybackHandle, PlaybackInfo, PlayerSnapshot, PlayerState, SinkEvent};
