//! canto: a player for segmented music tracks.
//!
//! A track is a manifest naming a graph of short audio segments. The
//! player walks that graph once per track, skips excluded segments and
//! hands the audio to an output sink. Around it sit a catalog of tracks,
//! a shuffle/loop scheduler, M3U/M3U8 import and export, background
//! duration estimation and a saved session.

pub mod audio;
pub mod config;
pub mod error;
pub mod estimator;
pub mod library;
pub mod playlist;
pub mod runtime;
pub mod segment;
pub mod session;

pub use error::{Error, Result};
