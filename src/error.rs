//! Error types for the playback engine.
//!
//! `Error` is the crate-wide taxonomy. Decoder and playlist failures have
//! their own enums so callers can match on the detail they care about.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A segment graph could not be opened or one of its buffers could not be read.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Manifest {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("segment {name}: {reason}")]
    Segment { name: String, reason: String },
}

/// Grammar violations found while parsing an M3U playlist.
///
/// Line numbers are 1-based positions in the decoded text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaylistError {
    #[error("line {line}: expected #EXTM3U header, found {found:?}")]
    MalformedHeader { line: usize, found: String },

    #[error("line {line}: unknown directive {directive:?}")]
    UnknownDirective { line: usize, directive: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("malformed playlist: {0}")]
    MalformedPlaylist(#[from] PlaylistError),

    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("cancelled")]
    Cancelled,

    #[error("index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("catalog cannot be modified while playing")]
    CatalogLocked,

    #[error("audio output: {0}")]
    Output(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session state: {0}")]
    Session(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
