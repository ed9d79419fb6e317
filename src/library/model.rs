use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Identity of a catalog entry. Stays valid after other tracks are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub(crate) u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub path: PathBuf,
    /// Grouping label shown next to the file name (the containing directory).
    pub location: String,
    pub duration: Option<Duration>,
    /// A background duration job has been submitted and not yet reported back.
    pub pending: bool,
}

impl Track {
    pub(crate) fn new(id: TrackId, path: PathBuf, duration: Option<Duration>) -> Self {
        let location = location_for(&path);
        Self {
            id,
            path,
            location,
            duration,
            pending: false,
        }
    }

    /// File name without extension, or the full path if it has none.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn location_for(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}
