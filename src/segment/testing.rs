//! In-memory decoder for tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::DecodeError;

use super::graph::{Link, SegmentBuffer, SegmentDecoder, SegmentEntry, SegmentGraph, SegmentSource};

/// Sample rate of every test buffer: one sample per millisecond, mono.
pub const RATE: u32 = 1000;

/// Mono buffer lasting `millis`.
pub fn buffer_ms(millis: usize) -> SegmentBuffer {
    SegmentBuffer::new(1, RATE, vec![0.0; millis])
}

#[derive(Clone, Default)]
struct Layout {
    entries: Vec<SegmentEntry>,
    lengths: HashMap<String, usize>,
}

/// Decoder over layouts registered by path. Segment `X` lasts `lengths[X]` ms.
#[derive(Clone, Default)]
pub struct MemoryDecoder {
    layouts: Arc<Mutex<HashMap<PathBuf, Layout>>>,
    broken: Arc<Mutex<HashSet<String>>>,
    opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemoryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a straight run of segments `(name, millis)`.
    pub fn linear(&self, path: impl Into<PathBuf>, segments: &[(&str, usize)]) {
        let len = segments.len();
        let entries = segments
            .iter()
            .enumerate()
            .map(|(i, (name, _))| SegmentEntry {
                name: name.to_string(),
                link: Link::from_index(i + 1, len),
                end: None,
            })
            .collect();
        self.insert(path, entries, segments);
    }

    /// Register explicit entries; `lengths` covers every segment name used.
    pub fn insert(&self, path: impl Into<PathBuf>, entries: Vec<SegmentEntry>, lengths: &[(&str, usize)]) {
        let layout = Layout {
            entries,
            lengths: lengths.iter().map(|(n, l)| (n.to_string(), *l)).collect(),
        };
        self.layouts.lock().unwrap().insert(path.into(), layout);
    }

    /// Make loading segment `name` fail.
    pub fn break_segment(&self, name: &str) {
        self.broken.lock().unwrap().insert(name.to_string());
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

pub fn entry(name: &str, link: Link) -> SegmentEntry {
    SegmentEntry {
        name: name.to_string(),
        link,
        end: None,
    }
}

struct MemorySource {
    lengths: HashMap<String, usize>,
    broken: Arc<Mutex<HashSet<String>>>,
}

impl SegmentSource for MemorySource {
    fn load(&mut self, name: &str) -> Result<SegmentBuffer, DecodeError> {
        if self.broken.lock().unwrap().contains(name) {
            return Err(DecodeError::Segment {
                name: name.to_string(),
                reason: "corrupt".to_string(),
            });
        }
        self.lengths
            .get(name)
            .map(|ms| buffer_ms(*ms))
            .ok_or_else(|| DecodeError::Segment {
                name: name.to_string(),
                reason: "unknown segment".to_string(),
            })
    }
}

impl SegmentDecoder for MemoryDecoder {
    fn open(&self, path: &Path) -> Result<SegmentGraph, DecodeError> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        let layout = self
            .layouts
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| DecodeError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no layout"),
            })?;
        Ok(SegmentGraph::new(
            layout.entries,
            Box::new(MemorySource {
                lengths: layout.lengths,
                broken: self.broken.clone(),
            }),
        ))
    }
}
