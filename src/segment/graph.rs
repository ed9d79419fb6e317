use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::DecodeError;

/// Where playback goes after an entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Link {
    Continue(usize),
    Terminate,
}

impl Link {
    /// Build a link from a raw next-index, terminating when it is out of range.
    pub fn from_index(next: usize, len: usize) -> Self {
        if next < len {
            Self::Continue(next)
        } else {
            Self::Terminate
        }
    }

    /// The entry that follows `current` in a single forward pass.
    ///
    /// Back-edges (`next <= current`) close a loop and end the pass, as do
    /// out-of-range indices. Every walk built on this terminates.
    pub fn step(self, current: usize, len: usize) -> Option<usize> {
        match self {
            Self::Continue(next) if next > current && next < len => Some(next),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    pub name: String,
    pub link: Link,
    /// Segment played once when the pass ends on this entry.
    pub end: Option<String>,
}

/// Decoded interleaved samples of one segment.
#[derive(Clone, PartialEq)]
pub struct SegmentBuffer {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl SegmentBuffer {
    pub fn new(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            channels,
            sample_rate,
            samples,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.channels == 0 || self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as u64 / u64::from(self.channels);
        Duration::from_nanos(frames * 1_000_000_000 / u64::from(self.sample_rate))
    }
}

impl fmt::Debug for SegmentBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentBuffer")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("duration", &self.duration())
            .finish()
    }
}

/// Loads segment audio by name. Owned by a graph; dropped with it.
pub trait SegmentSource: Send {
    fn load(&mut self, name: &str) -> Result<SegmentBuffer, DecodeError>;
}

/// The segment layout of one track, with lazy access to its audio.
pub struct SegmentGraph {
    entries: Vec<SegmentEntry>,
    source: Box<dyn SegmentSource>,
}

impl SegmentGraph {
    pub fn new(entries: Vec<SegmentEntry>, source: Box<dyn SegmentSource>) -> Self {
        Self { entries, source }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SegmentEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&SegmentEntry> {
        self.entries.get(index)
    }

    /// Following entry of `index` in a forward pass.
    pub fn step(&self, index: usize) -> Option<usize> {
        self.entries
            .get(index)
            .and_then(|e| e.link.step(index, self.entries.len()))
    }

    pub fn buffer(&mut self, index: usize) -> Result<SegmentBuffer, DecodeError> {
        let name = self.entry_name(index)?;
        self.source.load(&name)
    }

    pub fn end_buffer(&mut self, index: usize) -> Result<Option<SegmentBuffer>, DecodeError> {
        match self.entries.get(index).and_then(|e| e.end.clone()) {
            Some(name) => self.source.load(&name).map(Some),
            None => Ok(None),
        }
    }

    fn entry_name(&self, index: usize) -> Result<String, DecodeError> {
        self.entries
            .get(index)
            .map(|e| e.name.clone())
            .ok_or_else(|| DecodeError::Segment {
                name: format!("#{index}"),
                reason: format!("no such entry (graph has {})", self.entries.len()),
            })
    }

    /// Total playing time of one forward pass from the first entry, including
    /// the end segment of the entry the pass stops on. Every buffer is decoded.
    pub fn total_duration(&mut self) -> Result<Duration, DecodeError> {
        let mut total = Duration::ZERO;
        if self.entries.is_empty() {
            return Ok(total);
        }

        let mut index = 0;
        loop {
            total += self.buffer(index)?.duration();
            match self.step(index) {
                Some(next) => index = next,
                None => {
                    if let Some(end) = self.end_buffer(index)? {
                        total += end.duration();
                    }
                    return Ok(total);
                }
            }
        }
    }
}

impl fmt::Debug for SegmentGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentGraph")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

/// Opens the segment graph of a track file.
pub trait SegmentDecoder: Send + Sync {
    fn open(&self, path: &Path) -> Result<SegmentGraph, DecodeError>;
}
