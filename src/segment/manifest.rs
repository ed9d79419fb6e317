//! Track manifests: a small text format naming a track's segments.
//!
//! ```text
//! BD1             <- segment directory, relative to the manifest
//! 4               <- entry count
//! A               <- plays, then continues with the next line
//! B
//! C   B           <- explicit next segment; pointing back closes a loop
//! D   @TAG END    <- the track ends after this segment
//! ```
//!
//! `@TAG <name>` names an end segment played once if the pass stops on
//! that entry. Segment `X` is read from `<dir>/X.<ext>` and decoded with
//! `rodio`. Blank lines and `#` comments are ignored.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rodio::{Decoder, Source};
use tracing::{debug, warn};

use crate::error::DecodeError;

use super::graph::{Link, SegmentBuffer, SegmentDecoder, SegmentEntry, SegmentGraph, SegmentSource};

/// Decodes manifest-described tracks whose segments are ordinary audio files.
#[derive(Debug, Clone)]
pub struct ManifestDecoder {
    segment_extension: String,
}

impl ManifestDecoder {
    pub fn new(segment_extension: impl Into<String>) -> Self {
        let ext: String = segment_extension.into();
        Self {
            segment_extension: ext.trim().trim_start_matches('.').to_string(),
        }
    }
}

impl SegmentDecoder for ManifestDecoder {
    fn open(&self, path: &Path) -> Result<SegmentGraph, DecodeError> {
        let text = fs::read_to_string(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = parse_manifest(&text, path)?;
        let base = path.parent().unwrap_or(Path::new("."));
        let source = FileSegmentSource {
            dir: base.join(&manifest.dir),
            extension: self.segment_extension.clone(),
        };
        debug!(path = %path.display(), entries = manifest.entries.len(), "opened segment graph");
        Ok(SegmentGraph::new(manifest.entries, Box::new(source)))
    }
}

#[derive(Debug)]
pub(crate) struct Manifest {
    pub dir: String,
    pub entries: Vec<SegmentEntry>,
}

/// One entry line before next-names are resolved to indices.
struct RawEntry {
    line: usize,
    name: String,
    next: Option<String>,
    end: Option<String>,
    terminates: bool,
}

pub(crate) fn parse_manifest(text: &str, path: &Path) -> Result<Manifest, DecodeError> {
    let bad = |line: usize, reason: String| DecodeError::Manifest {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let (_, dir) = lines
        .next()
        .ok_or_else(|| bad(1, "missing segment directory".to_string()))?;
    let (count_line, count) = lines
        .next()
        .ok_or_else(|| bad(2, "missing entry count".to_string()))?;
    let count: usize = count
        .parse()
        .map_err(|_| bad(count_line, format!("invalid entry count {count:?}")))?;

    let mut raw = Vec::with_capacity(count);
    for (line, content) in lines.by_ref().take(count) {
        raw.push(parse_entry_line(line, content));
    }
    if raw.len() < count {
        return Err(bad(
            count_line,
            format!("declares {count} entries but lists {}", raw.len()),
        ));
    }
    if let Some((line, _)) = lines.next() {
        warn!(path = %path.display(), line, "ignoring lines past the declared entry count");
    }

    let entries = raw
        .iter()
        .enumerate()
        .map(|(i, e)| SegmentEntry {
            name: e.name.clone(),
            link: resolve_link(i, e, &raw, path),
            end: e.end.clone(),
        })
        .collect();

    Ok(Manifest {
        dir: dir.to_string(),
        entries,
    })
}

fn parse_entry_line(line: usize, content: &str) -> RawEntry {
    let mut tokens = content.split_whitespace();
    let name = tokens.next().unwrap_or_default().to_string();
    let mut entry = RawEntry {
        line,
        name,
        next: None,
        end: None,
        terminates: false,
    };

    while let Some(tok) = tokens.next() {
        if tok.eq_ignore_ascii_case("@TAG") {
            match tokens.next() {
                Some(end) if end.eq_ignore_ascii_case("END") => entry.terminates = true,
                Some(end) => entry.end = Some(end.to_string()),
                None => entry.terminates = true,
            }
        } else if entry.next.is_none() {
            entry.next = Some(tok.to_string());
        }
    }
    entry
}

fn resolve_link(index: usize, entry: &RawEntry, all: &[RawEntry], path: &Path) -> Link {
    if entry.terminates {
        return Link::Terminate;
    }
    match &entry.next {
        Some(next) => match all.iter().position(|e| e.name.eq_ignore_ascii_case(next)) {
            Some(target) => Link::Continue(target),
            None => {
                warn!(path = %path.display(), line = entry.line, next = %next, "unknown next segment, ending here");
                Link::Terminate
            }
        },
        None => Link::from_index(index + 1, all.len()),
    }
}

struct FileSegmentSource {
    dir: PathBuf,
    extension: String,
}

impl SegmentSource for FileSegmentSource {
    fn load(&mut self, name: &str) -> Result<SegmentBuffer, DecodeError> {
        let path = self.dir.join(format!("{name}.{}", self.extension));
        let file = File::open(&path).map_err(|source| DecodeError::Io {
            path: path.clone(),
            source,
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| DecodeError::Segment {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let channels = u16::from(decoder.channels());
        let sample_rate = u32::from(decoder.sample_rate());
        let samples: Vec<f32> = decoder.collect();
        Ok(SegmentBuffer::new(channels, sample_rate, samples))
    }
}
