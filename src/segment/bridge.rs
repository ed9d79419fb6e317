use std::path::Path;

use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::library::ExclusionSet;

use super::graph::{SegmentBuffer, SegmentDecoder, SegmentGraph};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BridgeState {
    Closed,
    Open,
    Exhausted,
}

/// Read cursor over one track's segment graph.
///
/// Hands out one buffer per retained entry in a single forward pass and
/// reports exhaustion when the pass ends. Excluded entries are walked over
/// without being decoded.
#[derive(Debug)]
pub struct SegmentBridge {
    graph: Option<SegmentGraph>,
    cursor: Option<usize>,
    /// Entry whose end segment is still owed once the pass stops.
    end_of: Option<usize>,
    state: BridgeState,
}

impl SegmentBridge {
    pub fn open(decoder: &dyn SegmentDecoder, path: &Path) -> Result<Self, DecodeError> {
        let graph = decoder.open(path)?;
        let cursor = if graph.is_empty() { None } else { Some(0) };
        Ok(Self {
            graph: Some(graph),
            cursor,
            end_of: None,
            state: BridgeState::Open,
        })
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// The next buffer to play, or `None` once the pass is over.
    ///
    /// A decode failure ends the pass and is returned to the caller.
    pub fn next_buffer(&mut self, exclusions: &ExclusionSet) -> Result<Option<SegmentBuffer>, DecodeError> {
        if self.state != BridgeState::Open {
            return Ok(None);
        }
        let Some(graph) = self.graph.as_mut() else {
            self.state = BridgeState::Exhausted;
            return Ok(None);
        };

        while let Some(index) = self.cursor {
            let next = graph.step(index);
            self.cursor = next;

            let Some(entry) = graph.entry(index) else { break };
            if exclusions.excludes(&entry.name) {
                trace!(segment = %entry.name, "segment excluded");
                continue;
            }
            if next.is_none() && entry.end.is_some() {
                self.end_of = Some(index);
            }

            return match graph.buffer(index) {
                Ok(buffer) => Ok(Some(buffer)),
                Err(e) => {
                    self.state = BridgeState::Exhausted;
                    Err(e)
                }
            };
        }

        if let Some(index) = self.end_of.take() {
            let end = graph.entry(index).and_then(|e| e.end.as_deref());
            if let Some(name) = end.filter(|name| exclusions.excludes(name)) {
                trace!(segment = %name, "end segment excluded");
            } else {
                match graph.end_buffer(index) {
                    Ok(Some(buffer)) => return Ok(Some(buffer)),
                    Ok(None) => {}
                    Err(e) => {
                        self.state = BridgeState::Exhausted;
                        return Err(e);
                    }
                }
            }
        }

        debug!("segment pass exhausted");
        self.state = BridgeState::Exhausted;
        Ok(None)
    }

    /// Release the graph and its decoder. Safe to call more than once.
    pub fn close(&mut self) {
        if self.graph.take().is_some() {
            debug!("segment bridge closed");
        }
        self.cursor = None;
        self.end_of = None;
        self.state = BridgeState::Closed;
    }
}

impl Drop for SegmentBridge {
    fn drop(&mut self) {
        self.close();
    }
}
