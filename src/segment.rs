//! Segment graphs: how a track is stitched together from audio segments.
//!
//! A `SegmentDecoder` turns a track file into a `SegmentGraph`. The
//! `SegmentBridge` walks that graph once, skipping excluded segments, and
//! feeds the output sink buffer by buffer.

mod bridge;
mod graph;
mod manifest;

pub use bridge::{BridgeState, SegmentBridge};
pub use graph::{Link, SegmentBuffer, SegmentDecoder, SegmentEntry, SegmentGraph, SegmentSource};
pub use manifest::ManifestDecoder;

#[cfg(test)]
pub(crate) mod testing;
