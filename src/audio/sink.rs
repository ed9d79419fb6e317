//! The output side: a push-buffer sink that reports its lifecycle as events.
//!
//! `RodioSink` drives the default output device through `rodio`. A fresh
//! `rodio::Sink` is created for every start so nothing queued for the old
//! track can leak into the new one.

use std::sync::mpsc::Sender;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::segment::SegmentBuffer;

use super::types::SinkEvent;

/// Output device contract used by the controller.
///
/// Control calls return immediately; their effect is reported later as a
/// `SinkEvent` on the channel the sink was built with.
pub trait OutputSink {
    fn start(&mut self);
    fn stop(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn add_buffer(&mut self, buffer: SegmentBuffer) -> Result<()>;
    /// Buffers queued and not yet fully played.
    fn queued(&self) -> usize;
    fn is_playing(&self) -> bool;
    fn is_paused(&self) -> bool;
}

pub struct RodioSink {
    stream: OutputStream,
    sink: Option<Sink>,
    events: Sender<SinkEvent>,
    paused: bool,
    underrun_reported: bool,
}

impl RodioSink {
    /// Open the default output device.
    pub fn open(events: Sender<SinkEvent>) -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| Error::Output(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for an interactive player.
        stream.log_on_drop(false);

        let _ = events.send(SinkEvent::Open);
        Ok(Self {
            stream,
            sink: None,
            events,
            paused: false,
            underrun_reported: false,
        })
    }

    fn emit(&self, event: SinkEvent) {
        if self.events.send(event).is_err() {
            debug!("sink event receiver gone");
        }
    }

    /// Ask for audio when fewer than `low_water` buffers are queued.
    pub fn poll(&mut self, low_water: usize) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if self.paused {
            return;
        }
        let queued = sink.len();
        if queued == 0 && !self.underrun_reported {
            warn!("output queue ran dry");
            self.underrun_reported = true;
        }
        if queued < low_water {
            self.emit(SinkEvent::BufferRequest);
        }
    }

    pub fn close(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.emit(SinkEvent::Close);
    }
}

impl OutputSink for RodioSink {
    fn start(&mut self) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        let sink = Sink::connect_new(self.stream.mixer());
        sink.play();
        self.sink = Some(sink);
        self.paused = false;
        self.underrun_reported = false;
        self.emit(SinkEvent::Start);
        self.emit(SinkEvent::BufferRequest);
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.paused = false;
        self.emit(SinkEvent::Stop);
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
            self.paused = true;
            self.emit(SinkEvent::Pause);
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
            self.paused = false;
            self.emit(SinkEvent::Resume);
        }
    }

    fn add_buffer(&mut self, buffer: SegmentBuffer) -> Result<()> {
        let Some(sink) = self.sink.as_ref() else {
            return Err(Error::Output("buffer pushed to a stopped sink".to_string()));
        };
        let unplayable = || {
            Error::Output(format!(
                "unplayable buffer: {} channels at {} Hz",
                buffer.channels, buffer.sample_rate
            ))
        };
        if buffer.channels == 0 || buffer.sample_rate == 0 {
            return Err(unplayable());
        }
        let (Ok(channels), Ok(rate)) = (buffer.channels.try_into(), buffer.sample_rate.try_into())
        else {
            return Err(unplayable());
        };
        sink.append(SamplesBuffer::new(channels, rate, buffer.samples));
        self.underrun_reported = false;
        Ok(())
    }

    fn queued(&self) -> usize {
        self.sink.as_ref().map_or(0, Sink::len)
    }

    fn is_playing(&self) -> bool {
        self.sink.is_some() && !self.paused
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
