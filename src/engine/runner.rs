//! The blocking read loop
//!
//! Reads a line, processes it completely, then reads the next. Bad lines are
//! skipped; too many in a row ends the run.

use super::{Engine, OutputSink};
use crate::config::ErrorConfig;
use crate::error::FrameError;
use crate::sources::{FrameParser, LineSource};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// What a finished run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames processed
    pub frames: u64,
    /// Lines skipped
    pub errors: u64,
}

/// Ask a running loop to stop after the current line
///
/// Returns true if a stop was already pending. The loop only sees the flag
/// between lines, so a caller blocked on a silent input should exit on a
/// second request.
pub fn request_stop(stop: &AtomicBool) -> bool {
    stop.swap(true, Ordering::SeqCst)
}

/// Drives an engine from a line source into an output sink
pub struct Runner<S, O> {
    engine: Engine,
    parser: FrameParser,
    source: S,
    sink: O,
    policy: ErrorConfig,
    consecutive_errors: u32,
    summary: RunSummary,
}

impl<S: LineSource, O: OutputSink> Runner<S, O> {
    pub fn new(engine: Engine, source: S, sink: O, policy: ErrorConfig) -> Self {
        let parser = FrameParser::new(engine.frame_len());
        Self {
            engine,
            parser,
            source,
            sink,
            policy,
            consecutive_errors: 0,
            summary: RunSummary::default(),
        }
    }

    /// Read and process one line
    ///
    /// Returns `Ok(false)` at end of input. Sink failures are returned as
    /// errors; bad lines come back as `Ok(true)` after being counted.
    pub fn step(&mut self) -> Result<bool> {
        let frame = match self.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(false),
            Err(e) => {
                self.record_error(e)?;
                return Ok(true);
            }
        };

        self.engine.process(&frame, &mut self.sink)?;
        self.consecutive_errors = 0;
        self.summary.frames += 1;
        Ok(true)
    }

    fn next_frame(&mut self) -> Result<Option<crate::sources::Frame>, FrameError> {
        match self.source.next_line()? {
            Some(line) => Ok(Some(self.parser.parse(&line)?)),
            None => Ok(None),
        }
    }

    fn record_error(&mut self, e: FrameError) -> Result<()> {
        self.summary.errors += 1;
        self.consecutive_errors += 1;
        warn!(consecutive = self.consecutive_errors, "skipping line: {}", e);

        if self.consecutive_errors > self.policy.max_consecutive {
            if self.policy.release_on_abort {
                self.release();
            }
            error!("giving up on {}", self.source.name());
            bail!("Too many read failures (>{})", self.policy.max_consecutive);
        }
        Ok(())
    }

    /// Run until end of input or until `stop` is set
    ///
    /// Held notes are released before returning, except when giving up with
    /// `release_on_abort` turned off.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<RunSummary> {
        info!("reading frames from {}", self.source.name());

        while !stop.load(Ordering::SeqCst) {
            if !self.step()? {
                debug!("end of input");
                break;
            }
        }

        self.release();
        info!(frames = self.summary.frames, errors = self.summary.errors, "stopped");
        Ok(self.summary)
    }

    fn release(&mut self) {
        match self.engine.release_all(&mut self.sink) {
            Ok(0) => {}
            Ok(n) => info!("released {} held notes", n),
            Err(e) => warn!("failed to release held notes: {}", e),
        }
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn sink(&self) -> &O {
        &self.sink
    }

    pub fn into_sink(self) -> O {
        self.sink
    }
}
