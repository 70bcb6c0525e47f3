//! Encoder session state machine.
//!
//! The encoder handle lives behind an explicit state machine instead of a
//! lazily-set optional: every operation names the states it is legal in and
//! fails with `StreamError::State` everywhere else, so configure-before-use
//! mistakes surface at the call site.
//!
//! Single-writer discipline: `submit` is only ever called from the capture
//! callback context, and `stop`/`release` only after the capture source has
//! stopped delivering callbacks.

use std::time::Duration;

use crate::convert;
use crate::errors::StreamError;
use crate::streaming::config::EncoderConfig;
use crate::streaming::encoder::{OpenH264Encoder, OutputUnit, VideoEncoder};
use crate::types::FrameBuffer;

/// Lifecycle of one encoder session. `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconfigured,
    Configured,
    Running,
    Stopped,
    Released,
}

/// Result of submitting one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The frame was handed to the encoder.
    Submitted,
    /// No input slot freed up within the bounded wait; the frame was
    /// discarded. Deliberate backpressure, not a failure: keeping only the
    /// most recent frame bounds end-to-end latency.
    Dropped,
}

const INPUT_SLOT_WAIT: Duration = Duration::from_millis(10);
const DRAIN_POLL_WAIT: Duration = Duration::from_millis(5);

pub struct EncoderSession {
    state: SessionState,
    backend: Box<dyn VideoEncoder>,
    config: Option<EncoderConfig>,
    frames_submitted: u64,
    frames_dropped: u64,
}

impl EncoderSession {
    /// Session over the bundled openh264 software backend.
    pub fn new() -> Self {
        Self::with_backend(Box::new(OpenH264Encoder::new()))
    }

    /// Session over a caller-supplied backend.
    pub fn with_backend(backend: Box<dyn VideoEncoder>) -> Self {
        Self {
            state: SessionState::Unconfigured,
            backend,
            config: None,
            frames_submitted: 0,
            frames_dropped: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> Option<&EncoderConfig> {
        self.config.as_ref()
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Allocate the encoder resource for `config`.
    ///
    /// Valid only from `Unconfigured`. A failure here is fatal to the
    /// session; the caller must release it and report upward, not retry.
    pub fn configure(&mut self, config: EncoderConfig) -> Result<(), StreamError> {
        if self.state != SessionState::Unconfigured {
            return Err(StreamError::State(format!(
                "configure called in {:?}",
                self.state
            )));
        }
        config.validate()?;
        self.backend.configure(&config)?;

        log::info!(
            "Encoder session configured: {}x{} @ {:.1}fps, {} bps",
            config.width,
            config.height,
            config.frame_rate_fps,
            config.bitrate_bps
        );
        self.config = Some(config);
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Begin accepting frames. Valid only from `Configured`.
    pub fn start(&mut self) -> Result<(), StreamError> {
        if self.state != SessionState::Configured {
            return Err(StreamError::State(format!(
                "start called in {:?}",
                self.state
            )));
        }
        self.state = SessionState::Running;
        Ok(())
    }

    /// Convert and submit one captured frame.
    ///
    /// Valid only in `Running`. Waits at most 10 ms for a writable input
    /// slot; when none frees up the frame is dropped, never queued.
    pub fn submit(&mut self, frame: &FrameBuffer) -> Result<SubmitOutcome, StreamError> {
        if self.state != SessionState::Running {
            return Err(StreamError::State(format!(
                "submit called in {:?}",
                self.state
            )));
        }

        if !self.backend.try_reserve_input(INPUT_SLOT_WAIT) {
            self.frames_dropped += 1;
            log::debug!(
                "No input slot within {:?}; dropping frame at {}us ({} dropped total)",
                INPUT_SLOT_WAIT,
                frame.capture_timestamp_us,
                self.frames_dropped
            );
            return Ok(SubmitOutcome::Dropped);
        }

        let config = self
            .config
            .as_ref()
            .expect("Running implies Configured");
        let yuv = convert::convert(frame, config.color_format);
        self.backend.submit(&yuv, frame.capture_timestamp_us)?;
        self.frames_submitted += 1;
        Ok(SubmitOutcome::Submitted)
    }

    /// Collect every output unit available right now.
    ///
    /// Valid in `Running` and in `Stopped` (to flush what the encoder still
    /// holds after end-of-stream). Never blocks waiting for frames that were
    /// not submitted.
    pub fn drain(&mut self) -> Result<Vec<OutputUnit>, StreamError> {
        match self.state {
            SessionState::Running | SessionState::Stopped => {}
            other => {
                return Err(StreamError::State(format!("drain called in {:?}", other)));
            }
        }

        let mut units = Vec::new();
        while let Some(unit) = self.backend.dequeue(DRAIN_POLL_WAIT) {
            units.push(unit);
        }
        Ok(units)
    }

    /// Ask the backend to encode the next frame as a sync point.
    /// No-op outside `Running`.
    pub fn request_keyframe(&mut self) {
        if self.state == SessionState::Running {
            self.backend.request_key_frame();
        }
    }

    /// Signal end-of-stream. Valid only from `Running`; remaining output
    /// flushes on subsequent `drain` calls.
    pub fn stop(&mut self) -> Result<(), StreamError> {
        if self.state != SessionState::Running {
            return Err(StreamError::State(format!(
                "stop called in {:?}",
                self.state
            )));
        }
        self.backend.signal_end_of_stream();
        self.state = SessionState::Stopped;
        log::info!(
            "Encoder session stopped after {} frames ({} dropped)",
            self.frames_submitted,
            self.frames_dropped
        );
        Ok(())
    }

    /// Free the encoder resource. Idempotent: safe from any state, silent on
    /// repeat calls.
    pub fn release(&mut self) {
        if self.state == SessionState::Released {
            return;
        }
        self.backend.release();
        self.state = SessionState::Released;
    }
}

impl Default for EncoderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        // The owning caller is responsible for release() on every exit path;
        // this is the backstop for panics and early returns.
        self.release();
    }
}
