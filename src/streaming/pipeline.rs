//! Per-frame pipeline driver.
//!
//! One `process_frame` call runs the whole cycle for a single captured
//! frame - convert, submit, drain, packetize, send - on the caller's
//! execution context. The expected pairing is a capture source configured to
//! keep only the latest frame: each callback completes (or abandons the
//! frame via backpressure) before the next one is dispatched, so there is no
//! internal thread pool and no frame queue.

use crate::errors::StreamError;
use crate::sink::StreamSink;
use crate::streaming::config::{EncoderConfig, PipelineStats};
use crate::streaming::encoder::OutputUnit;
use crate::streaming::packetizer::Packetizer;
use crate::streaming::session::{EncoderSession, SubmitOutcome};
use crate::types::{FrameBuffer, PacketKind};

pub struct StreamPipeline<S: StreamSink> {
    session: EncoderSession,
    packetizer: Packetizer,
    sink: S,
    packets_sent: u64,
    packets_discarded: u64,
    config_packets: u64,
    bytes_sent: u64,
}

impl<S: StreamSink> StreamPipeline<S> {
    /// Build a pipeline over the bundled software encoder: configures and
    /// starts the session immediately.
    pub fn new(config: EncoderConfig, packetizer: Packetizer, sink: S) -> Result<Self, StreamError> {
        Self::from_parts(EncoderSession::new(), config, packetizer, sink)
    }

    /// Build a pipeline from an unconfigured session (e.g. one created with
    /// a caller-supplied backend).
    pub fn from_parts(
        mut session: EncoderSession,
        config: EncoderConfig,
        packetizer: Packetizer,
        sink: S,
    ) -> Result<Self, StreamError> {
        // A configure failure is fatal: release before reporting upward.
        if let Err(e) = session.configure(config).and_then(|_| session.start()) {
            session.release();
            return Err(e);
        }

        Ok(Self {
            session,
            packetizer,
            sink,
            packets_sent: 0,
            packets_discarded: 0,
            config_packets: 0,
            bytes_sent: 0,
        })
    }

    /// Run one frame through the pipeline.
    ///
    /// Consumes the frame; its backing storage is released exactly once when
    /// this call returns, on every path. A backpressure drop is not an
    /// error, and neither is a disconnected sink.
    pub fn process_frame(&mut self, frame: FrameBuffer) -> Result<(), StreamError> {
        if self.session.submit(&frame)? == SubmitOutcome::Dropped {
            // Frame discarded; still drain so encoder output keeps moving.
            let units = self.session.drain()?;
            return self.dispatch(units);
        }
        let units = self.session.drain()?;
        self.dispatch(units)
    }

    /// Force the next encoded frame to be a sync point, e.g. when a sink
    /// (re)connects mid-stream.
    pub fn request_keyframe(&mut self) {
        self.session.request_keyframe();
    }

    pub fn frames_submitted(&self) -> u64 {
        self.session.frames_submitted()
    }

    pub fn frames_dropped(&self) -> u64 {
        self.session.frames_dropped()
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Stop the session, flush remaining output, release the encoder and
    /// report statistics. The encoder resource is released on every path.
    pub fn finish(mut self) -> Result<PipelineStats, StreamError> {
        let flush_result = self.flush_remaining();
        self.session.release();
        flush_result?;

        let stats = PipelineStats {
            frames_submitted: self.session.frames_submitted(),
            frames_dropped: self.session.frames_dropped(),
            packets_sent: self.packets_sent,
            packets_discarded: self.packets_discarded,
            config_packets: self.config_packets,
            bytes_sent: self.bytes_sent,
        };
        log::info!(
            "Pipeline finished: {} frames in, {} dropped, {} packets ({} bytes) sent",
            stats.frames_submitted,
            stats.frames_dropped,
            stats.packets_sent,
            stats.bytes_sent
        );
        Ok(stats)
    }

    fn flush_remaining(&mut self) -> Result<(), StreamError> {
        self.session.stop()?;
        let units = self.session.drain()?;
        self.dispatch(units)
    }

    fn dispatch(&mut self, units: Vec<OutputUnit>) -> Result<(), StreamError> {
        for unit in units {
            let Some(packet) = self.packetizer.packetize(unit) else {
                continue; // Suppressed by the parameter-set policy.
            };

            // Live video, not DVR: no connection means no packet.
            if !self.sink.is_connected() {
                self.packets_discarded += 1;
                log::debug!(
                    "Sink not connected; discarding {:?} packet at {}us",
                    packet.kind,
                    packet.presentation_timestamp_us
                );
                continue;
            }

            self.sink.send_packet(
                &packet.payload,
                packet.presentation_timestamp_us,
                packet.kind == PacketKind::KeyFrame,
            )?;
            self.packets_sent += 1;
            self.bytes_sent += packet.payload.len() as u64;
            if packet.kind == PacketKind::ConfigData {
                self.config_packets += 1;
            }
        }
        Ok(())
    }
}
