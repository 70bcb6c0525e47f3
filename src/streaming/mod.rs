//! Live streaming pipeline for FrameCast
//!
//! This module provides the frame-to-wire encoding path:
//! - openh264 for H.264 encoding behind a pluggable backend trait
//! - an explicit encoder session state machine with bounded-wait backpressure
//! - packetization of encoder output into protocol-ready units
//!
//! # Example
//! ```rust,ignore
//! use framecast::streaming::{EncoderConfig, Packetizer, StreamPipeline};
//!
//! let config = EncoderConfig::new(1280, 720, 30.0);
//! let mut pipeline = StreamPipeline::new(config, Packetizer::default(), sink)?;
//!
//! // In your capture callback:
//! pipeline.process_frame(frame)?;
//!
//! // When done:
//! let stats = pipeline.finish()?;
//! ```

mod config;
mod encoder;
mod packetizer;
mod pipeline;
mod session;

pub use config::{EncoderConfig, PipelineStats, StreamQuality};
pub use encoder::{OpenH264Encoder, OutputUnit, VideoEncoder};
pub use packetizer::{
    split_annex_b, starts_with_start_code, ConfigPolicy, Framing, Packetizer,
    ANNEX_B_START_CODE,
};
pub use pipeline::StreamPipeline;
pub use session::{EncoderSession, SessionState, SubmitOutcome};
