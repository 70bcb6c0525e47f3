//! FrameCast: real-time camera frame to H.264 wire encoding pipeline
//!
//! This crate turns raw sensor frames into protocol-ready encoded packets:
//! stride-aware YUV 4:2:0 color conversion, a stateful encoder session with
//! bounded-wait backpressure, and packetization with parameter-set handling
//! and Annex-B framing.
//!
//! # Features
//! - Stride-aware I420/NV21 conversion for padded sensor planes
//! - Explicit encoder session state machine (no configure-before-use bugs)
//! - Drop-latest backpressure bounding end-to-end latency
//! - SPS/PPS classification with configurable re-send policy
//! - Pluggable framing (Annex-B prefix vs. raw) and encoder backends
//!
//! # Usage
//! ```rust,ignore
//! use framecast::streaming::{EncoderConfig, Packetizer, StreamPipeline};
//!
//! let config = EncoderConfig::new(1280, 720, 30.0);
//! let mut pipeline = StreamPipeline::new(config, Packetizer::default(), sink)?;
//!
//! // Capture callback, one frame at a time:
//! pipeline.process_frame(frame)?;
//!
//! // Teardown:
//! let stats = pipeline.finish()?;
//! ```
//!
//! Connection management (connect/disconnect/auth) stays outside this crate;
//! see [`sink::StreamSink`] and [`sink::ConnectionFlag`] for the boundary.
pub mod convert;
pub mod errors;
pub mod sink;
pub mod streaming;
pub mod types;

// Testing utilities - synthetic data and fakes for offline testing
pub mod testing;

// Re-exports for convenience
pub use errors::StreamError;
pub use sink::{ConnectionFlag, StreamSink};
pub use streaming::{
    EncoderConfig, EncoderSession, Packetizer, PipelineStats, SessionState, StreamPipeline,
    StreamQuality, SubmitOutcome,
};
pub use types::{ColorFormat, EncodedPacket, FrameBuffer, PacketKind};

/// Initialize logging for the streaming pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "framecast=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
