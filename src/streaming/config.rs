//! Encoder session configuration types

use serde::{Deserialize, Serialize};

use crate::types::ColorFormat;

/// Quality presets for live streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamQuality {
    /// 720p at 30fps, lower bitrate - constrained uplinks
    Low,
    /// 1080p at 30fps, standard bitrate - balanced quality
    Medium,
    /// 1080p at 30fps, high bitrate - quality over bandwidth
    High,
    /// Custom settings
    Custom,
}

impl StreamQuality {
    /// Get recommended bitrate in bits per second
    pub fn bitrate_bps(&self) -> u32 {
        match self {
            StreamQuality::Low => 1_200_000,    // 1.2 Mbps for 720p
            StreamQuality::Medium => 4_500_000, // 4.5 Mbps for 1080p
            StreamQuality::High => 8_000_000,   // 8 Mbps for 1080p
            StreamQuality::Custom => 4_500_000, // Default to medium
        }
    }

    /// Get recommended resolution (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            StreamQuality::Low => (1280, 720),
            StreamQuality::Medium => (1920, 1080),
            StreamQuality::High => (1920, 1080),
            StreamQuality::Custom => (1920, 1080),
        }
    }

    /// Get recommended framerate
    pub fn fps(&self) -> f64 {
        30.0
    }
}

impl Default for StreamQuality {
    fn default() -> Self {
        StreamQuality::Medium
    }
}

/// Configuration for one encoder session.
///
/// Immutable once the session reaches Configured: a resolution or camera
/// switch invalidates the encoder resource and requires tearing the session
/// down and creating a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Video width in pixels
    pub width: u32,
    /// Video height in pixels
    pub height: u32,
    /// Target bitrate in bits per second
    pub bitrate_bps: u32,
    /// Frames per second
    pub frame_rate_fps: f64,
    /// Seconds between forced sync frames
    pub key_frame_interval_sec: u32,
    /// Pixel layout the encoder expects on its input
    pub color_format: ColorFormat,
    /// Quality preset used
    pub quality: StreamQuality,
}

impl EncoderConfig {
    /// Create a configuration with explicit dimensions
    pub fn new(width: u32, height: u32, frame_rate_fps: f64) -> Self {
        Self {
            width,
            height,
            bitrate_bps: StreamQuality::Medium.bitrate_bps(),
            frame_rate_fps,
            key_frame_interval_sec: 2,
            color_format: ColorFormat::I420,
            quality: StreamQuality::Custom,
        }
    }

    /// Create configuration from a quality preset
    pub fn from_quality(quality: StreamQuality) -> Self {
        let (width, height) = quality.resolution();
        Self {
            width,
            height,
            bitrate_bps: quality.bitrate_bps(),
            frame_rate_fps: quality.fps(),
            key_frame_interval_sec: 2,
            color_format: ColorFormat::I420,
            quality,
        }
    }

    /// Set custom bitrate
    pub fn with_bitrate(mut self, bitrate_bps: u32) -> Self {
        self.bitrate_bps = bitrate_bps;
        self
    }

    /// Set the keyframe interval in seconds
    pub fn with_key_frame_interval(mut self, seconds: u32) -> Self {
        self.key_frame_interval_sec = seconds;
        self
    }

    /// Set the input pixel layout
    pub fn with_color_format(mut self, format: ColorFormat) -> Self {
        self.color_format = format;
        self
    }

    /// Basic sanity checks before handing the config to a backend.
    pub fn validate(&self) -> Result<(), crate::errors::StreamError> {
        if self.width == 0 || self.height == 0 {
            return Err(crate::errors::StreamError::Configuration(format!(
                "invalid resolution {}x{}",
                self.width, self.height
            )));
        }
        if self.bitrate_bps == 0 {
            return Err(crate::errors::StreamError::Configuration(
                "bitrate must be positive".to_string(),
            ));
        }
        if self.frame_rate_fps <= 0.0 {
            return Err(crate::errors::StreamError::Configuration(
                "frame rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::from_quality(StreamQuality::Medium)
    }
}

/// Statistics returned after finishing a streaming pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Frames handed to the encoder
    pub frames_submitted: u64,
    /// Frames discarded under backpressure (no input slot in time)
    pub frames_dropped: u64,
    /// Packets delivered to the sink
    pub packets_sent: u64,
    /// Packets discarded because the sink was not connected
    pub packets_discarded: u64,
    /// Config (parameter set) packets among those sent
    pub config_packets: u64,
    /// Total payload bytes delivered to the sink
    pub bytes_sent: u64,
}

impl PipelineStats {
    /// Fraction of captured frames that reached the encoder.
    pub fn submit_ratio(&self) -> f64 {
        let total = self.frames_submitted + self.frames_dropped;
        if total > 0 {
            self.frames_submitted as f64 / total as f64
        } else {
            0.0
        }
    }
}
