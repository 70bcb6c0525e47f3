//! Encoder backends.
//!
//! `VideoEncoder` is the seam between the session state machine and whatever
//! actually compresses frames. The session owns exactly one backend for its
//! lifetime; input-slot reservation, submission and output dequeue all go
//! through this trait so hardware-style backends (bounded slot pools,
//! asynchronous output) and the bundled software backend share one session
//! implementation.

use std::collections::VecDeque;
use std::time::Duration;

use openh264::encoder::{Encoder, FrameType};
use openh264::formats::YUVBuffer;

use crate::convert::converted_len;
use crate::errors::StreamError;
use crate::streaming::config::EncoderConfig;
use crate::streaming::packetizer::{split_annex_b, ANNEX_B_START_CODE};
use crate::types::ColorFormat;

/// One raw unit of encoder output, before packetization.
#[derive(Debug, Clone)]
pub struct OutputUnit {
    pub data: Vec<u8>,
    /// Out-of-band codec configuration (SPS/PPS) rather than a media frame.
    pub is_config: bool,
    /// Sync point; meaningless when `is_config` is set.
    pub is_key_frame: bool,
    /// Presentation timestamp in microseconds, as the encoder reports it.
    pub pts_us: i64,
}

/// Abstraction over a stateful video encoder resource.
pub trait VideoEncoder: Send {
    /// Allocate the encoder resource for `config`. Called exactly once.
    fn configure(&mut self, config: &EncoderConfig) -> Result<(), StreamError>;

    /// Try to acquire one writable input slot, waiting at most `timeout`.
    /// Returning `false` is backpressure, not an error.
    fn try_reserve_input(&mut self, timeout: Duration) -> bool;

    /// Feed one converted frame into the reserved slot.
    fn submit(&mut self, yuv: &[u8], pts_us: i64) -> Result<(), StreamError>;

    /// Pop one finished output unit if available within `timeout`.
    fn dequeue(&mut self, timeout: Duration) -> Option<OutputUnit>;

    /// Ask for the next frame to be encoded as a sync point.
    fn request_key_frame(&mut self);

    /// Signal end-of-stream so buffered frames flush on subsequent dequeues.
    fn signal_end_of_stream(&mut self);

    /// Free the encoder resource. Must be idempotent.
    fn release(&mut self);
}

/// Software H.264 backend over openh264.
///
/// Note: openh264 0.9 does not expose bitrate/fps/keyframe-interval in its
/// public encoder API; those config fields are rate-control hints here.
/// openh264 emits SPS/PPS in-band on IDR access units, so this backend
/// splits the parameter sets into a separate config-flagged unit to present
/// the out-of-band shape the packetizer classifies on.
pub struct OpenH264Encoder {
    encoder: Option<Encoder>,
    width: u32,
    height: u32,
    pending: VecDeque<OutputUnit>,
    capacity: usize,
    frame_count: u64,
}

impl OpenH264Encoder {
    pub fn new() -> Self {
        Self {
            encoder: None,
            width: 0,
            height: 0,
            pending: VecDeque::new(),
            capacity: 4,
            frame_count: 0,
        }
    }

    /// Number of frames submitted so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for OpenH264Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoEncoder for OpenH264Encoder {
    fn configure(&mut self, config: &EncoderConfig) -> Result<(), StreamError> {
        if self.encoder.is_some() {
            return Err(StreamError::State("encoder already configured".to_string()));
        }
        if config.color_format != ColorFormat::I420 {
            return Err(StreamError::Configuration(
                "openh264 backend consumes planar I420 input".to_string(),
            ));
        }

        let encoder = Encoder::new().map_err(|e| {
            StreamError::Configuration(format!("Failed to create encoder: {}", e))
        })?;

        self.encoder = Some(encoder);
        self.width = config.width;
        self.height = config.height;
        Ok(())
    }

    fn try_reserve_input(&mut self, _timeout: Duration) -> bool {
        // A slot only frees up when output is dequeued; waiting cannot help
        // a synchronous encoder, so the bounded wait degenerates to an
        // immediate check.
        self.pending.len() < self.capacity
    }

    fn submit(&mut self, yuv: &[u8], pts_us: i64) -> Result<(), StreamError> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| StreamError::State("encoder not configured".to_string()))?;

        let expected = converted_len(self.width, self.height);
        if yuv.len() != expected {
            return Err(StreamError::Encoding(format!(
                "Invalid frame size: expected {} bytes, got {}",
                expected,
                yuv.len()
            )));
        }

        let yuv_buffer =
            YUVBuffer::from_vec(yuv.to_vec(), self.width as usize, self.height as usize);

        let bitstream = encoder
            .encode(&yuv_buffer)
            .map_err(|e| StreamError::Encoding(format!("Encoding failed: {}", e)))?;

        self.frame_count += 1;

        let is_key_frame = matches!(bitstream.frame_type(), FrameType::IDR | FrameType::I);
        let access_unit = bitstream.to_vec();

        // Peel SPS/PPS off the access unit into their own config unit.
        let mut config_data = Vec::new();
        let mut frame_data = Vec::new();
        for nal in split_annex_b(&access_unit) {
            let target = match nal.first().map(|b| b & 0x1F) {
                Some(7) | Some(8) => &mut config_data,
                _ => &mut frame_data,
            };
            target.extend_from_slice(ANNEX_B_START_CODE);
            target.extend_from_slice(nal);
        }

        if !config_data.is_empty() {
            self.pending.push_back(OutputUnit {
                data: config_data,
                is_config: true,
                is_key_frame: false,
                pts_us,
            });
        }
        self.pending.push_back(OutputUnit {
            data: frame_data,
            is_config: false,
            is_key_frame,
            pts_us,
        });

        Ok(())
    }

    fn dequeue(&mut self, _timeout: Duration) -> Option<OutputUnit> {
        self.pending.pop_front()
    }

    fn request_key_frame(&mut self) {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.force_intra_frame();
        }
    }

    fn signal_end_of_stream(&mut self) {
        // The synchronous encoder holds nothing back; already-encoded units
        // stay in `pending` until drained.
    }

    fn release(&mut self) {
        self.encoder = None;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_i420(width: u32, height: u32) -> Vec<u8> {
        let mut yuv = vec![16u8; converted_len(width, height)];
        let y_size = (width * height) as usize;
        for b in yuv[y_size..].iter_mut() {
            *b = 128;
        }
        yuv
    }

    #[test]
    fn configure_then_encode_gray_frame() {
        let mut backend = OpenH264Encoder::new();
        let config = EncoderConfig::new(320, 240, 30.0);
        backend.configure(&config).expect("configure should succeed");

        assert!(backend.try_reserve_input(Duration::from_millis(10)));
        backend
            .submit(&gray_i420(320, 240), 1_000)
            .expect("encode should succeed");

        // First frame: a config unit with parameter sets, then an IDR unit.
        let first = backend.dequeue(Duration::ZERO).expect("config unit");
        assert!(first.is_config);
        assert!(!first.data.is_empty());
        assert!(first.data.starts_with(ANNEX_B_START_CODE));

        let second = backend.dequeue(Duration::ZERO).expect("frame unit");
        assert!(!second.is_config);
        assert!(second.is_key_frame);
        assert_eq!(second.pts_us, 1_000);
        assert!(backend.dequeue(Duration::ZERO).is_none());
    }

    #[test]
    fn nv21_input_is_rejected_at_configure() {
        let mut backend = OpenH264Encoder::new();
        let config = EncoderConfig::new(320, 240, 30.0)
            .with_color_format(ColorFormat::Nv21);
        let result = backend.configure(&config);
        assert!(matches!(result, Err(StreamError::Configuration(_))));
    }

    #[test]
    fn wrong_input_size_is_an_encoding_error() {
        let mut backend = OpenH264Encoder::new();
        backend
            .configure(&EncoderConfig::new(320, 240, 30.0))
            .expect("configure should succeed");
        let result = backend.submit(&[0u8; 17], 0);
        assert!(matches!(result, Err(StreamError::Encoding(_))));
    }

    #[test]
    fn release_is_idempotent() {
        let mut backend = OpenH264Encoder::new();
        backend
            .configure(&EncoderConfig::new(320, 240, 30.0))
            .expect("configure should succeed");
        backend.release();
        backend.release();
        assert!(matches!(
            backend.submit(&gray_i420(320, 240), 0),
            Err(StreamError::State(_))
        ));
    }
}
