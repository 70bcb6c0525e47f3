//! Core value types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// Pixel layout the encoder session is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFormat {
    /// Planar 4:2:0 - full Y plane followed by U plane then V plane.
    I420,
    /// Semi-planar 4:2:0 - full Y plane followed by interleaved U,V samples.
    Nv21,
}

/// One captured raw frame in the sensor's native planar layout.
///
/// Planes may carry padding: `luma_row_stride` / `chroma_row_stride` can
/// exceed the logical sample width, and `chroma_pixel_stride` can be 2 when
/// the sensor hands back semi-planar chroma. Consumers must walk the planes
/// by stride, never assume tight packing.
///
/// A frame is consumed by value exactly once; converters only borrow it, so
/// a second consumer (e.g. a parallel file-saving analyzer) can read the
/// same planes before the pipeline takes ownership.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub luma: Vec<u8>,
    pub chroma_u: Vec<u8>,
    pub chroma_v: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub luma_row_stride: u32,
    pub chroma_row_stride: u32,
    pub chroma_pixel_stride: u32,
    /// Capture timestamp in microseconds.
    pub capture_timestamp_us: i64,
}

impl FrameBuffer {
    /// Create a frame from already-separated planes and a microsecond timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        luma: Vec<u8>,
        chroma_u: Vec<u8>,
        chroma_v: Vec<u8>,
        width: u32,
        height: u32,
        luma_row_stride: u32,
        chroma_row_stride: u32,
        chroma_pixel_stride: u32,
        capture_timestamp_us: i64,
    ) -> Self {
        Self {
            luma,
            chroma_u,
            chroma_v,
            width,
            height,
            luma_row_stride,
            chroma_row_stride,
            chroma_pixel_stride,
            capture_timestamp_us,
        }
    }

    /// Convert a capture-source nanosecond timestamp at the boundary.
    /// Capture callbacks report nanoseconds; everything downstream is in
    /// microseconds.
    pub fn with_timestamp_ns(mut self, timestamp_ns: i64) -> Self {
        self.capture_timestamp_us = timestamp_ns / 1000;
        self
    }

    /// Whether the declared strides cover the declared dimensions.
    /// The last row is allowed to be short of the full stride on padded
    /// sensors, but must still hold `width` luma samples.
    pub fn is_well_formed(&self) -> bool {
        if self.width == 0 || self.height == 0 || self.luma_row_stride < self.width {
            return false;
        }
        let last_row_start = self.luma_row_stride as usize * (self.height as usize - 1);
        self.luma.len() >= last_row_start + self.width as usize
    }
}

/// Classification of one protocol-ready unit of encoder output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketKind {
    /// Out-of-band codec configuration (SPS/PPS parameter sets).
    ConfigData,
    /// Self-contained sync frame.
    KeyFrame,
    /// Predicted frame depending on prior frames.
    DeltaFrame,
}

/// A protocol-ready packet produced by the packetizer.
#[derive(Debug, Clone, Serialize)]
pub struct EncodedPacket {
    pub kind: PacketKind,
    pub payload: Vec<u8>,
    /// Timestamp as reported by the encoder on its output, in microseconds.
    /// Never recomputed from the input side.
    pub presentation_timestamp_us: i64,
}

impl EncodedPacket {
    pub fn is_key_frame(&self) -> bool {
        self.kind == PacketKind::KeyFrame
    }

    pub fn is_config(&self) -> bool {
        self.kind == PacketKind::ConfigData
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_ns_converts_to_us() {
        let frame = FrameBuffer::new(vec![0; 16], vec![0; 4], vec![0; 4], 4, 4, 4, 2, 1, 0)
            .with_timestamp_ns(33_000_000);
        assert_eq!(frame.capture_timestamp_us, 33_000);
    }

    #[test]
    fn packet_kind_predicates() {
        let packet = EncodedPacket {
            kind: PacketKind::ConfigData,
            payload: Vec::new(),
            presentation_timestamp_us: 0,
        };
        assert!(packet.is_config());
        assert!(!packet.is_key_frame());
    }
}
