//! Offline test support: synthetic frames, a deterministic encoder backend
//! and a recording fake sink.
//!
//! These exist so the pipeline can be exercised without a camera, without a
//! wire connection and without paying for real H.264 encoding in every test.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::StreamError;
use crate::sink::{ConnectionFlag, StreamSink};
use crate::streaming::{EncoderConfig, OutputUnit, VideoEncoder};
use crate::types::FrameBuffer;

/// Build a synthetic frame with tightly packed planes and a gradient that
/// changes per frame number (exercises temporal paths deterministically).
pub fn synthetic_frame(frame_number: u64, width: u32, height: u32) -> FrameBuffer {
    synthetic_frame_padded(frame_number, width, height, 0, 1)
}

/// Build a synthetic frame with sensor-style padding: `chroma_row_pad` extra
/// bytes per chroma row and a configurable chroma pixel stride.
pub fn synthetic_frame_padded(
    frame_number: u64,
    width: u32,
    height: u32,
    chroma_row_pad: u32,
    chroma_pixel_stride: u32,
) -> FrameBuffer {
    let w = width as usize;
    let h = height as usize;
    let base = (frame_number % 256) as u8;

    let mut luma = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            luma[y * w + x] = base.wrapping_add((x + y) as u8);
        }
    }

    let cw = w / 2;
    let ch = h / 2;
    let row_stride = cw as u32 * chroma_pixel_stride + chroma_row_pad;
    let plane_len = (row_stride as usize) * ch.max(1);
    let mut chroma_u = vec![0u8; plane_len];
    let mut chroma_v = vec![0u8; plane_len];
    for i in 0..ch {
        for j in 0..cw {
            let idx = i * row_stride as usize + j * chroma_pixel_stride as usize;
            chroma_u[idx] = 128u8.wrapping_add(base).wrapping_add(j as u8);
            chroma_v[idx] = 128u8.wrapping_sub(base).wrapping_sub(i as u8);
        }
    }

    FrameBuffer::new(
        luma,
        chroma_u,
        chroma_v,
        width,
        height,
        width,
        row_stride,
        chroma_pixel_stride,
        frame_number as i64 * 33_333,
    )
}

/// Deterministic in-memory encoder backend.
///
/// Emits one config unit before the first frame unit, a key frame every
/// `key_frame_every` frames, and delta frames otherwise. The input slot pool
/// is a plain counter so backpressure behavior is exact and controllable.
pub struct StubEncoder {
    capacity: usize,
    pending: VecDeque<OutputUnit>,
    configured: bool,
    fail_configure: bool,
    frames_seen: u64,
    key_frame_every: u64,
    force_key: bool,
}

impl StubEncoder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            pending: VecDeque::new(),
            configured: false,
            fail_configure: false,
            frames_seen: 0,
            key_frame_every: 10,
            force_key: false,
        }
    }

    /// Backend whose `configure` always fails, for exercising the fatal
    /// configuration path.
    pub fn failing() -> Self {
        let mut stub = Self::new(1);
        stub.fail_configure = true;
        stub
    }

    pub fn with_key_frame_every(mut self, frames: u64) -> Self {
        self.key_frame_every = frames.max(1);
        self
    }
}

impl VideoEncoder for StubEncoder {
    fn configure(&mut self, _config: &EncoderConfig) -> Result<(), StreamError> {
        if self.fail_configure {
            return Err(StreamError::Configuration(
                "stub backend rejected configuration".to_string(),
            ));
        }
        self.configured = true;
        Ok(())
    }

    fn try_reserve_input(&mut self, _timeout: Duration) -> bool {
        self.pending.len() < self.capacity
    }

    fn submit(&mut self, _yuv: &[u8], pts_us: i64) -> Result<(), StreamError> {
        if !self.configured {
            return Err(StreamError::State("encoder not configured".to_string()));
        }

        if self.frames_seen == 0 {
            // Parameter sets ahead of the first media unit.
            self.pending.push_back(OutputUnit {
                data: vec![0x67, 0x42, 0x68, 0xCE],
                is_config: true,
                is_key_frame: false,
                pts_us,
            });
        }

        let is_key_frame =
            self.frames_seen % self.key_frame_every == 0 || std::mem::take(&mut self.force_key);
        let marker = if is_key_frame { 0x65 } else { 0x41 };
        self.pending.push_back(OutputUnit {
            data: vec![marker, (self.frames_seen % 256) as u8],
            is_config: false,
            is_key_frame,
            pts_us,
        });
        self.frames_seen += 1;
        Ok(())
    }

    fn dequeue(&mut self, _timeout: Duration) -> Option<OutputUnit> {
        self.pending.pop_front()
    }

    fn request_key_frame(&mut self) {
        self.force_key = true;
    }

    fn signal_end_of_stream(&mut self) {}

    fn release(&mut self) {
        self.configured = false;
        self.pending.clear();
    }
}

/// One packet as observed by `RecordingSink`.
#[derive(Debug, Clone)]
pub struct SentPacket {
    pub payload: Vec<u8>,
    pub timestamp_us: i64,
    pub is_key_frame: bool,
}

/// Fake sink that records every delivered packet.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the pipeline owns another.
#[derive(Clone, Default)]
pub struct RecordingSink {
    connection: ConnectionFlag,
    sent: Arc<Mutex<Vec<SentPacket>>>,
}

impl RecordingSink {
    pub fn connected() -> Self {
        let sink = Self::default();
        sink.connection.set_connected(true);
        sink
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Connection handle, as the connection manager would hold it.
    pub fn connection(&self) -> ConnectionFlag {
        self.connection.clone()
    }

    pub fn sent(&self) -> Vec<SentPacket> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("lock poisoned").len()
    }
}

impl StreamSink for RecordingSink {
    fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    fn send_packet(
        &mut self,
        payload: &[u8],
        timestamp_us: i64,
        is_key_frame: bool,
    ) -> Result<(), StreamError> {
        self.sent.lock().expect("lock poisoned").push(SentPacket {
            payload: payload.to_vec(),
            timestamp_us,
            is_key_frame,
        });
        Ok(())
    }
}
