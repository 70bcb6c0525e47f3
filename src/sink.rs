//! Stream sink boundary.
//!
//! The crate never owns the wire connection: connect/disconnect/auth belong
//! to an external connection manager. The pipeline only consumes two things
//! from the sink - a liveness flag checked before every send, and a packet
//! entry point. Packets produced while the sink is disconnected are dropped,
//! not buffered; this is live video, not DVR.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::StreamError;

/// Consumer of protocol-ready packets.
pub trait StreamSink {
    /// Whether the sink currently has a live connection. Checked by the
    /// pipeline before every send; mutation is the connection manager's job.
    fn is_connected(&self) -> bool;

    /// Hand one packet to the wire.
    fn send_packet(
        &mut self,
        payload: &[u8],
        timestamp_us: i64,
        is_key_frame: bool,
    ) -> Result<(), StreamError>;
}

/// Shared connection-state handle.
///
/// The connection manager holds one clone and flips it on connect /
/// disconnect; sink implementations hold another and report it from
/// `is_connected`. Explicit handles instead of a process-wide flag keep the
/// reader and the writer visible at both ends.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFlag {
    connected: Arc<AtomicBool>,
}

impl ConnectionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_shared_across_clones() {
        let manager_side = ConnectionFlag::new();
        let sink_side = manager_side.clone();

        assert!(!sink_side.is_connected());
        manager_side.set_connected(true);
        assert!(sink_side.is_connected());
        manager_side.set_connected(false);
        assert!(!sink_side.is_connected());
    }
}
