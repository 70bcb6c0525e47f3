//! Classification and wire framing of raw encoder output.
//!
//! Each `OutputUnit` becomes at most one `EncodedPacket`: configuration
//! units carry parameter sets (SPS/PPS), sync units become key frames, the
//! rest are delta frames. Framing and parameter-set policy are selected once
//! at construction; different encoder backends already disagree on both, so
//! neither is hard-coded.

use crate::streaming::encoder::OutputUnit;
use crate::types::{EncodedPacket, PacketKind};

/// 4-byte Annex-B start sequence.
pub const ANNEX_B_START_CODE: &[u8] = &[0x00, 0x00, 0x00, 0x01];

/// Wire framing applied to outgoing payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Ensure every payload starts with a 4-byte start code. Backends that
    /// already emit Annex-B pass through unchanged; raw NAL payloads get the
    /// prefix prepended.
    AnnexB,
    /// Pass payloads through exactly as the backend produced them.
    Raw,
}

/// How often codec configuration is forwarded downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPolicy {
    /// Forward the first config unit, discard repeats.
    OncePerSession,
    /// Forward every config unit the backend emits.
    EveryKeyFrame,
}

/// Turns raw encoder output units into protocol-ready packets.
pub struct Packetizer {
    framing: Framing,
    config_policy: ConfigPolicy,
    config_sent: bool,
}

impl Packetizer {
    pub fn new(framing: Framing, config_policy: ConfigPolicy) -> Self {
        Self {
            framing,
            config_policy,
            config_sent: false,
        }
    }

    /// Classify one output unit and apply framing.
    ///
    /// Returns `None` when the unit is suppressed by the parameter-set
    /// policy (a repeated config unit under `OncePerSession`).
    pub fn packetize(&mut self, unit: OutputUnit) -> Option<EncodedPacket> {
        let kind = if unit.is_config {
            if self.config_sent && self.config_policy == ConfigPolicy::OncePerSession {
                return None;
            }
            self.config_sent = true;
            PacketKind::ConfigData
        } else if unit.is_key_frame {
            PacketKind::KeyFrame
        } else {
            PacketKind::DeltaFrame
        };

        Some(EncodedPacket {
            kind,
            payload: self.frame_payload(unit.data),
            presentation_timestamp_us: unit.pts_us,
        })
    }

    fn frame_payload(&self, data: Vec<u8>) -> Vec<u8> {
        match self.framing {
            Framing::Raw => data,
            Framing::AnnexB => {
                if data.is_empty() || starts_with_start_code(&data) {
                    data
                } else {
                    let mut framed = Vec::with_capacity(ANNEX_B_START_CODE.len() + data.len());
                    framed.extend_from_slice(ANNEX_B_START_CODE);
                    framed.extend_from_slice(&data);
                    framed
                }
            }
        }
    }
}

impl Default for Packetizer {
    fn default() -> Self {
        Self::new(Framing::AnnexB, ConfigPolicy::OncePerSession)
    }
}

/// Whether `data` begins with a 3- or 4-byte Annex-B start code.
pub fn starts_with_start_code(data: &[u8]) -> bool {
    data.starts_with(&[0, 0, 0, 1]) || data.starts_with(&[0, 0, 1])
}

/// Split an Annex-B access unit into NAL unit payloads (start codes stripped).
pub fn split_annex_b(data: &[u8]) -> Vec<&[u8]> {
    let mut nal_units = Vec::new();
    let mut start = 0;

    while start < data.len() {
        let start_code_len = if data[start..].starts_with(&[0, 0, 0, 1]) {
            4
        } else if data[start..].starts_with(&[0, 0, 1]) {
            3
        } else {
            break;
        };

        // NAL unit runs until the next start code or end of data.
        let mut end = start + start_code_len;
        while end < data.len() {
            if data[end..].starts_with(&[0, 0, 1]) || data[end..].starts_with(&[0, 0, 0, 1]) {
                break;
            }
            end += 1;
        }

        if end > start + start_code_len {
            nal_units.push(&data[start + start_code_len..end]);
        }
        start = end;
    }

    nal_units
}
