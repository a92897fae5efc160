//! Wire frame codec.
//!
//! One reserved L2 frame type carries every trivium frame. The fixed
//! 18-byte header is followed by a variable payload whose shape is
//! governed by the payload-type registry. An unrecognized *payload type*
//! under a recognized frame type parses successfully and passes its
//! payload through opaque — forward compatibility is a contract here, not
//! an accident.

use serde::{Deserialize, Serialize};
use tracing::trace;

use trivium_types::GateState;

use crate::error::CodecError;

/// Reserved experimental EtherType carrying trivium frames.
pub const FRAME_ETHERTYPE: u16 = 0x88B5;

/// Current protocol version; anything else is rejected at this boundary.
pub const PROTOCOL_VERSION: u16 = 1;

/// Fixed header length in bytes:
/// version 2 + gate-state 2 + delta-angle 4 + entropy 4 + hash 4 + type 2.
pub const HEADER_LEN: usize = 18;

/// Reset payload: 8-byte nonce + 64-byte Ed25519 signature.
pub const RESET_PAYLOAD_LEN: usize = 72;

/// The payload-type registry.
///
/// Tool trigger/response codes occupy `0x4000..=0x7FFF`: bit 13 selects
/// response, bits 8–12 the tool family, bits 0–7 the code within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadType {
    Keepalive,
    Trigger,
    StateChange,
    Latch,
    /// Requires an authorization signature; see [`ResetPayload`].
    Reset,
    FieldUpdate,
    Route,
    /// Anomaly tripwire.
    CanaryTrip,
    SwarmCommand,
    EntropyDelivery,
    FullIdentity,
    CompactIdentity,
    ToolTrigger { family: u8, code: u8 },
    ToolResponse { family: u8, code: u8 },
    /// Recognized frame, unrecognized payload type: passed through opaque.
    Unknown(u16),
}

impl PayloadType {
    pub fn to_wire(self) -> u16 {
        match self {
            PayloadType::Keepalive => 0x0000,
            PayloadType::Trigger => 0x0001,
            PayloadType::StateChange => 0x0002,
            PayloadType::Latch => 0x0003,
            PayloadType::Reset => 0x0004,
            PayloadType::FieldUpdate => 0x0005,
            PayloadType::Route => 0x0006,
            PayloadType::CanaryTrip => 0x0007,
            PayloadType::SwarmCommand => 0x0008,
            PayloadType::EntropyDelivery => 0x0009,
            PayloadType::FullIdentity => 0x000A,
            PayloadType::CompactIdentity => 0x000B,
            PayloadType::ToolTrigger { family, code } => {
                0x4000 | (family as u16 & 0x1F) << 8 | code as u16
            }
            PayloadType::ToolResponse { family, code } => {
                0x6000 | (family as u16 & 0x1F) << 8 | code as u16
            }
            PayloadType::Unknown(raw) => raw,
        }
    }

    /// Total: every 16-bit value maps to some payload type.
    pub fn from_wire(raw: u16) -> Self {
        match raw {
            0x0000 => PayloadType::Keepalive,
            0x0001 => PayloadType::Trigger,
            0x0002 => PayloadType::StateChange,
            0x0003 => PayloadType::Latch,
            0x0004 => PayloadType::Reset,
            0x0005 => PayloadType::FieldUpdate,
            0x0006 => PayloadType::Route,
            0x0007 => PayloadType::CanaryTrip,
            0x0008 => PayloadType::SwarmCommand,
            0x0009 => PayloadType::EntropyDelivery,
            0x000A => PayloadType::FullIdentity,
            0x000B => PayloadType::CompactIdentity,
            0x4000..=0x5FFF => PayloadType::ToolTrigger {
                family: (raw >> 8) as u8 & 0x1F,
                code: raw as u8,
            },
            0x6000..=0x7FFF => PayloadType::ToolResponse {
                family: (raw >> 8) as u8 & 0x1F,
                code: raw as u8,
            },
            other => PayloadType::Unknown(other),
        }
    }

    /// Exact payload length this type declares, `None` when variable.
    pub fn expected_len(self) -> Option<usize> {
        match self {
            PayloadType::Keepalive | PayloadType::Latch | PayloadType::CanaryTrip => Some(0),
            PayloadType::StateChange => Some(2),
            PayloadType::Reset => Some(RESET_PAYLOAD_LEN),
            PayloadType::Route => Some(2),
            PayloadType::EntropyDelivery => Some(4),
            PayloadType::FullIdentity => Some(32),
            PayloadType::CompactIdentity => Some(16),
            PayloadType::Trigger
            | PayloadType::FieldUpdate
            | PayloadType::SwarmCommand
            | PayloadType::ToolTrigger { .. }
            | PayloadType::ToolResponse { .. }
            | PayloadType::Unknown(_) => None,
        }
    }
}

/// The fixed frame header.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub version: u16,
    pub gate_state: GateState,
    /// Milli-degrees, 0.001° resolution.
    pub delta_angle_milli: i32,
    /// Micro-units of 1.0.
    pub entropy_micro: u32,
    /// Low 32 bits of the identity hash in play.
    pub identity_hash32: u32,
    pub payload_type: PayloadType,
}

impl FrameHeader {
    pub fn new(
        gate_state: GateState,
        delta_angle_milli: i32,
        entropy_micro: u32,
        identity_hash32: u32,
        payload_type: PayloadType,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            gate_state,
            delta_angle_milli,
            entropy_micro,
            identity_hash32,
            payload_type,
        }
    }
}

/// A full frame: header + payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(header: FrameHeader, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    /// Serialize header + payload, big-endian throughout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.header.version.to_be_bytes());
        out.extend_from_slice(&self.header.gate_state.wire_code().to_be_bytes());
        out.extend_from_slice(&self.header.delta_angle_milli.to_be_bytes());
        out.extend_from_slice(&self.header.entropy_micro.to_be_bytes());
        out.extend_from_slice(&self.header.identity_hash32.to_be_bytes());
        out.extend_from_slice(&self.header.payload_type.to_wire().to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse a frame, enforcing version and declared payload length.
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        if buf.len() < HEADER_LEN {
            return Err(CodecError::Truncated {
                need: HEADER_LEN,
                got: buf.len(),
            });
        }

        let version = u16::from_be_bytes([buf[0], buf[1]]);
        if version != PROTOCOL_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let gate_code = u16::from_be_bytes([buf[2], buf[3]]);
        let gate_state =
            GateState::from_wire_code(gate_code).ok_or(CodecError::UnknownGateState(gate_code))?;

        let delta_angle_milli = i32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let entropy_micro = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let identity_hash32 = u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let payload_type = PayloadType::from_wire(u16::from_be_bytes([buf[16], buf[17]]));

        let payload = &buf[HEADER_LEN..];
        if let Some(expected) = payload_type.expected_len() {
            if payload.len() != expected {
                return Err(CodecError::MalformedFrame {
                    expected,
                    got: payload.len(),
                });
            }
        }

        if let PayloadType::Unknown(raw) = payload_type {
            trace!(payload_type = raw, len = payload.len(), "opaque payload passed through");
        }

        Ok(Self {
            header: FrameHeader {
                version,
                gate_state,
                delta_angle_milli,
                entropy_micro,
                identity_hash32,
                payload_type,
            },
            payload: payload.to_vec(),
        })
    }
}

/// The Reset payload body: nonce then signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetPayload {
    pub nonce: [u8; 8],
    pub signature: [u8; 64],
}

impl ResetPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RESET_PAYLOAD_LEN);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.signature);
        out
    }

    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        if payload.len() != RESET_PAYLOAD_LEN {
            return Err(CodecError::MalformedFrame {
                expected: RESET_PAYLOAD_LEN,
                got: payload.len(),
            });
        }
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&payload[..8]);
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&payload[8..]);
        Ok(Self { nonce, signature })
    }
}
