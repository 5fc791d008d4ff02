//! Telemetry buffers — length-prefixed task input and output
//!
//! In memory and on the wire a packet is a 4-byte header followed by
//! exactly `length` payload bytes:
//!
//! ```text
//!   +--------+--------+----------------------+
//!   | id u16 | len u16| payload [u8; len]    |
//!   +--------+--------+----------------------+
//! ```
//!
//! Header fields are little-endian on the wire. A task's buffers are
//! allocated once and then reused for every run of that task.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{PowertaskError, Result};
use crate::task::TaskId;

/// Bytes of header in front of every packet
pub const HEADER_LEN: usize = 4;

/// Packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHeader {
    /// Owning task
    pub id: TaskId,
    /// Payload bytes that follow
    pub length: u16,
}

/// A telemetry packet with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telemetry {
    header: TelemetryHeader,
    data: Box<[u8]>,
}

impl Telemetry {
    /// Zero-filled buffer of `length` bytes owned by `id`
    pub fn allocate(id: TaskId, length: u16) -> Self {
        Self {
            header: TelemetryHeader { id, length },
            data: vec![0u8; length as usize].into_boxed_slice(),
        }
    }

    /// Wrap an existing payload
    ///
    /// Payloads longer than `u16::MAX` are cut to fit the header.
    pub fn from_payload(id: TaskId, payload: &[u8]) -> Self {
        let length = payload.len().min(u16::MAX as usize);
        Self {
            header: TelemetryHeader { id, length: length as u16 },
            data: payload[..length].into(),
        }
    }

    pub fn header(&self) -> TelemetryHeader {
        self.header
    }

    /// Owning task
    pub fn id(&self) -> TaskId {
        self.header.id
    }

    /// Payload length in bytes
    pub fn len(&self) -> u16 {
        self.header.length
    }

    pub fn is_empty(&self) -> bool {
        self.header.length == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero the payload. The scheduler never does this on its own.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Bytes needed by [`encode`](Self::encode)
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.data.len()
    }

    /// Append the wire form of this packet to `out`
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.reserve(self.wire_len());
        out.extend_from_slice(&self.header.id.0.to_le_bytes());
        out.extend_from_slice(&self.header.length.to_le_bytes());
        out.extend_from_slice(&self.data);
    }

    /// Parse one packet from the front of `bytes`.
    ///
    /// Returns the packet and the number of bytes consumed; trailing
    /// bytes are left for the next call.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < HEADER_LEN {
            return Err(PowertaskError::TruncatedPacket {
                needed: HEADER_LEN,
                got: bytes.len(),
            });
        }
        let id = TaskId(u16::from_le_bytes([bytes[0], bytes[1]]));
        let length = u16::from_le_bytes([bytes[2], bytes[3]]);
        let end = HEADER_LEN + length as usize;
        if bytes.len() < end {
            return Err(PowertaskError::TruncatedPacket {
                needed: end,
                got: bytes.len(),
            });
        }
        let packet = Self {
            header: TelemetryHeader { id, length },
            data: bytes[HEADER_LEN..end].into(),
        };
        Ok((packet, end))
    }
}
