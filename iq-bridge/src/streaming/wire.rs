//! Fixed wire constants for both sides of the bridge
//!
//! # Upstream (goesrecv, nanomsg SP over TCP)
//!
//! The connection opens with an 8-byte SP header exchange. The bridge sends
//! the SUB protocol header and expects the PUB header back:
//!
//! ```text
//! bridge → goesrecv   00 53 50 00 00 21 00 00   ("\0SP\0", protocol 0x21 SUB)
//! goesrecv → bridge   00 53 50 00 00 20 00 00   ("\0SP\0", protocol 0x20 PUB)
//! ```
//!
//! After that every published message is framed as:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (8 bytes) │ Payload (Length bytes)   │
//! │ Big-endian u64   │ signed 8-bit I/Q samples │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! Message boundaries do not line up with TCP reads; see
//! [`FrameReassembler`](super::reassembly::FrameReassembler).
//!
//! # Downstream (RTL_TCP)
//!
//! Right after accept the client receives a 12-byte dongle info block:
//!
//! ```text
//! ┌────────────┬───────────────────┬──────────────────────┐
//! │ "RTL0"     │ Tuner type (u32)  │ Gain count (u32)     │
//! │ 52 54 4C 30│ 00 00 00 01       │ 00 00 00 01          │
//! └────────────┴───────────────────┴──────────────────────┘
//! ```
//!
//! followed by an unframed stream of unsigned 8-bit I/Q samples. Commands the
//! client sends back are never read.

/// SP header sent to subscribe to all topics
pub const NN_SUBSCRIBE_REQUEST: [u8; 8] = [0x00, 0x53, 0x50, 0x00, 0x00, 0x21, 0x00, 0x00];

/// SP header the publisher must answer with
pub const NN_PUBLISH_ACK: [u8; 8] = [0x00, 0x53, 0x50, 0x00, 0x00, 0x20, 0x00, 0x00];

/// Size of the big-endian length prefix in front of every upstream message
pub const FRAME_HEADER_SIZE: usize = 8;

/// RTL_TCP dongle info block
pub const RTL_TCP_PREAMBLE: [u8; 12] = [
    0x52, 0x54, 0x4C, 0x30, // "RTL0"
    0x00, 0x00, 0x00, 0x01, // tuner type
    0x00, 0x00, 0x00, 0x01, // gain count
];

/// Encode a frame header (used by tests and tooling that fakes a publisher)
pub fn encode_frame_header(payload_len: u64) -> [u8; FRAME_HEADER_SIZE] {
    payload_len.to_be_bytes()
}
