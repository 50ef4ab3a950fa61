//! Length-prefixed frame reassembly
//!
//! The publisher's byte stream is a sequence of `[u64 length][payload]`
//! messages, but a single `read()` can end anywhere: inside a payload, exactly
//! on a message boundary, or in the middle of the 8-byte length prefix. The
//! reassembler strips the prefixes and hands back only payload bytes, keeping
//! just enough state between reads to resume parsing.

use super::wire::FRAME_HEADER_SIZE;

/// Parsing state carried from one read to the next within a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassemblyState {
    /// Payload bytes still owed by the current frame
    pub pending_payload_bytes: u64,
    /// Bytes of a length prefix that was cut off by the end of a read
    header: [u8; FRAME_HEADER_SIZE],
    header_len: usize,
}

impl ReassemblyState {
    /// Number of header bytes buffered from a previous read
    pub fn partial_header_len(&self) -> usize {
        self.header_len
    }

    /// True at a frame boundary with nothing buffered
    pub fn is_idle(&self) -> bool {
        self.pending_payload_bytes == 0 && self.header_len == 0
    }
}

/// Strips frame headers from arbitrarily chunked upstream reads
#[derive(Debug, Default)]
pub struct FrameReassembler {
    state: ReassemblyState,
    frames_parsed: u64,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current parsing state
    pub fn state(&self) -> &ReassemblyState {
        &self.state
    }

    /// Number of frame headers decoded so far
    pub fn frames_parsed(&self) -> u64 {
        self.frames_parsed
    }

    /// Consume one read's worth of bytes, appending payload bytes to `out`
    ///
    /// Returns the number of payload bytes appended.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> usize {
        let start_len = out.len();
        let mut rest = chunk;

        while !rest.is_empty() {
            // Inside a frame: copy as much payload as this chunk holds
            if self.state.pending_payload_bytes > 0 {
                let take = clamp_to_chunk(self.state.pending_payload_bytes, rest.len());
                out.extend_from_slice(&rest[..take]);
                self.state.pending_payload_bytes -= take as u64;
                rest = &rest[take..];
                continue;
            }

            // At a frame boundary: assemble the next length prefix
            let need = FRAME_HEADER_SIZE - self.state.header_len;
            if rest.len() < need {
                let have = self.state.header_len;
                self.state.header[have..have + rest.len()].copy_from_slice(rest);
                self.state.header_len += rest.len();
                log::trace!(
                    "Buffered {} of {} header bytes across read boundary",
                    self.state.header_len,
                    FRAME_HEADER_SIZE
                );
                break;
            }

            let have = self.state.header_len;
            self.state.header[have..].copy_from_slice(&rest[..need]);
            rest = &rest[need..];
            self.state.header_len = 0;
            self.state.pending_payload_bytes = u64::from_be_bytes(self.state.header);
            self.frames_parsed += 1;
            log::trace!(
                "Frame {}: {} payload bytes",
                self.frames_parsed,
                self.state.pending_payload_bytes
            );
        }

        out.len() - start_len
    }
}

/// `min(pending, available)` without truncating a large u64 on 32-bit targets
fn clamp_to_chunk(pending: u64, available: usize) -> usize {
    usize::try_from(pending).map_or(available, |p| p.min(available))
}
