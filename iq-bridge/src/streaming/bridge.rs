//! Sample forwarding loop
//!
//! Each upstream read is pushed through the [`FrameReassembler`], the
//! recovered payload is converted with [`flip_msb_in_place`] and written to
//! the client in one call. Ordering is preserved byte for byte.

use super::reassembly::FrameReassembler;
use crate::error::{Error, Result};
use crate::transform::flip_msb_in_place;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Why a bridging loop ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// Publisher closed its side (zero-byte read)
    UpstreamClosed,
    /// Running flag cleared
    Shutdown,
}

/// Counters for one session's bridging phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Non-empty upstream reads
    pub reads: u64,
    /// Bytes received from the publisher, headers included
    pub upstream_bytes: u64,
    /// Frame headers parsed
    pub frames: u64,
    /// Sample bytes written to the client
    pub payload_bytes: u64,
}

/// Result of a single read/convert/write step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// This many payload bytes were forwarded (possibly zero)
    Forwarded(usize),
    /// Read timed out with nothing received
    Idle,
    /// Publisher closed the connection
    Closed,
}

/// Forwarding state for one session
pub struct Bridge {
    reassembler: FrameReassembler,
    read_buffer: Vec<u8>,
    /// Payload accumulator, reused across reads
    output: Vec<u8>,
    stats: BridgeStats,
}

impl Bridge {
    /// Create a bridge with a fresh reassembler
    pub fn new(read_buffer_size: usize) -> Self {
        Self {
            reassembler: FrameReassembler::new(),
            read_buffer: vec![0u8; read_buffer_size.max(1)],
            output: Vec::with_capacity(read_buffer_size),
            stats: BridgeStats::default(),
        }
    }

    pub fn reassembler(&self) -> &FrameReassembler {
        &self.reassembler
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            frames: self.reassembler.frames_parsed(),
            ..self.stats
        }
    }

    /// Read once from upstream and forward whatever payload it completes
    ///
    /// Read timeouts are reported as [`Step::Idle`] so the caller can check
    /// for shutdown between reads.
    pub fn step<R: Read, W: Write>(&mut self, upstream: &mut R, client: &mut W) -> Result<Step> {
        let num = match upstream.read(&mut self.read_buffer) {
            Ok(0) => return Ok(Step::Closed),
            Ok(n) => n,
            Err(ref e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                return Ok(Step::Idle);
            }
            Err(e) => return Err(Error::UpstreamRead(e)),
        };
        self.stats.reads += 1;
        self.stats.upstream_bytes += num as u64;

        self.output.clear();
        let payload = self
            .reassembler
            .push(&self.read_buffer[..num], &mut self.output);

        if payload > 0 {
            flip_msb_in_place(&mut self.output);
            client.write_all(&self.output).map_err(Error::ClientWrite)?;
            self.stats.payload_bytes += payload as u64;
        }

        log::trace!("Read {} bytes, forwarded {} payload bytes", num, payload);
        Ok(Step::Forwarded(payload))
    }

    /// Forward until the publisher closes, an I/O error occurs or `running` clears
    pub fn run<R: Read, W: Write>(
        &mut self,
        upstream: &mut R,
        client: &mut W,
        running: &AtomicBool,
    ) -> Result<BridgeOutcome> {
        while running.load(Ordering::Relaxed) {
            if self.step(upstream, client)? == Step::Closed {
                return Ok(BridgeOutcome::UpstreamClosed);
            }
        }
        Ok(BridgeOutcome::Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::wire::encode_frame_header;
    use std::collections::VecDeque;
    use std::io;

    /// Upstream double that returns one scripted chunk per read
    struct ChunkedSource {
        chunks: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ChunkedSource {
        fn new(chunks: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    impl Read for ChunkedSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(chunk)) => {
                    assert!(chunk.len() <= buf.len(), "chunk larger than read buffer");
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
            }
        }
    }

    /// Client double that records each write call separately
    #[derive(Default)]
    struct RecordingClient {
        writes: Vec<Vec<u8>>,
        fail: bool,
    }

    impl RecordingClient {
        fn received(&self) -> Vec<u8> {
            self.writes.concat()
        }
    }

    impl Write for RecordingClient {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample_stream() -> Vec<u8> {
        let mut stream = Vec::new();
        stream.extend_from_slice(&encode_frame_header(4));
        stream.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        stream.extend_from_slice(&encode_frame_header(2));
        stream.extend_from_slice(&[0xEE, 0xFF]);
        stream
    }

    #[test]
    fn test_end_to_end_split_mid_payload() {
        let stream = sample_stream();
        let mut upstream =
            ChunkedSource::new(vec![Ok(stream[..10].to_vec()), Ok(stream[10..].to_vec())]);
        let mut client = RecordingClient::default();
        let running = AtomicBool::new(true);

        let mut bridge = Bridge::new(65536);
        let outcome = bridge.run(&mut upstream, &mut client, &running).unwrap();

        assert_eq!(outcome, BridgeOutcome::UpstreamClosed);
        assert_eq!(client.received(), vec![0x2A, 0x3B, 0x4C, 0x5D, 0x6E, 0x7F]);
        // One write per read that produced payload
        assert_eq!(client.writes.len(), 2);

        let stats = bridge.stats();
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.upstream_bytes, stream.len() as u64);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.payload_bytes, 6);
    }

    #[test]
    fn test_header_only_read_writes_nothing() {
        let stream = sample_stream();
        let mut upstream =
            ChunkedSource::new(vec![Ok(stream[..5].to_vec()), Ok(stream[5..].to_vec())]);
        let mut client = RecordingClient::default();
        let mut bridge = Bridge::new(64);

        assert_eq!(
            bridge.step(&mut upstream, &mut client).unwrap(),
            Step::Forwarded(0)
        );
        assert!(client.writes.is_empty());
        assert_eq!(bridge.reassembler().state().partial_header_len(), 5);

        assert_eq!(
            bridge.step(&mut upstream, &mut client).unwrap(),
            Step::Forwarded(6)
        );
        assert_eq!(client.received(), vec![0x2A, 0x3B, 0x4C, 0x5D, 0x6E, 0x7F]);
    }

    #[test]
    fn test_immediate_close() {
        let mut upstream = ChunkedSource::new(vec![]);
        let mut client = RecordingClient::default();
        let running = AtomicBool::new(true);

        let outcome = Bridge::new(64)
            .run(&mut upstream, &mut client, &running)
            .unwrap();

        assert_eq!(outcome, BridgeOutcome::UpstreamClosed);
        assert!(client.writes.is_empty());
    }

    #[test]
    fn test_timeout_is_idle_not_error() {
        let stream = sample_stream();
        let mut upstream = ChunkedSource::new(vec![
            Err(io::Error::from(io::ErrorKind::WouldBlock)),
            Err(io::Error::from(io::ErrorKind::TimedOut)),
            Ok(stream.clone()),
        ]);
        let mut client = RecordingClient::default();
        let running = AtomicBool::new(true);

        let outcome = Bridge::new(64)
            .run(&mut upstream, &mut client, &running)
            .unwrap();

        assert_eq!(outcome, BridgeOutcome::UpstreamClosed);
        assert_eq!(client.received().len(), 6);
    }

    #[test]
    fn test_read_error_is_upstream_read() {
        let mut upstream =
            ChunkedSource::new(vec![Err(io::Error::from(io::ErrorKind::ConnectionReset))]);
        let mut client = RecordingClient::default();
        let running = AtomicBool::new(true);

        let result = Bridge::new(64).run(&mut upstream, &mut client, &running);
        match result {
            Err(e @ Error::UpstreamRead(_)) => assert!(e.is_disconnect()),
            other => panic!("expected upstream read error, got {:?}", other),
        }
    }

    #[test]
    fn test_write_error_is_client_write() {
        let mut upstream = ChunkedSource::new(vec![Ok(sample_stream())]);
        let mut client = RecordingClient {
            fail: true,
            ..Default::default()
        };
        let running = AtomicBool::new(true);

        let result = Bridge::new(64).run(&mut upstream, &mut client, &running);
        assert!(matches!(result, Err(Error::ClientWrite(_))));
    }

    #[test]
    fn test_cleared_flag_stops_before_reading() {
        let mut upstream = ChunkedSource::new(vec![Ok(sample_stream())]);
        let mut client = RecordingClient::default();
        let running = AtomicBool::new(false);

        let outcome = Bridge::new(64)
            .run(&mut upstream, &mut client, &running)
            .unwrap();

        assert_eq!(outcome, BridgeOutcome::Shutdown);
        assert!(client.writes.is_empty());
    }
}
