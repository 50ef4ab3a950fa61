//! Error types for iq-bridge

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// iq-bridge error types
///
/// Every variant is recoverable from the supervisor's point of view: a
/// failing session is torn down and a fresh one is started.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not bind the RTL_TCP listener or accept a client
    #[error("Client accept failed on port {port}: {source}")]
    ClientAccept {
        /// Downstream listen port
        port: u16,
        /// Underlying socket error
        source: std::io::Error,
    },

    /// Could not open or subscribe to the goesrecv publisher
    #[error("Upstream connect to {address} failed: {source}")]
    UpstreamConnect {
        /// `host:port` of the sample publisher
        address: String,
        /// Underlying socket error
        source: std::io::Error,
    },

    /// Publisher answered the subscribe request with an unexpected header
    #[error("Invalid upstream header: expected {expected:02X?}, got {actual:02X?}")]
    HandshakeMismatch {
        /// Acknowledgement the publisher should have sent
        expected: [u8; 8],
        /// Bytes actually received
        actual: [u8; 8],
    },

    /// Reading sample data from the publisher failed
    #[error("Upstream read failed: {0}")]
    UpstreamRead(#[source] std::io::Error),

    /// Writing converted samples to the client failed
    #[error("Client write failed: {0}")]
    ClientWrite(#[source] std::io::Error),

    /// Shutdown was requested while a session stage was in progress
    #[error("Shutdown requested")]
    Shutdown,

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Could not install the termination signal handler
    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// True when the error is a peer going away rather than a local fault.
    pub fn is_disconnect(&self) -> bool {
        let io_err = match self {
            Error::Io(e) | Error::UpstreamRead(e) | Error::ClientWrite(e) => e,
            Error::ClientAccept { source, .. } | Error::UpstreamConnect { source, .. } => source,
            _ => return false,
        };
        matches!(
            io_err.kind(),
            std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_disconnect_classification() {
        let eof = Error::UpstreamRead(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(eof.is_disconnect());

        let pipe = Error::ClientWrite(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(pipe.is_disconnect());

        let refused = Error::UpstreamConnect {
            address: "127.0.0.1:5000".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert!(!refused.is_disconnect());

        assert!(!Error::Shutdown.is_disconnect());
    }

    #[test]
    fn test_mismatch_message_shows_bytes() {
        let err = Error::HandshakeMismatch {
            expected: [0x00, 0x53, 0x50, 0x00, 0x00, 0x20, 0x00, 0x00],
            actual: [0x00, 0x53, 0x50, 0x00, 0x00, 0x21, 0x00, 0x00],
        };
        let msg = err.to_string();
        assert!(msg.contains("20"));
        assert!(msg.contains("21"));
    }
}
