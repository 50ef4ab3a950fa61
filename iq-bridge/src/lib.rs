//! iq-bridge - goesrecv to RTL_TCP sample bridge
//!
//! Subscribes to the nanomsg I/Q sample publisher of goesrecv, strips its
//! length-prefixed message framing, converts the signed samples to the
//! unsigned encoding RTL_TCP expects and streams them to a single RTL_TCP
//! client (SDR#, GQRX, SatDump, ...).
//!
//! ## Session lifecycle
//!
//! 1. Listen for an RTL_TCP client and send it the dongle info block
//! 2. Connect to goesrecv and perform the SP subscribe handshake
//! 3. Forward samples until either side goes away
//! 4. Close everything and start over
//!
//! Any failure restarts the whole session; see [`session::Supervisor`].

pub mod config;
pub mod error;
pub mod session;
pub mod signal;
pub mod streaming;
pub mod transform;

// Re-export commonly used types
pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use session::{Session, SessionEvent, SessionState, Supervisor};
