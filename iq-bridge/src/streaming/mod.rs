//! Wire handling for both sides of the bridge

pub mod bridge;
pub mod downstream;
pub mod reassembly;
pub mod upstream;
pub mod wire;

pub use bridge::{Bridge, BridgeOutcome, BridgeStats, Step};
pub use reassembly::{FrameReassembler, ReassemblyState};
pub use wire::{FRAME_HEADER_SIZE, NN_PUBLISH_ACK, NN_SUBSCRIBE_REQUEST, RTL_TCP_PREAMBLE};
