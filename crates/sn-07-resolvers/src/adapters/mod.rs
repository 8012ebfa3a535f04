//! # Adapters
//!
//! In-memory transport implementing the `Messenger` port.

pub mod memory_network;

pub use memory_network::{MemoryMessenger, MemoryNetwork, RecordingProcessor};
