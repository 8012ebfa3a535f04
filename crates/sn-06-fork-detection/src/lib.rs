//! # SN-06 Fork Detection
//!
//! Tracks competing headers per nonce and decides when the node must roll
//! back to follow a better chain.
//!
//! **Component ID:** 6
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Refuse headers that cannot follow the final checkpoint
//! - Advance checkpoints as headers are processed and finalized
//! - Report the lowest nonce where a lower-round header beats the local one
//! - Estimate the network's highest nonce for the sync loop
//!
//! ## Module Structure
//!
//! ```text
//! sn-06-fork-detection/
//! ├── domain/          # HeaderInfo, Checkpoint, ForkCheck, ForkDetectorError
//! ├── ports/           # ForkDetector (driving), Rounder (driven)
//! ├── adapters/        # SystemRounder
//! └── service.rs       # BasicForkDetector
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::SystemRounder;
pub use domain::{Checkpoint, ForkCheck, ForkDetectorError, ForkResult, HeaderInfo};
pub use ports::{ForkDetector, MockRounder, Rounder};
pub use service::{BasicForkDetector, ForkDetectorConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
