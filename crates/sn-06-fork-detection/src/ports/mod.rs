//! # Ports

pub mod inbound;
pub mod outbound;

pub use inbound::ForkDetector;
pub use outbound::{MockRounder, Rounder};
