//! # Adapters

pub mod system_rounder;

pub use system_rounder::SystemRounder;
