//! # Algorithms

pub mod packer;

pub use packer::SizeDataPacker;
