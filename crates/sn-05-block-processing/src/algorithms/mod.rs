//! # Algorithms

pub mod header_chain;

pub use header_chain::{check_header_finality, is_hdr_construction_valid};
