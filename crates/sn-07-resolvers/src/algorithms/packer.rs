//! # Size Data Packer
//!
//! Splits a list of marshaled items into marshaled chunks whose payload
//! stays under a byte limit, so large transaction batches go out as several
//! messages instead of one oversized one.

use shared_types::{BincodeMarshalizer, Marshalizer};

use crate::domain::{ResolverError, ResolverResult};

/// Packs items into marshaled `Vec<Vec<u8>>` chunks.
#[derive(Debug, Clone, Default)]
pub struct SizeDataPacker<M: Marshalizer = BincodeMarshalizer> {
    marshalizer: M,
}

impl<M: Marshalizer> SizeDataPacker<M> {
    /// Create a packer.
    pub fn new(marshalizer: M) -> Self {
        Self { marshalizer }
    }

    /// Pack `items` in order. A chunk closes before the item that would take
    /// its payload over `limit`; an item larger than `limit` travels alone.
    pub fn pack_data_in_chunks(&self, items: &[Vec<u8>], limit: usize) -> ResolverResult<Vec<Vec<u8>>> {
        if limit == 0 {
            return Err(ResolverError::InvalidChunkLimit(limit));
        }

        let mut chunks = Vec::new();
        let mut current: Vec<&Vec<u8>> = Vec::new();
        let mut current_size = 0;

        for item in items {
            if !current.is_empty() && current_size + item.len() > limit {
                chunks.push(self.marshalizer.marshal(&current)?);
                current.clear();
                current_size = 0;
            }
            current_size += item.len();
            current.push(item);
        }

        if !current.is_empty() {
            chunks.push(self.marshalizer.marshal(&current)?);
        }
        Ok(chunks)
    }
}
