//! # Canonical Codec
//!
//! Marshaling and hashing used for every identity computation in the node.
//!
//! Both sides must be deterministic: two nodes marshaling the same header
//! must produce the same bytes, and therefore the same hash.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::entities::Hash;
use crate::errors::CodecError;

/// Canonical object encoder.
pub trait Marshalizer: Send + Sync + 'static {
    /// Encode an object.
    fn marshal<T: Serialize + ?Sized>(&self, obj: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode an object.
    fn unmarshal<T: DeserializeOwned>(&self, buff: &[u8]) -> Result<T, CodecError>;
}

/// Digest function.
pub trait Hasher: Send + Sync {
    /// Hash a byte string.
    fn compute(&self, data: &[u8]) -> Hash;

    /// Digest length in bytes.
    fn size(&self) -> usize;

    /// Hash of the empty byte string.
    fn empty_hash(&self) -> Hash {
        self.compute(&[])
    }
}

/// `bincode` backed marshalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeMarshalizer;

impl Marshalizer for BincodeMarshalizer {
    fn marshal<T: Serialize + ?Sized>(&self, obj: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(obj).map_err(|e| CodecError::Marshal(e.to_string()))
    }

    fn unmarshal<T: DeserializeOwned>(&self, buff: &[u8]) -> Result<T, CodecError> {
        bincode::deserialize(buff).map_err(|e| CodecError::Unmarshal(e.to_string()))
    }
}

/// Keccak-256 hasher (default for header and transaction identity).
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl Hasher for Keccak256Hasher {
    fn compute(&self, data: &[u8]) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(data);
        hasher.finalize().to_vec()
    }

    fn size(&self) -> usize {
        32
    }
}

/// SHA-256 hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn compute(&self, data: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().to_vec()
    }

    fn size(&self) -> usize {
        32
    }
}

/// Marshal `obj` and hash the encoding.
pub fn calculate_hash<M, T>(marshalizer: &M, hasher: &dyn Hasher, obj: &T) -> Result<Hash, CodecError>
where
    M: Marshalizer,
    T: Serialize + ?Sized,
{
    let buff = marshalizer.marshal(obj)?;
    Ok(hasher.compute(&buff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Header, ShardHeader};

    #[test]
    fn test_bincode_roundtrip_header() {
        let marshalizer = BincodeMarshalizer;
        let header: Header = ShardHeader {
            nonce: 3,
            round: 4,
            prev_hash: b"prev".to_vec(),
            ..Default::default()
        }
        .into();

        let buff = marshalizer.marshal(&header).unwrap();
        let decoded: Header = marshalizer.unmarshal(&buff).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_unmarshal_garbage_fails() {
        let result: Result<Header, _> = BincodeMarshalizer.unmarshal(&[0xFF, 0xFF, 0xFF]);
        assert!(matches!(result, Err(CodecError::Unmarshal(_))));
    }

    #[test]
    fn test_hashers_are_distinct_and_sized() {
        let keccak = Keccak256Hasher.compute(b"abc");
        let sha = Sha256Hasher.compute(b"abc");
        assert_eq!(keccak.len(), 32);
        assert_eq!(sha.len(), 32);
        assert_ne!(keccak, sha);
        assert_eq!(Keccak256Hasher.empty_hash(), Keccak256Hasher.compute(&[]));
    }

    #[test]
    fn test_calculate_hash_changes_with_any_field() {
        let base = ShardHeader {
            nonce: 1,
            round: 1,
            ..Default::default()
        };
        let mut changed = base.clone();
        changed.timestamp = 1;

        let h1 = calculate_hash(&BincodeMarshalizer, &Keccak256Hasher, &Header::Shard(base.clone())).unwrap();
        let h2 = calculate_hash(&BincodeMarshalizer, &Keccak256Hasher, &Header::Shard(base)).unwrap();
        let h3 = calculate_hash(&BincodeMarshalizer, &Keccak256Hasher, &Header::Shard(changed)).unwrap();
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
