//! Request envelope sent on request topics.

use serde::{Deserialize, Serialize};

/// What the request value holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestDataType {
    /// One hash.
    Hash,
    /// A marshaled list of hashes.
    HashArray,
    /// A big-endian `u64` nonce.
    Nonce,
}

/// A data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestData {
    /// Interpretation of `value`.
    pub kind: RequestDataType,
    /// Encoded request key.
    pub value: Vec<u8>,
}

impl RequestData {
    /// Request for one hash.
    pub fn hash(hash: &[u8]) -> Self {
        Self {
            kind: RequestDataType::Hash,
            value: hash.to_vec(),
        }
    }

    /// Request for a header by nonce.
    pub fn nonce(nonce: u64) -> Self {
        Self {
            kind: RequestDataType::Nonce,
            value: nonce.to_be_bytes().to_vec(),
        }
    }

    /// Request for several hashes; `value` is their marshaled list.
    pub fn hash_array(buff: Vec<u8>) -> Self {
        Self {
            kind: RequestDataType::HashArray,
            value: buff,
        }
    }

    /// Decode a nonce request value.
    pub fn nonce_value(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.value.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }
}
