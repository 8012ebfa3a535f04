//! # Address Conversion
//!
//! Validates raw public key bytes before they are used as addresses.

use shared_types::Address;

use crate::domain::errors::{ShardingError, ShardingResult};
use crate::ports::AddressConverter;

/// Converter accepting addresses of one fixed length.
#[derive(Debug, Clone, Copy)]
pub struct PlainAddressConverter {
    address_len: usize,
}

impl PlainAddressConverter {
    /// Create a converter for `address_len` byte addresses.
    pub fn new(address_len: usize) -> Self {
        Self { address_len }
    }
}

impl Default for PlainAddressConverter {
    fn default() -> Self {
        Self::new(32)
    }
}

impl AddressConverter for PlainAddressConverter {
    fn create_address(&self, pub_key: &[u8]) -> ShardingResult<Address> {
        if pub_key.is_empty() {
            return Err(ShardingError::EmptyAddress);
        }
        if pub_key.len() != self.address_len {
            return Err(ShardingError::WrongAddressLength {
                expected: self.address_len,
                got: pub_key.len(),
            });
        }
        Ok(Address::new(pub_key.to_vec()))
    }

    fn address_len(&self) -> usize {
        self.address_len
    }
}
