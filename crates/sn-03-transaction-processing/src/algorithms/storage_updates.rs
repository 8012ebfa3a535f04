//! # Storage Update Encoding
//!
//! Results carry contract storage writes in their data field as
//! `hex(key)@hex(value)@hex(key)@hex(value)...`.

use crate::domain::{TxProcessError, TxProcessResult};

/// Decode `hex(key)@hex(value)` pairs. Empty data yields no updates.
pub fn parse_storage_updates(data: &[u8]) -> TxProcessResult<Vec<(Vec<u8>, Vec<u8>)>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let text = std::str::from_utf8(data)
        .map_err(|e| TxProcessError::InvalidStorageUpdate(e.to_string()))?;
    let parts: Vec<&str> = text.split('@').collect();
    if parts.len() % 2 != 0 {
        return Err(TxProcessError::InvalidStorageUpdate(format!(
            "odd number of fields: {}",
            parts.len()
        )));
    }

    parts
        .chunks(2)
        .map(|pair| {
            let key = hex::decode(pair[0])
                .map_err(|e| TxProcessError::InvalidStorageUpdate(e.to_string()))?;
            let value = hex::decode(pair[1])
                .map_err(|e| TxProcessError::InvalidStorageUpdate(e.to_string()))?;
            Ok((key, value))
        })
        .collect()
}

/// Encode storage updates in the same format.
pub fn encode_storage_updates(updates: &[(Vec<u8>, Vec<u8>)]) -> Vec<u8> {
    updates
        .iter()
        .map(|(key, value)| format!("{}@{}", hex::encode(key), hex::encode(value)))
        .collect::<Vec<_>>()
        .join("@")
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let updates = parse_storage_updates(b"6b31@7631@6b32@").unwrap();
        assert_eq!(
            updates,
            vec![(b"k1".to_vec(), b"v1".to_vec()), (b"k2".to_vec(), Vec::new())]
        );
        assert!(parse_storage_updates(b"").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_storage_updates(b"6b31").is_err());
        assert!(parse_storage_updates(b"zz@00").is_err());
        assert!(parse_storage_updates(&[0xFF, 0xFE]).is_err());
    }

    #[test]
    fn test_encode_matches_parse() {
        let updates = vec![(b"a".to_vec(), b"1".to_vec())];
        assert_eq!(encode_storage_updates(&updates), b"61@31".to_vec());
    }
}
