//! Record format for persisted values.
//!
//! Every record is `[version: u8][MessagePack-encoded StoredValue]`. The
//! version byte lets a later layout be told apart from this one without
//! attempting to decode it.

use super::error::StoreError;
use super::types::StoredValue;

/// Current record format version.
pub const FORMAT_VERSION: u8 = 1;

/// Encode a value into a versioned record.
pub fn encode(value: &StoredValue) -> Result<Vec<u8>, StoreError> {
    let body = rmp_serde::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a record produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<StoredValue, StoreError> {
    let Some((&version, body)) = bytes.split_first() else {
        return Err(StoreError::Corrupt("empty record".to_string()));
    };
    if version != FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unknown record version {version}"
        )));
    }

    rmp_serde::from_slice(body).map_err(|e| StoreError::Corrupt(e.to_string()))
}
