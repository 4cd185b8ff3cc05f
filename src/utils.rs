//! Utility functions for identifier generation and encoding

use crate::error::IdError;
use bech32::{Bech32m, Hrp};
use uuid7::uuid7;

// uuid7 keeps ids monotonic within the process, so byte order is creation order
pub fn new_id_bytes() -> [u8; 16] {
    *uuid7().as_bytes()
}

// encode raw id bytes as bech32m under a human readable prefix
pub fn encode_id(hrp: &str, bytes: &[u8]) -> Result<String, IdError> {
    let hrp = Hrp::parse(hrp).map_err(|e| IdError::Encode(e.to_string()))?;
    bech32::encode::<Bech32m>(hrp, bytes).map_err(|e| IdError::Encode(e.to_string()))
}

pub fn decode_id(expected_hrp: &str, text: &str) -> Result<[u8; 16], IdError> {
    let (hrp, data) = bech32::decode(text).map_err(|e| IdError::Malformed {
        input: text.to_owned(),
        reason: e.to_string(),
    })?;

    let found = hrp.to_string();
    if found != expected_hrp {
        return Err(IdError::WrongPrefix {
            expected: expected_hrp.to_owned(),
            found,
        });
    }

    <[u8; 16]>::try_from(data).map_err(|data| IdError::Length(data.len()))
}
