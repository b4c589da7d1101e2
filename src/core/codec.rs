// Canonical header encoding
//
// Integer fields are rendered as fixed-width zero-padded hex text and the
// whole header is assembled as hex before being decoded to bytes. The hex
// text is the wire contract, so it is built literally rather than from
// numeric byte serializations.

use crate::core::{BlockHeader, Hash256, sha256};
use crate::error::EncodingError;

/// Length in bytes of `parent_id` and `root`
pub const ID_LEN: usize = 32;
/// Hex digits used for difficulty, timestamp and nonce
pub const U64_HEX_WIDTH: usize = 16;
/// Hex digits used for the version byte
pub const VERSION_HEX_WIDTH: usize = 2;
/// Size of an encoded header
pub const ENCODED_LEN: usize = 2 * ID_LEN + 3 * (U64_HEX_WIDTH / 2) + VERSION_HEX_WIDTH / 2;

/// Zero-padded lowercase hex of `value`, exactly `width` digits
pub fn fixed_width_hex(field: &'static str, value: u64, width: usize) -> Result<String, EncodingError> {
    let text = format!("{:0width$x}", value, width = width);
    if text.len() > width {
        return Err(EncodingError::FieldOverflow { field, value, width });
    }
    Ok(text)
}

/// Check that a hex id decodes to exactly `ID_LEN` bytes
fn checked_id<'a>(field: &'static str, id: &'a str) -> Result<&'a str, EncodingError> {
    let bytes = hex::decode(id).map_err(|e| EncodingError::InvalidHex {
        field,
        reason: e.to_string(),
    })?;
    if bytes.len() != ID_LEN {
        return Err(EncodingError::InvalidLength {
            field,
            expected: ID_LEN,
            actual: bytes.len(),
        });
    }
    Ok(id)
}

/// Encode a header into the bytes that get hashed
pub fn encode(header: &BlockHeader) -> Result<Vec<u8>, EncodingError> {
    let mut text = String::with_capacity(ENCODED_LEN * 2);
    text.push_str(checked_id("parentid", &header.parent_id)?);
    text.push_str(checked_id("root", &header.root)?);
    text.push_str(&fixed_width_hex("difficulty", header.difficulty, U64_HEX_WIDTH)?);
    text.push_str(&fixed_width_hex("timestamp", header.timestamp, U64_HEX_WIDTH)?);
    text.push_str(&fixed_width_hex("nonce", header.nonce, U64_HEX_WIDTH)?);
    text.push_str(&fixed_width_hex("version", u64::from(header.version), VERSION_HEX_WIDTH)?);

    // Every piece was validated above, so this only fails on a bug.
    hex::decode(&text).map_err(|e| EncodingError::InvalidHex {
        field: "header",
        reason: e.to_string(),
    })
}

/// SHA256 of the encoded header; stores the hex form into `header.hash`
pub fn digest(header: &mut BlockHeader) -> Result<Hash256, EncodingError> {
    let digest = sha256(&encode(header)?);
    header.set_hash(digest.to_hex());
    Ok(digest)
}

/// Hex SHA256 of the encoded header; also stored into `header.hash`
pub fn hash(header: &mut BlockHeader) -> Result<String, EncodingError> {
    digest(header)?;
    Ok(header.hash().to_string())
}
