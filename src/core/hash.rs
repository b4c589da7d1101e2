// Hashing utilities

use sha2::{Sha256, Digest};
use crate::core::Hash256;

/// Single SHA256 hash
pub fn sha256(data: &[u8]) -> Hash256 {
    Hash256::new(Sha256::digest(data).into())
}

/// Lowercase hex SHA256, the form roots are carried in
pub fn sha256_hex(data: &[u8]) -> String {
    sha256(data).to_hex()
}
