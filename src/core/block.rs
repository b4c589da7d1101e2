// Block header and candidate construction

use crate::core::{ChainTipInfo, sha256_hex};
use crate::error::MinerError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Candidate block header
///
/// Field order here is the JSON order the chain service expects. The
/// `hash` field is derived: only the codec writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hex id of the predecessor block (32 bytes)
    #[serde(rename = "parentid")]
    pub parent_id: String,
    /// Hex SHA256 of the block contents (32 bytes)
    pub root: String,
    /// Score threshold this block must strictly exceed
    pub difficulty: u64,
    /// Nanoseconds since the Unix epoch
    pub timestamp: u64,
    /// Search variable
    pub nonce: u64,
    pub version: u8,
    /// Hex SHA256 of the encoded header, empty until first hashed
    #[serde(default)]
    hash: String,
}

impl BlockHeader {
    /// Create a new block header
    pub fn new(
        parent_id: String,
        root: String,
        difficulty: u64,
        timestamp: u64,
        nonce: u64,
        version: u8,
    ) -> Self {
        Self {
            parent_id,
            root,
            difficulty,
            timestamp,
            nonce,
            version,
            hash: String::new(),
        }
    }

    /// Last hash computed by the codec
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub(crate) fn set_hash(&mut self, hash: String) {
        self.hash = hash;
    }
}

/// Current wall-clock time in nanoseconds since the Unix epoch
pub fn now_nanos() -> Result<u64, MinerError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| MinerError::Clock(e.to_string()))?;
    u64::try_from(elapsed.as_nanos())
        .map_err(|_| MinerError::Clock("nanosecond timestamp overflows u64".to_string()))
}

/// Build a fresh candidate on top of `tip` committing to `contents`
///
/// The nonce is left at zero; callers seed it before searching.
pub fn make_block(tip: &ChainTipInfo, contents: &str) -> Result<BlockHeader, MinerError> {
    Ok(BlockHeader::new(
        tip.parent_id.clone(),
        sha256_hex(contents.as_bytes()),
        tip.difficulty,
        now_nanos()?,
        0,
        tip.version,
    ))
}
