// Chain service JSON messages

use crate::core::BlockHeader;
use serde::{Deserialize, Serialize};

/// Body of `POST /add`: the header and the contents it commits to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSubmission {
    pub header: BlockHeader,
    /// Contents string whose SHA256 is `header.root`
    pub block: String,
}

impl BlockSubmission {
    pub fn new(header: BlockHeader, contents: &str) -> Self {
        Self {
            header,
            block: contents.to_string(),
        }
    }
}
