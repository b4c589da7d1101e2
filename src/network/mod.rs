// Chain service access

mod message;
mod client;

pub use message::BlockSubmission;
pub use client::{ChainService, HttpChainClient, parse_tip, DEFAULT_NODE_URL};
