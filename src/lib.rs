// Popcount proof-of-work miner
// Polls a chain service, searches nonces scored by bit population count,
// and submits solved blocks.

pub mod core;
pub mod consensus;
pub mod network;
pub mod mining;
pub mod error;
mod cli;

// Re-exports for convenience
pub use core::{BlockHeader, ChainTipInfo, Hash256, make_block};
pub use consensus::{Scorer, PopcountScorer, FiveSwapScorer, SearchOutcome, search, verify};
pub use network::{ChainService, HttpChainClient, BlockSubmission};
pub use mining::{MiningSession, MinerConfig, RetryPolicy};
pub use error::{EncodingError, ScorerError, ServiceError, AttemptError, MinerError};
pub use cli::{Cli, CliHandler, Commands, MineArgs, ScorerKind};
