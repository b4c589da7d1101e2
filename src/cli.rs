// CLI commands

use clap::{Args, Parser, Subcommand, ValueEnum};
use crate::consensus::{hash_integer, FiveSwapScorer, PopcountScorer, Scorer, DEFAULT_ATTEMPT_BUDGET};
use crate::consensus::scorer::FIVESWAP_DEFAULT_LENGTH;
use crate::core::Hash256;
use crate::error::MinerError;
use crate::mining::{MinerConfig, MiningSession, RetryPolicy};
use crate::network::{ChainService, HttpChainClient, DEFAULT_NODE_URL};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "popminer")]
#[command(about = "Popcount proof-of-work miner", long_about = None)]
pub struct Cli {
    /// Chain service base URL
    #[arg(long, env = "POPMINER_NODE_URL", default_value = DEFAULT_NODE_URL, global = true)]
    pub node_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mine blocks on top of the current chain tip
    Mine(MineArgs),

    /// Show the chain tip the service wants built on
    Next,

    /// Score a header hash with every built-in scorer
    Score {
        /// Hex header hash (32 bytes)
        hash: String,
    },
}

/// Scoring function used by the miner
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScorerKind {
    /// Set bits of the hash integer
    Popcount,
    /// Rotate-and-multiply FiveSwap evaluator
    Fiveswap,
}

#[derive(Args, Debug, Clone)]
pub struct MineArgs {
    /// Block contents committed to by the header root
    #[arg(long, env = "POPMINER_CONTENTS", default_value = "Akselsd")]
    pub contents: String,

    /// Nonce trials per attempt before re-polling the tip
    #[arg(long, default_value_t = DEFAULT_ATTEMPT_BUDGET)]
    pub budget: u64,

    /// Tip check interval during a search in milliseconds (0 disables)
    #[arg(long, default_value = "2000")]
    pub poll_interval_ms: u64,

    /// Retries for a failing service call
    #[arg(long, default_value = "5")]
    pub retries: u32,

    /// First retry delay in milliseconds, doubled per retry
    #[arg(long, default_value = "500")]
    pub backoff_ms: u64,

    /// Upper bound for the retry delay in milliseconds
    #[arg(long, default_value = "30000")]
    pub max_backoff_ms: u64,

    #[arg(long, value_enum, default_value = "fiveswap")]
    pub scorer: ScorerKind,

    /// Sequence length for the fiveswap scorer
    #[arg(long, default_value_t = FIVESWAP_DEFAULT_LENGTH)]
    pub fiveswap_length: usize,

    /// Stop after submitting this many blocks
    #[arg(long)]
    pub max_blocks: Option<u64>,
}

impl MineArgs {
    /// Validated session settings
    pub fn to_config(&self) -> Result<MinerConfig, MinerError> {
        if self.budget == 0 {
            return Err(MinerError::Config("--budget must be at least 1".to_string()));
        }
        if self.backoff_ms > self.max_backoff_ms {
            return Err(MinerError::Config(
                "--backoff-ms must not exceed --max-backoff-ms".to_string(),
            ));
        }

        Ok(MinerConfig {
            contents: self.contents.clone(),
            attempt_budget: self.budget,
            poll_interval: (self.poll_interval_ms > 0)
                .then(|| Duration::from_millis(self.poll_interval_ms)),
            retry: RetryPolicy {
                max_retries: self.retries,
                initial_backoff: Duration::from_millis(self.backoff_ms),
                max_backoff: Duration::from_millis(self.max_backoff_ms),
            },
            max_blocks: self.max_blocks,
        })
    }

    pub fn build_scorer(&self) -> Result<Arc<dyn Scorer>, MinerError> {
        Ok(match self.scorer {
            ScorerKind::Popcount => Arc::new(PopcountScorer),
            ScorerKind::Fiveswap => Arc::new(FiveSwapScorer::new(self.fiveswap_length)?),
        })
    }
}

/// CLI handler
pub struct CliHandler {
    client: HttpChainClient,
}

impl CliHandler {
    pub fn new(node_url: &str, timeout: Duration) -> Result<Self, MinerError> {
        let client = HttpChainClient::new(node_url, timeout)
            .map_err(|source| MinerError::Service { attempts: 1, source })?;
        Ok(Self { client })
    }

    /// Handle CLI command
    pub async fn handle(self, command: Commands) -> Result<(), MinerError> {
        match command {
            Commands::Mine(args) => self.mine(args).await,
            Commands::Next => self.next().await,
            Commands::Score { hash } => score(&hash),
        }
    }

    async fn mine(self, args: MineArgs) -> Result<(), MinerError> {
        let config = args.to_config()?;
        let scorer = args.build_scorer()?;
        log::info!("Mining against {}", self.client.base_url());

        let shutdown = Arc::new(AtomicBool::new(false));
        let signal = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Shutting down after the current attempt...");
                signal.store(true, Ordering::Relaxed);
            }
        });

        let mut session = MiningSession::new(self.client, scorer, config);
        let stats = session.run(&shutdown).await?;

        println!("Blocks submitted: {}", stats.blocks_submitted);
        println!("Attempts exhausted: {}", stats.total_attempts);
        Ok(())
    }

    async fn next(&self) -> Result<(), MinerError> {
        let tip = self
            .client
            .fetch_tip()
            .await
            .map_err(|source| MinerError::Service { attempts: 1, source })?;

        println!("Parent:     {}", tip.parent_id);
        println!("Difficulty: {}", tip.difficulty);
        println!("Version:    {}", tip.version);
        Ok(())
    }
}

fn score(hash_hex: &str) -> Result<(), MinerError> {
    let bytes = hex::decode(hash_hex)
        .ok()
        .and_then(|bytes| Hash256::from_slice(&bytes))
        .ok_or_else(|| MinerError::Config(format!("not a 32-byte hex hash: {}", hash_hex)))?;
    let value = hash_integer(&bytes);

    let scorers: [Box<dyn Scorer>; 2] = [Box::new(PopcountScorer), Box::new(FiveSwapScorer::default())];
    for scorer in &scorers {
        println!("{:>9}: {}", scorer.name(), scorer.score(&value)?);
    }
    Ok(())
}
