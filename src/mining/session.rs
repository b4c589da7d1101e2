// Mining session: poll the chain tip, search, submit

use crate::consensus::{search, verify, Scorer, SearchOutcome, DEFAULT_ATTEMPT_BUDGET};
use crate::core::{make_block, BlockHeader};
use crate::error::{AttemptError, MinerError, ServiceError};
use crate::mining::RetryPolicy;
use crate::network::{BlockSubmission, ChainService};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Session settings
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Block contents; the header root commits to its SHA256
    pub contents: String,
    /// Nonce trials per attempt
    pub attempt_budget: u64,
    /// How often to re-check the tip during a search; `None` only
    /// re-checks between attempts
    pub poll_interval: Option<Duration>,
    pub retry: RetryPolicy,
    /// Stop after this many submitted blocks
    pub max_blocks: Option<u64>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            contents: "Akselsd".to_string(),
            attempt_budget: DEFAULT_ATTEMPT_BUDGET,
            poll_interval: Some(Duration::from_secs(2)),
            retry: RetryPolicy::default(),
            max_blocks: None,
        }
    }
}

/// Observational counters; none of these drive decisions
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Parent the current attempts are built on
    pub current_parent: Option<String>,
    /// Exhausted attempts against the current parent
    pub attempts: u64,
    /// Exhausted attempts since the session started
    pub total_attempts: u64,
    pub blocks_submitted: u64,
    pub started_at: Instant,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            current_parent: None,
            attempts: 0,
            total_attempts: 0,
            blocks_submitted: 0,
            started_at: Instant::now(),
        }
    }

    /// Nonces tried across exhausted attempts
    pub fn total_nonces(&self, attempt_budget: u64) -> u64 {
        self.total_attempts.saturating_mul(attempt_budget)
    }

    /// Throughput in nonces per second
    pub fn hash_rate(&self, attempt_budget: u64) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }
        self.total_nonces(attempt_budget) as f64 / elapsed
    }
}

/// Result of one poll/build/search round
#[derive(Debug)]
pub enum CycleOutcome {
    /// A verified block was accepted by the service
    Submitted { hash: String, score: u64 },
    /// The service refused the block
    Rejected { hash: String, status: u16, body: String },
    /// Budget used up; the next cycle re-polls the tip
    Exhausted { best_score: u64 },
    /// The parent changed while searching
    Preempted { nonces_tried: u64 },
    /// The attempt failed locally and was dropped
    Aborted(AttemptError),
}

/// Drives repeated mining attempts against a chain service
pub struct MiningSession<C: ChainService> {
    service: C,
    scorer: Arc<dyn Scorer>,
    config: MinerConfig,
    stats: SessionStats,
}

impl<C: ChainService> MiningSession<C> {
    pub fn new(service: C, scorer: Arc<dyn Scorer>, config: MinerConfig) -> Self {
        Self {
            service,
            scorer,
            config,
            stats: SessionStats::new(),
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    /// Mine until `shutdown` is set, `max_blocks` is reached or the
    /// service stays unavailable past the retry policy
    pub async fn run(&mut self, shutdown: &AtomicBool) -> Result<SessionStats, MinerError> {
        log::info!(
            "Mining with {} scorer, {} nonces per attempt",
            self.scorer.name(),
            self.config.attempt_budget
        );

        while !shutdown.load(Ordering::Relaxed) {
            if let Some(max) = self.config.max_blocks {
                if self.stats.blocks_submitted >= max {
                    log::info!("Submitted {} blocks, stopping", max);
                    break;
                }
            }
            self.cycle().await?;
        }

        Ok(self.stats.clone())
    }

    /// One round: poll, build a fresh candidate, search, maybe submit
    pub async fn cycle(&mut self) -> Result<CycleOutcome, MinerError> {
        let tip = self
            .config
            .retry
            .run("fetch chain tip", || self.service.fetch_tip())
            .await?;

        let mut header = make_block(&tip, &self.config.contents)?;
        if self.stats.current_parent.as_deref() != Some(tip.parent_id.as_str()) {
            self.stats.current_parent = Some(tip.parent_id.clone());
            self.stats.attempts = 0;
            log::info!("Solving block {} with root {}", tip.parent_id, header.root);
        }
        header.nonce = rand::random::<u64>();

        let (mut header, result) = self.run_search(header).await?;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Attempt aborted: {}", e);
                return Ok(CycleOutcome::Aborted(e));
            }
        };

        match outcome {
            SearchOutcome::Solved { score, nonces_tried } => {
                log::info!("Found block after {} tries. Score: {}", nonces_tried, score);
                self.submit(&mut header).await
            }
            SearchOutcome::Exhausted { best_score_seen, nonces_tried } => {
                self.stats.attempts += 1;
                self.stats.total_attempts += 1;
                log::info!(
                    "Record: {} after {} nonces tried. Current difficulty: {}",
                    best_score_seen,
                    nonces_tried,
                    tip.difficulty
                );
                log::info!(
                    "Total nonces tried: {} ({:.0} / sec)",
                    self.stats.total_nonces(self.config.attempt_budget),
                    self.stats.hash_rate(self.config.attempt_budget)
                );
                Ok(CycleOutcome::Exhausted { best_score: best_score_seen })
            }
            SearchOutcome::Cancelled { nonces_tried, .. } => {
                log::info!("Parent changed, abandoning search after {} nonces", nonces_tried);
                Ok(CycleOutcome::Preempted { nonces_tried })
            }
        }
    }

    /// Verify and send a solved header
    async fn submit(&mut self, header: &mut BlockHeader) -> Result<CycleOutcome, MinerError> {
        let score = match verify(header, self.scorer.as_ref()) {
            Ok(score) => score,
            Err(e) => {
                log::warn!("Solved header failed verification: {}", e);
                return Ok(CycleOutcome::Aborted(e));
            }
        };

        let hash = header.hash().to_string();
        let submission = BlockSubmission::new(header.clone(), &self.config.contents);
        let sent = self
            .config
            .retry
            .run("submit block", || self.service.submit(&submission))
            .await;

        match sent {
            Ok(response) => {
                self.stats.blocks_submitted += 1;
                log::info!("Block {} submitted: {}", hash, response.trim());
                Ok(CycleOutcome::Submitted { hash, score })
            }
            Err(MinerError::Service {
                source: ServiceError::Rejected { status, body },
                ..
            }) => {
                log::warn!("Block {} rejected ({}): {}", hash, status, body.trim());
                Ok(CycleOutcome::Rejected { hash, status, body })
            }
            Err(e) => Err(e),
        }
    }

    /// Run the nonce search on a blocking thread, watching the tip if
    /// preemption is enabled
    async fn run_search(
        &self,
        header: BlockHeader,
    ) -> Result<(BlockHeader, Result<SearchOutcome, AttemptError>), MinerError> {
        let parent = header.parent_id.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);
        let scorer = Arc::clone(&self.scorer);
        let budget = self.config.attempt_budget;

        let mut handle = tokio::task::spawn_blocking(move || {
            let mut header = header;
            let difficulty = header.difficulty;
            let outcome = search(&mut header, scorer.as_ref(), difficulty, budget, &worker_cancel);
            (header, outcome)
        });

        let Some(interval) = self.config.poll_interval else {
            return handle.await.map_err(|e| MinerError::Worker(e.to_string()));
        };

        loop {
            tokio::select! {
                joined = &mut handle => {
                    return joined.map_err(|e| MinerError::Worker(e.to_string()));
                }
                _ = tokio::time::sleep(interval), if !cancel.load(Ordering::Relaxed) => {
                    match self.service.fetch_tip().await {
                        Ok(tip) if tip.parent_id != parent => {
                            log::info!("New parent {} while searching", tip.parent_id);
                            cancel.store(true, Ordering::Relaxed);
                        }
                        Ok(_) => {}
                        // The next poll or the next cycle will try again
                        Err(e) => log::debug!("Tip check during search failed: {}", e),
                    }
                }
            }
        }
    }
}
