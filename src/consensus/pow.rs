// Proof of Work nonce search

use crate::consensus::scorer::{Scorer, hash_integer};
use crate::core::{BlockHeader, codec};
use crate::error::AttemptError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Trials per attempt before control returns to re-poll the chain tip
pub const DEFAULT_ATTEMPT_BUDGET: u64 = 120_000;

const PROGRESS_INTERVAL: u64 = 100_000;

/// Per-attempt bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchState {
    pub nonces_tried: u64,
    pub best_score_seen: u64,
}

impl SearchState {
    fn record(&mut self, score: u64) {
        self.best_score_seen = self.best_score_seen.max(score);
    }
}

/// How a search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The header now carries a winning nonce and its hash
    Solved { score: u64, nonces_tried: u64 },
    /// Budget used up without a qualifying score
    Exhausted { best_score_seen: u64, nonces_tried: u64 },
    /// Stopped early through the cancel flag
    Cancelled { best_score_seen: u64, nonces_tried: u64 },
}

impl SearchOutcome {
    pub fn nonces_tried(&self) -> u64 {
        match *self {
            SearchOutcome::Solved { nonces_tried, .. }
            | SearchOutcome::Exhausted { nonces_tried, .. }
            | SearchOutcome::Cancelled { nonces_tried, .. } => nonces_tried,
        }
    }

    pub fn best_score(&self) -> u64 {
        match *self {
            SearchOutcome::Solved { score, .. } => score,
            SearchOutcome::Exhausted { best_score_seen, .. }
            | SearchOutcome::Cancelled { best_score_seen, .. } => best_score_seen,
        }
    }
}

/// Score the header's current nonce, refreshing its hash
pub fn score_header(header: &mut BlockHeader, scorer: &dyn Scorer) -> Result<u64, AttemptError> {
    let digest = codec::digest(header)?;
    Ok(scorer.score(&hash_integer(&digest))?)
}

/// Search for a nonce whose score strictly exceeds `difficulty`
///
/// Starts from the seed already in `header.nonce` and increments it
/// (wrapping) before every trial, so after `n` trials the nonce is
/// `seed + n`. The cancel flag is checked once per trial.
pub fn search(
    header: &mut BlockHeader,
    scorer: &dyn Scorer,
    difficulty: u64,
    attempt_budget: u64,
    cancel: &AtomicBool,
) -> Result<SearchOutcome, AttemptError> {
    let start_time = Instant::now();
    let mut state = SearchState::default();

    loop {
        if state.nonces_tried == attempt_budget {
            return Ok(SearchOutcome::Exhausted {
                best_score_seen: state.best_score_seen,
                nonces_tried: state.nonces_tried,
            });
        }
        if cancel.load(Ordering::Relaxed) {
            return Ok(SearchOutcome::Cancelled {
                best_score_seen: state.best_score_seen,
                nonces_tried: state.nonces_tried,
            });
        }

        header.nonce = header.nonce.wrapping_add(1);
        state.nonces_tried += 1;

        let score = score_header(header, scorer)?;
        state.record(score);

        if score > difficulty {
            log::debug!(
                "Nonce {} scores {} > {} after {} tries",
                header.nonce,
                score,
                difficulty,
                state.nonces_tried
            );
            return Ok(SearchOutcome::Solved {
                score,
                nonces_tried: state.nonces_tried,
            });
        }

        if state.nonces_tried % PROGRESS_INTERVAL == 0 {
            let elapsed = start_time.elapsed();
            log::debug!(
                "Search progress: {} nonces, best {} ({:.1} KH/s)",
                state.nonces_tried,
                state.best_score_seen,
                state.nonces_tried as f64 / elapsed.as_secs_f64() / 1000.0
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::scorer::PopcountScorer;
    use crate::error::{EncodingError, ScorerError};
    use primitive_types::U256;
    use std::sync::atomic::AtomicU64;

    /// Returns a fixed score and counts calls
    struct FixedScorer {
        score: u64,
        calls: AtomicU64,
    }

    impl FixedScorer {
        fn new(score: u64) -> Self {
            Self { score, calls: AtomicU64::new(0) }
        }
    }

    impl Scorer for FixedScorer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn score(&self, _hash: &U256) -> Result<u64, ScorerError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.score)
        }
    }

    /// Scores each trial from a script, then zero
    struct ScriptedScorer {
        scores: Vec<u64>,
        calls: AtomicU64,
    }

    impl Scorer for ScriptedScorer {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn score(&self, _hash: &U256) -> Result<u64, ScorerError> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed) as usize;
            Ok(self.scores.get(call).copied().unwrap_or(0))
        }
    }

    /// Always fails
    struct BrokenScorer;

    impl Scorer for BrokenScorer {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn score(&self, _hash: &U256) -> Result<u64, ScorerError> {
            Err(ScorerError::Evaluation {
                scorer: "broken",
                reason: "library not loaded".to_string(),
            })
        }
    }

    fn header(nonce: u64) -> BlockHeader {
        BlockHeader::new(
            "00".repeat(32),
            "4fb20ca1d4291ae0fedf3c78a5324d18031abefb2c5fb49207b96add154e8eb0".to_string(),
            120,
            1_500_000_000_000_000_000,
            nonce,
            0,
        )
    }

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn test_budget_respected() {
        let scorer = FixedScorer::new(10);
        let mut h = header(1000);
        let outcome = search(&mut h, &scorer, 10, 250, &no_cancel()).unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Exhausted { best_score_seen: 10, nonces_tried: 250 }
        );
        assert_eq!(scorer.calls.load(Ordering::Relaxed), 250);
        assert_eq!(h.nonce, 1250);
    }

    #[test]
    fn test_zero_budget() {
        let scorer = FixedScorer::new(1000);
        let mut h = header(77);
        let outcome = search(&mut h, &scorer, 0, 0, &no_cancel()).unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Exhausted { best_score_seen: 0, nonces_tried: 0 }
        );
        assert_eq!(h.nonce, 77);
        assert_eq!(h.hash(), "");
        assert_eq!(scorer.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_equal_score_does_not_qualify() {
        let scorer = ScriptedScorer { scores: vec![5, 5, 6, 9], calls: AtomicU64::new(0) };
        let mut h = header(0);
        let outcome = search(&mut h, &scorer, 5, 100, &no_cancel()).unwrap();
        assert_eq!(outcome, SearchOutcome::Solved { score: 6, nonces_tried: 3 });
        assert_eq!(h.nonce, 3);
    }

    #[test]
    fn test_best_score_tracked() {
        let scorer = ScriptedScorer { scores: vec![3, 8, 2, 7], calls: AtomicU64::new(0) };
        let mut h = header(0);
        let outcome = search(&mut h, &scorer, 50, 4, &no_cancel()).unwrap();
        assert_eq!(outcome.best_score(), 8);
        assert_eq!(outcome.nonces_tried(), 4);
        assert!(matches!(outcome, SearchOutcome::Exhausted { .. }));
    }

    #[test]
    fn test_nonce_wraps_around() {
        let scorer = FixedScorer::new(0);
        let mut h = header(u64::MAX - 1);
        let outcome = search(&mut h, &scorer, 0, 3, &no_cancel()).unwrap();
        assert_eq!(outcome.nonces_tried(), 3);
        assert_eq!(h.nonce, 1);
    }

    #[test]
    fn test_impossible_difficulty_exhausts() {
        let mut h = header(42);
        let outcome = search(&mut h, &PopcountScorer, 256, 500, &no_cancel()).unwrap();
        assert!(matches!(outcome, SearchOutcome::Exhausted { nonces_tried: 500, .. }));
        assert!(outcome.best_score() <= 256);
    }

    #[test]
    fn test_zero_difficulty_solves_first_trial() {
        // Seed 41 makes the first trial nonce 42, the fixed codec vector
        let mut h = header(41);
        let outcome = search(&mut h, &PopcountScorer, 0, 10, &no_cancel()).unwrap();
        assert_eq!(outcome, SearchOutcome::Solved { score: 133, nonces_tried: 1 });
        assert_eq!(h.nonce, 42);
        assert_eq!(h.hash(), "8b6e9da190a21e1293ccf4ea2f16d7d3d36d0a1b7f00cde82a6058c6f5dd7bde");
    }

    #[test]
    fn test_solved_header_rescores_the_same() {
        let mut h = header(1234);
        let outcome = search(&mut h, &PopcountScorer, 128, 10_000, &no_cancel()).unwrap();
        if let SearchOutcome::Solved { score, .. } = outcome {
            let mut copy = h.clone();
            assert_eq!(score_header(&mut copy, &PopcountScorer).unwrap(), score);
            assert_eq!(copy.hash(), h.hash());
            assert!(score > 128);
        }
    }

    #[test]
    fn test_cancel_stops_before_first_trial() {
        let scorer = FixedScorer::new(0);
        let cancel = AtomicBool::new(true);
        let mut h = header(9);
        let outcome = search(&mut h, &scorer, 100, 1000, &cancel).unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Cancelled { best_score_seen: 0, nonces_tried: 0 }
        );
        assert_eq!(h.nonce, 9);
    }

    #[test]
    fn test_cancel_mid_search() {
        /// Raises the cancel flag on its third call
        struct CancellingScorer<'a> {
            cancel: &'a AtomicBool,
            calls: AtomicU64,
        }

        impl Scorer for CancellingScorer<'_> {
            fn name(&self) -> &'static str {
                "cancelling"
            }

            fn score(&self, _hash: &U256) -> Result<u64, ScorerError> {
                if self.calls.fetch_add(1, Ordering::Relaxed) == 2 {
                    self.cancel.store(true, Ordering::Relaxed);
                }
                Ok(1)
            }
        }

        let cancel = AtomicBool::new(false);
        let scorer = CancellingScorer { cancel: &cancel, calls: AtomicU64::new(0) };
        let mut h = header(0);
        let outcome = search(&mut h, &scorer, 100, 1000, &cancel).unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Cancelled { best_score_seen: 1, nonces_tried: 3 }
        );
    }

    #[test]
    fn test_scorer_error_aborts_attempt() {
        let mut h = header(0);
        let err = search(&mut h, &BrokenScorer, 0, 10, &no_cancel()).unwrap_err();
        assert!(matches!(err, AttemptError::Scorer(_)));
    }

    #[test]
    fn test_encoding_error_aborts_attempt() {
        let mut h = header(0);
        h.parent_id = "abc".to_string();
        let err = search(&mut h, &PopcountScorer, 0, 10, &no_cancel()).unwrap_err();
        assert!(matches!(
            err,
            AttemptError::Encoding(EncodingError::InvalidHex { field: "parentid", .. })
        ));
    }
}
