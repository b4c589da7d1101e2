// Scoring, nonce search and verification

pub mod pow;
pub mod scorer;
pub mod validation;

pub use pow::{search, score_header, SearchOutcome, SearchState, DEFAULT_ATTEMPT_BUDGET};
pub use scorer::{Scorer, PopcountScorer, FiveSwapScorer, hash_integer};
pub use validation::verify;
