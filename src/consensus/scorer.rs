// Popcount scoring of header hashes

use crate::core::Hash256;
use crate::error::ScorerError;
use primitive_types::U256;

/// Sequence length used by the FiveSwap evaluator
pub const FIVESWAP_DEFAULT_LENGTH: usize = 10_000;

/// Scoring capability consumed by the nonce search
///
/// Implementations must be pure: the same integer always yields the same
/// score, and no state is kept between calls, so one instance can be
/// shared across threads.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score a 256-bit hash integer; higher is closer to solved
    fn score(&self, hash: &U256) -> Result<u64, ScorerError>;
}

/// Integer value of a digest, reading the hex hash as a number
///
/// External evaluators receive this integer in little-endian byte order.
pub fn hash_integer(digest: &Hash256) -> U256 {
    U256::from_big_endian(digest.as_bytes())
}

fn popcount(value: &U256) -> u64 {
    value.0.iter().map(|limb| u64::from(limb.count_ones())).sum()
}

/// Swap the upper and lower 128-bit halves
#[inline]
fn rotate_half(value: U256) -> U256 {
    let [l0, l1, l2, l3] = value.0;
    U256([l2, l3, l0, l1])
}

/// Plain bit population count of the hash integer (0..=256)
#[derive(Debug, Clone, Copy, Default)]
pub struct PopcountScorer;

impl Scorer for PopcountScorer {
    fn name(&self) -> &'static str {
        "popcount"
    }

    fn score(&self, hash: &U256) -> Result<u64, ScorerError> {
        Ok(popcount(hash))
    }
}

/// FiveSwap evaluator
///
/// Expands the hash into a sequence `X[i] = swap(5 * X[i-1])` of `length`
/// 256-bit words (all arithmetic mod 2^256), then sums the popcounts of
/// `X[k] + X[length-1-k]` over the first half of the sequence.
#[derive(Debug, Clone)]
pub struct FiveSwapScorer {
    length: usize,
}

impl FiveSwapScorer {
    pub fn new(length: usize) -> Result<Self, ScorerError> {
        if length < 2 || length % 2 != 0 {
            return Err(ScorerError::InvalidParameters(format!(
                "fiveswap length must be even and at least 2, got {}",
                length
            )));
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for FiveSwapScorer {
    fn default() -> Self {
        Self { length: FIVESWAP_DEFAULT_LENGTH }
    }
}

impl Scorer for FiveSwapScorer {
    fn name(&self) -> &'static str {
        "fiveswap"
    }

    fn score(&self, hash: &U256) -> Result<u64, ScorerError> {
        let five = U256::from(5u8);
        let mut sequence = Vec::with_capacity(self.length);
        sequence.push(*hash);
        for i in 1..self.length {
            let (product, _) = sequence[i - 1].overflowing_mul(five);
            sequence.push(rotate_half(product));
        }

        let half = self.length / 2;
        let total = (0..half)
            .map(|k| {
                let (sum, _) = sequence[k].overflowing_add(sequence[self.length - 1 - k]);
                popcount(&sum)
            })
            .sum();
        Ok(total)
    }
}
