// Pre-submission verification of solved headers

use crate::consensus::pow::score_header;
use crate::consensus::scorer::Scorer;
use crate::core::BlockHeader;
use crate::error::AttemptError;

/// Re-encode, re-hash and re-score `header` against its own difficulty
///
/// Returns the fresh score if it strictly exceeds the difficulty.
pub fn verify(header: &mut BlockHeader, scorer: &dyn Scorer) -> Result<u64, AttemptError> {
    let score = score_header(header, scorer)?;
    if score > header.difficulty {
        Ok(score)
    } else {
        Err(AttemptError::NotSolved {
            score,
            difficulty: header.difficulty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::PopcountScorer;
    use crate::error::ScorerError;
    use primitive_types::U256;

    /// Returns the same score for every hash
    struct FixedScorer(u64);

    impl Scorer for FixedScorer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn score(&self, _hash: &U256) -> Result<u64, ScorerError> {
            Ok(self.0)
        }
    }

    // Difficulty is part of the hashed bytes; this is the codec test header
    fn header() -> BlockHeader {
        BlockHeader::new(
            "00".repeat(32),
            "4fb20ca1d4291ae0fedf3c78a5324d18031abefb2c5fb49207b96add154e8eb0".to_string(),
            120,
            1_500_000_000_000_000_000,
            42,
            0,
        )
    }

    #[test]
    fn test_verify_accepts_winning_header() {
        // Nonce 42 hashes to an integer with 133 set bits
        let mut h = header();
        assert_eq!(verify(&mut h, &PopcountScorer).unwrap(), 133);
        assert!(!h.hash().is_empty());
    }

    #[test]
    fn test_verify_rejects_equal_score() {
        let mut h = header();
        assert_eq!(
            verify(&mut h, &FixedScorer(120)).unwrap_err(),
            AttemptError::NotSolved { score: 120, difficulty: 120 }
        );
        assert_eq!(verify(&mut h, &FixedScorer(121)).unwrap(), 121);
    }

    #[test]
    fn test_verify_rejects_lower_score() {
        let mut h = header();
        assert_eq!(
            verify(&mut h, &FixedScorer(3)).unwrap_err(),
            AttemptError::NotSolved { score: 3, difficulty: 120 }
        );
    }

    #[test]
    fn test_verify_refreshes_stale_hash() {
        let mut h = header();
        h.set_hash("ff".repeat(32));
        verify(&mut h, &PopcountScorer).unwrap();
        assert_eq!(h.hash(), "8b6e9da190a21e1293ccf4ea2f16d7d3d36d0a1b7f00cde82a6058c6f5dd7bde");
    }
}
