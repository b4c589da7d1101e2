// Error types for the miner

use thiserror::Error;

/// A header field violates the fixed-width encoding rules.
///
/// The header that produced it must be rebuilt; re-encoding the same
/// instance fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Integer field does not fit in its hex width
    #[error("field {field} = {value:#x} does not fit in {width} hex digits")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        width: usize,
    },
    /// Identifier is not valid hex
    #[error("field {field} is not valid hex: {reason}")]
    InvalidHex { field: &'static str, reason: String },
    /// Identifier decodes to the wrong number of bytes
    #[error("field {field} must be {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// The scoring capability failed or was misconfigured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScorerError {
    #[error("invalid scorer parameters: {0}")]
    InvalidParameters(String),
    #[error("scorer {scorer} failed: {reason}")]
    Evaluation { scorer: &'static str, reason: String },
}

/// A chain service call failed. Always retryable.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network or transport failure
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Chain tip request answered with a non-success status
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    /// Block submission was not accepted
    #[error("block rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// Response body could not be parsed
    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl ServiceError {
    /// Whether repeating the same request may succeed
    ///
    /// A 4xx rejection of a submitted block is final for that block.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Rejected { status, .. } => !(400..500).contains(status),
            _ => true,
        }
    }
}

/// Failure that ends the current mining attempt but not the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Scorer(#[from] ScorerError),
    /// A header presented as solved does not beat its difficulty
    #[error("header scores {score}, which does not exceed difficulty {difficulty}")]
    NotSolved { score: u64, difficulty: u64 },
}

/// Session-level failure.
#[derive(Debug, Error)]
pub enum MinerError {
    /// Service still failing after all retries
    #[error("chain service unavailable after {attempts} attempts: {source}")]
    Service {
        attempts: u32,
        #[source]
        source: ServiceError,
    },
    /// Wall clock could not produce a nanosecond timestamp
    #[error("system clock error: {0}")]
    Clock(String),
    /// The blocking search task panicked or was cancelled
    #[error("search worker failed: {0}")]
    Worker(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Scorer(#[from] ScorerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let unavailable = ServiceError::Status { url: "u".to_string(), status: 503 };
        let stale = ServiceError::Rejected { status: 400, body: "stale".to_string() };
        let crashed = ServiceError::Rejected { status: 500, body: String::new() };
        let garbled = ServiceError::Decode { url: "u".to_string(), reason: "eof".to_string() };
        assert!(unavailable.is_transient());
        assert!(!stale.is_transient());
        assert!(crashed.is_transient());
        assert!(garbled.is_transient());
    }

    #[test]
    fn test_messages() {
        let err = EncodingError::InvalidLength { field: "root", expected: 32, actual: 4 };
        assert_eq!(err.to_string(), "field root must be 32 bytes, got 4");

        let attempt: AttemptError = err.into();
        assert_eq!(attempt.to_string(), "field root must be 32 bytes, got 4");
    }
}
