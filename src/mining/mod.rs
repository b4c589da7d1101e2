// Mining session control loop

mod retry;
mod session;

pub use retry::RetryPolicy;
pub use session::{CycleOutcome, MinerConfig, MiningSession, SessionStats};
