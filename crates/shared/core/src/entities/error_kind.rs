use serde::{Deserialize, Serialize};

/// Classification of every failure an agent can experience during a tick.
///
/// Per-tick kinds are counted in the agent's portfolio and surfaced in
/// run reports; `InvalidConfiguration` only occurs before the first tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Agent lacks the USDC or tokens the order needs; order skipped locally
    InsufficientBalance,
    /// Realized output fell below the order's minimum acceptable amount
    SlippageExceeded,
    /// Market is halted; every order for it is skipped this tick
    MarketHalted,
    /// Market state could not be read; retried next tick
    StateFetchFailure,
    /// Pool cannot pay out the sell
    InsufficientLiquidity,
    /// Order could not be delivered to the gateway
    SubmissionFailure,
    /// Rejected configuration (construction time only)
    InvalidConfiguration,
}

impl ErrorKind {
    /// Whether the failure came back from a submitted order (as opposed to
    /// being detected before submission).
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            ErrorKind::SlippageExceeded
                | ErrorKind::InsufficientLiquidity
                | ErrorKind::SubmissionFailure
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InsufficientBalance => "insufficient balance",
            ErrorKind::SlippageExceeded => "slippage exceeded",
            ErrorKind::MarketHalted => "market halted",
            ErrorKind::StateFetchFailure => "state fetch failure",
            ErrorKind::InsufficientLiquidity => "insufficient liquidity",
            ErrorKind::SubmissionFailure => "submission failure",
            ErrorKind::InvalidConfiguration => "invalid configuration",
        };
        f.write_str(name)
    }
}
