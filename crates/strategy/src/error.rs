use curvesim_core::{ErrorKind, StrategyKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyConfigError {
    #[error("Invalid {strategy} config: {reason}")]
    Invalid {
        strategy: StrategyKind,
        reason: String,
    },
}

impl StrategyConfigError {
    pub fn invalid(strategy: StrategyKind, reason: impl Into<String>) -> Self {
        StrategyConfigError::Invalid {
            strategy,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfiguration
    }
}

pub type StrategyConfigResult<T> = Result<T, StrategyConfigError>;

/// Fails with `reason` unless `ok`
pub(crate) fn ensure(
    ok: bool,
    strategy: StrategyKind,
    reason: &str,
) -> StrategyConfigResult<()> {
    if ok {
        Ok(())
    } else {
        Err(StrategyConfigError::invalid(strategy, reason))
    }
}
