use curvesim_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("Invalid curve parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Insufficient supply: requested {requested}, available {available}")]
    InsufficientSupply { requested: f64, available: f64 },

    #[error("Invalid slippage: {0} bps")]
    InvalidSlippage(u32),
}

impl CurveError {
    /// Domain error kind reported for this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            CurveError::InvalidParameters(_) | CurveError::InvalidSlippage(_) => {
                ErrorKind::InvalidConfiguration
            }
            CurveError::InvalidAmount(_) | CurveError::InsufficientSupply { .. } => {
                ErrorKind::InsufficientBalance
            }
        }
    }
}

pub type CurveResult<T> = Result<T, CurveError>;
