mod curve;
mod error_kind;
mod market;
mod order;
mod portfolio;
mod price_history;
mod side;
mod strategy_kind;

pub use curve::CurveParameters;
pub use error_kind::ErrorKind;
pub use market::MarketStateSnapshot;
pub use order::{BoundedOrder, ExecutionResult, OrderIntent};
pub use portfolio::{Balances, LastTrade, PortfolioState, Position};
pub use price_history::PriceHistory;
pub use side::{OrderSide, Team};
pub use strategy_kind::StrategyKind;
