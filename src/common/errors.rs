//! Error types for the simulator

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using our SimError
pub type Result<T> = std::result::Result<T, SimError>;

/// Main error type for ledger, registry and simulation operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// A buy asked for more value than the ledger holds in cash
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    /// A sell asked for more volume than held (or the position is absent)
    #[error("Insufficient position in {symbol}: requested {requested}, held {held}")]
    InsufficientPosition {
        symbol: String,
        requested: u64,
        held: u64,
    },

    /// Trade quantity must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u64),

    /// Trade price must be non-negative
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    /// Crediting or debiting the cash balance would overflow
    #[error("Cash balance overflow: cash {cash}, amount {amount}")]
    CashOverflow { cash: Decimal, amount: Decimal },

    /// Symbol is not in the instrument registry
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Symbol seeded more than once
    #[error("Duplicate instrument: {0}")]
    DuplicateInstrument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SimError {
    /// Whether the agent loop should skip this outcome rather than abort
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SimError::InsufficientFunds { .. }
                | SimError::InsufficientPosition { .. }
                | SimError::InvalidQuantity(_)
                | SimError::InvalidPrice(_)
                | SimError::CashOverflow { .. }
                | SimError::UnknownInstrument(_)
        )
    }
}

impl From<config::ConfigError> for SimError {
    fn from(err: config::ConfigError) -> Self {
        SimError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rejections_are_recoverable() {
        let funds = SimError::InsufficientFunds {
            required: dec!(150),
            available: dec!(100),
        };
        assert!(funds.is_rejection());
        assert_eq!(
            funds.to_string(),
            "Insufficient funds: required 150, available 100"
        );

        assert!(SimError::CashOverflow {
            cash: dec!(1),
            amount: dec!(2)
        }
        .is_rejection());
        assert!(!SimError::Configuration("bad".into()).is_rejection());
        assert!(!SimError::Internal("boom".into()).is_rejection());
    }
}
