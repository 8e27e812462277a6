use thiserror::Error;

use crate::money::MoneyError;

/// Transfer failure taxonomy
///
/// The message strings for the domain variants are the ones callers display
/// verbatim in the dashboard's toast notifications.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Store fault with no committed effect. The operation may be retried
    /// with the same idempotency key.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Batched account lookup returned fewer than two rows
    #[error("Accounts not found")]
    AccountsNotFound,

    /// Identifiers did not map to two distinct usable accounts
    #[error("Invalid accounts")]
    InvalidAccounts,

    #[error("Source and destination currencies differ")]
    CurrencyMismatch,

    #[error("Account is not active")]
    AccountNotActive,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),
}

impl TransferError {
    /// Whether retrying the same request could succeed. Domain rejections
    /// are final; storage trouble is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransferError::Storage(_) | TransferError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_match_dashboard_toasts() {
        assert_eq!(TransferError::AccountsNotFound.to_string(), "Accounts not found");
        assert_eq!(TransferError::InvalidAccounts.to_string(), "Invalid accounts");
        assert_eq!(
            TransferError::InsufficientFunds.to_string(),
            "Insufficient funds"
        );
    }

    #[test]
    fn retryability() {
        assert!(TransferError::Unavailable("fault".into()).is_retryable());
        assert!(!TransferError::InsufficientFunds.is_retryable());
        assert!(!TransferError::AccountsNotFound.is_retryable());
    }
}
