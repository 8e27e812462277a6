//! Transfer core types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::ledger::EntryKind;

/// Transfer ID - ULID-based unique identifier
///
/// ULIDs are monotonic, sortable, and need no coordination between
/// instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    /// Generate a new unique TransferId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// What kind of movement this is. Bill pay is the same paired debit/credit
/// as a transfer; only the debit-side ledger category differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferKind {
    #[default]
    Transfer,
    BillPayment,
}

impl TransferKind {
    /// Ledger kind for the source-side (debit) entry
    pub fn debit_kind(&self) -> EntryKind {
        match self {
            TransferKind::Transfer => EntryKind::TransferOut,
            TransferKind::BillPayment => EntryKind::BillPayment,
        }
    }

    /// Ledger kind for the destination-side (credit) entry
    pub fn credit_kind(&self) -> EntryKind {
        EntryKind::TransferIn
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Transfer => "transfer",
            TransferKind::BillPayment => "bill_payment",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "transfer" => Some(TransferKind::Transfer),
            "bill_payment" => Some(TransferKind::BillPayment),
            _ => None,
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-facing command: amount still in decimal-string form.
///
/// The service resolves the source account's currency before scaling the
/// amount to minor units.
#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub from_account: i64,
    pub to_account: i64,
    /// Decimal string, e.g. "30.00"
    pub amount: String,
    pub description: String,
    pub recipient_label: String,
    /// Client-provided idempotency key
    pub idempotency_key: Option<String>,
    pub kind: TransferKind,
}

/// Validated transfer handed to the store's atomic unit
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from_account: i64,
    pub to_account: i64,
    /// Positive minor units
    pub amount: i64,
    pub description: String,
    pub recipient_label: String,
    pub idempotency_key: Option<String>,
    pub kind: TransferKind,
}

/// Result of a committed transfer
///
/// Balances are the post-commit values read under the same transaction that
/// wrote them.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub transfer_id: TransferId,
    pub from_account: i64,
    pub to_account: i64,
    pub amount: i64,
    pub currency: String,
    pub kind: TransferKind,
    pub from_balance: i64,
    pub to_balance: i64,
    pub debit_entry_id: i64,
    pub credit_entry_id: i64,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for TransferReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] {} -> {} amount={} {}",
            self.transfer_id, self.from_account, self.to_account, self.amount, self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_id_unique_and_parseable() {
        let id1 = TransferId::new();
        let id2 = TransferId::new();
        assert_ne!(id1, id2);

        let parsed: TransferId = id1.to_string().parse().unwrap();
        assert_eq!(parsed, id1);
        assert!("not-a-ulid!".parse::<TransferId>().is_err());
    }

    #[test]
    fn kind_ledger_mapping() {
        assert_eq!(
            TransferKind::Transfer.debit_kind(),
            EntryKind::TransferOut
        );
        assert_eq!(
            TransferKind::BillPayment.debit_kind(),
            EntryKind::BillPayment
        );
        assert_eq!(
            TransferKind::BillPayment.credit_kind(),
            EntryKind::TransferIn
        );
    }

    #[test]
    fn kind_name_roundtrip() {
        assert_eq!(TransferKind::from_name("transfer"), Some(TransferKind::Transfer));
        assert_eq!(
            TransferKind::from_name("bill_payment"),
            Some(TransferKind::BillPayment)
        );
        assert_eq!(TransferKind::from_name("wire"), None);
    }
}
