//! Ledger entries
//!
//! Insert-only records of signed monetary movements. A committed transfer
//! always writes exactly two rows (debit + credit) that sum to zero; a
//! deposit writes one. No update or reversal path exists.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use std::fmt;
use std::str::FromStr;

/// Ledger entry kind, stored as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    TransferOut,
    TransferIn,
    Deposit,
    BillPayment,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::TransferOut => "transfer_out",
            EntryKind::TransferIn => "transfer_in",
            EntryKind::Deposit => "deposit",
            EntryKind::BillPayment => "bill_payment",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer_out" => Ok(EntryKind::TransferOut),
            "transfer_in" => Ok(EntryKind::TransferIn),
            "deposit" => Ok(EntryKind::Deposit),
            "bill_payment" => Ok(EntryKind::BillPayment),
            _ => Err(()),
        }
    }
}

/// One signed movement against one account. Immutable once created.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub entry_id: i64,
    pub account_id: i64,
    /// Signed minor units: negative for debits, positive for credits
    pub amount: i64,
    pub kind: EntryKind,
    pub description: String,
    pub counterparty: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Read-side queries over the ledger
pub struct LedgerQueries;

impl LedgerQueries {
    /// Most recent entries for an account
    pub async fn list_for_account(
        pool: &PgPool,
        account_id: i64,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT entry_id, account_id, amount, kind, description, counterparty, status, created_at \
             FROM ledger_entries_tb WHERE account_id = $1 \
             ORDER BY created_at DESC, entry_id DESC LIMIT $2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows.iter().map(row_to_entry).collect())
    }
}

pub(crate) fn row_to_entry(r: &sqlx::postgres::PgRow) -> LedgerEntry {
    let kind_str: String = r.get("kind");
    LedgerEntry {
        entry_id: r.get("entry_id"),
        account_id: r.get("account_id"),
        amount: r.get("amount"),
        // Rows are only written by this crate; an unknown kind means schema
        // drift and is surfaced loudly in logs rather than dropped.
        kind: kind_str.parse().unwrap_or_else(|_| {
            tracing::error!(kind = %kind_str, "Unknown ledger entry kind in store");
            EntryKind::Deposit
        }),
        description: r.get("description"),
        counterparty: r.get("counterparty"),
        status: r.get("status"),
        created_at: r.get("created_at"),
    }
}
