//! Storage seam for the transfer orchestrator
//!
//! Everything that must be atomic lives behind `apply_transfer` /
//! `apply_deposit`: the store either commits the whole unit or leaves no
//! visible effect. Implementations: `PgTransferStore` (row locks inside a
//! PostgreSQL transaction) and `MemTransferStore` (single async mutex with
//! staged commit, plus fault injection for the property tests).

use async_trait::async_trait;

use super::error::TransferError;
use super::types::{TransferId, TransferReceipt, TransferRequest};
use crate::account::Account;
use crate::ledger::LedgerEntry;

#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &'static str;

    /// Look up a committed transfer by the caller's idempotency key
    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransferReceipt>, TransferError>;

    /// Look up a committed transfer by id
    async fn get_receipt(
        &self,
        transfer_id: TransferId,
    ) -> Result<Option<TransferReceipt>, TransferError>;

    /// The atomic unit: lock both accounts in ascending id order, re-check
    /// every precondition under the lock, write both balances with
    /// `version + 1`, insert the paired ledger entries, record the receipt.
    ///
    /// A request whose idempotency key already committed returns the
    /// original receipt without moving money again. Any failure leaves zero
    /// visible effect.
    async fn apply_transfer(
        &self,
        transfer_id: TransferId,
        req: &TransferRequest,
    ) -> Result<TransferReceipt, TransferError>;

    /// Single-account credit plus one `deposit` ledger entry, same
    /// all-or-nothing discipline.
    async fn apply_deposit(
        &self,
        account_id: i64,
        amount: i64,
        description: &str,
    ) -> Result<LedgerEntry, TransferError>;

    /// Account lookup (read-only; balance may be stale the moment it is
    /// returned and is never used as a write basis)
    async fn get_account(&self, account_id: i64) -> Result<Option<Account>, TransferError>;

    /// All accounts for an owner
    async fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>, TransferError>;

    /// Recent ledger entries for an account
    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, TransferError>;

    /// Store liveness probe for the health endpoint
    async fn ping(&self) -> Result<(), TransferError>;
}
