//! In-memory transfer store
//!
//! Backs the property test suite and database-less development. One async
//! mutex guards the whole ledger state and is held across the atomic unit,
//! so concurrent transfers serialize exactly like row-locked transactions.
//! All writes are staged and applied only at the commit point; an injected
//! fault anywhere before that leaves zero visible effect, which is the
//! contract the tests verify.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use super::error::TransferError;
use super::store::TransferStore;
use super::types::{TransferId, TransferReceipt, TransferRequest};
use crate::account::{Account, AccountStatus};
use crate::ledger::{EntryKind, LedgerEntry};

/// Where in the write sequence the next operation should fail.
///
/// All points sit after the source debit has been decided, which is what
/// makes them interesting: a store without staged commit would leave a
/// half-applied transfer behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Fail the destination balance write
    CreditWrite,
    /// Fail the source-side ledger insert
    DebitLedgerInsert,
    /// Fail the destination-side ledger insert
    CreditLedgerInsert,
    /// Fail at the final commit
    Commit,
}

impl FailPoint {
    fn label(&self) -> &'static str {
        match self {
            FailPoint::CreditWrite => "credit write",
            FailPoint::DebitLedgerInsert => "debit ledger insert",
            FailPoint::CreditLedgerInsert => "credit ledger insert",
            FailPoint::Commit => "commit",
        }
    }
}

#[derive(Default)]
struct MemState {
    accounts: HashMap<i64, Account>,
    entries: Vec<LedgerEntry>,
    receipts: HashMap<String, TransferReceipt>,
    by_idempotency_key: HashMap<String, String>,
    next_account_id: i64,
    next_entry_id: i64,
}

pub struct MemTransferStore {
    state: Mutex<MemState>,
    /// One-shot injected fault, armed by tests
    fail_point: StdMutex<Option<FailPoint>>,
}

impl MemTransferStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemState {
                next_account_id: 1,
                next_entry_id: 1,
                ..Default::default()
            }),
            fail_point: StdMutex::new(None),
        }
    }

    /// Arm a one-shot fault at the given point in the write sequence
    pub fn arm_fail_point(&self, fp: FailPoint) {
        *self.fail_point.lock().unwrap() = Some(fp);
    }

    fn take_fail_point(&self) -> Option<FailPoint> {
        self.fail_point.lock().unwrap().take()
    }

    /// Seed an account; returns its id
    pub async fn open_account(&self, owner_id: i64, currency: &str, balance: i64) -> i64 {
        let mut state = self.state.lock().await;
        let account_id = state.next_account_id;
        state.next_account_id += 1;
        state.accounts.insert(
            account_id,
            Account {
                account_id,
                owner_id,
                currency: currency.to_string(),
                balance,
                version: 1,
                status: AccountStatus::Active,
                created_at: Utc::now(),
            },
        );
        account_id
    }

    /// Freeze an account (test helper)
    pub async fn freeze_account(&self, account_id: i64) {
        let mut state = self.state.lock().await;
        if let Some(account) = state.accounts.get_mut(&account_id) {
            account.status = AccountStatus::Frozen;
        }
    }

    /// Total number of ledger entries across all accounts
    pub async fn entry_count(&self) -> usize {
        self.state.lock().await.entries.len()
    }
}

impl Default for MemTransferStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferStore for MemTransferStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransferReceipt>, TransferError> {
        let state = self.state.lock().await;
        Ok(state
            .by_idempotency_key
            .get(key)
            .and_then(|id| state.receipts.get(id))
            .cloned())
    }

    async fn get_receipt(
        &self,
        transfer_id: TransferId,
    ) -> Result<Option<TransferReceipt>, TransferError> {
        let state = self.state.lock().await;
        Ok(state.receipts.get(&transfer_id.to_string()).cloned())
    }

    async fn apply_transfer(
        &self,
        transfer_id: TransferId,
        req: &TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        if req.from_account == req.to_account {
            return Err(TransferError::InvalidAccounts);
        }

        // Lock held across the whole unit: validation, staging, commit.
        let mut state = self.state.lock().await;

        // Idempotency commit point, same as the receipt-row constraint in
        // the Postgres store.
        if let Some(key) = &req.idempotency_key
            && let Some(existing_id) = state.by_idempotency_key.get(key)
        {
            let receipt = state.receipts[existing_id].clone();
            info!(
                transfer_id = %receipt.transfer_id,
                idempotency_key = %key,
                "Duplicate idempotency key; returning original receipt"
            );
            return Ok(receipt);
        }

        let from = state
            .accounts
            .get(&req.from_account)
            .cloned()
            .ok_or(TransferError::AccountsNotFound)?;
        let to = state
            .accounts
            .get(&req.to_account)
            .cloned()
            .ok_or(TransferError::AccountsNotFound)?;

        if !from.is_usable() || !to.is_usable() {
            return Err(TransferError::AccountNotActive);
        }
        if from.currency != to.currency {
            return Err(TransferError::CurrencyMismatch);
        }
        if from.balance < req.amount {
            return Err(TransferError::InsufficientFunds);
        }

        // Everything below is staged; the state mutates only after the last
        // fault check passes.
        if let Some(fp) = self.take_fail_point() {
            return Err(TransferError::Unavailable(format!(
                "injected fault: {}",
                fp.label()
            )));
        }

        let now = Utc::now();
        let from_balance = from.balance - req.amount;
        // The debit cannot underflow (balance >= amount was just checked);
        // the credit can still overflow a near-max destination balance.
        let to_balance = to
            .balance
            .checked_add(req.amount)
            .ok_or_else(|| TransferError::Unavailable("destination balance overflow".into()))?;

        let debit_entry_id = state.next_entry_id;
        let credit_entry_id = state.next_entry_id + 1;
        state.next_entry_id += 2;

        let debit = LedgerEntry {
            entry_id: debit_entry_id,
            account_id: from.account_id,
            amount: -req.amount,
            kind: req.kind.debit_kind(),
            description: req.description.clone(),
            counterparty: req.recipient_label.clone(),
            status: "completed".to_string(),
            created_at: now,
        };
        let credit = LedgerEntry {
            entry_id: credit_entry_id,
            account_id: to.account_id,
            amount: req.amount,
            kind: req.kind.credit_kind(),
            description: req.description.clone(),
            counterparty: format!("account {}", from.account_id),
            status: "completed".to_string(),
            created_at: now,
        };

        let receipt = TransferReceipt {
            transfer_id,
            from_account: from.account_id,
            to_account: to.account_id,
            amount: req.amount,
            currency: from.currency.clone(),
            kind: req.kind,
            from_balance,
            to_balance,
            debit_entry_id,
            credit_entry_id,
            created_at: now,
        };

        // Commit
        {
            let from_account = state
                .accounts
                .get_mut(&req.from_account)
                .ok_or(TransferError::AccountsNotFound)?;
            from_account.balance = from_balance;
            from_account.version += 1;
        }
        {
            let to_account = state
                .accounts
                .get_mut(&req.to_account)
                .ok_or(TransferError::AccountsNotFound)?;
            to_account.balance = to_balance;
            to_account.version += 1;
        }
        state.entries.push(debit);
        state.entries.push(credit);
        if let Some(key) = &req.idempotency_key {
            state
                .by_idempotency_key
                .insert(key.clone(), transfer_id.to_string());
        }
        state
            .receipts
            .insert(transfer_id.to_string(), receipt.clone());

        Ok(receipt)
    }

    async fn apply_deposit(
        &self,
        account_id: i64,
        amount: i64,
        description: &str,
    ) -> Result<LedgerEntry, TransferError> {
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(TransferError::AccountsNotFound)?;
        if !account.is_usable() {
            return Err(TransferError::AccountNotActive);
        }

        if let Some(fp) = self.take_fail_point() {
            return Err(TransferError::Unavailable(format!(
                "injected fault: {}",
                fp.label()
            )));
        }

        let new_balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Unavailable("account balance overflow".into()))?;

        let entry_id = state.next_entry_id;
        state.next_entry_id += 1;

        let entry = LedgerEntry {
            entry_id,
            account_id,
            amount,
            kind: EntryKind::Deposit,
            description: description.to_string(),
            counterparty: String::new(),
            status: "completed".to_string(),
            created_at: Utc::now(),
        };

        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or(TransferError::AccountsNotFound)?;
        account.balance = new_balance;
        account.version += 1;
        state.entries.push(entry.clone());

        Ok(entry)
    }

    async fn get_account(&self, account_id: i64) -> Result<Option<Account>, TransferError> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>, TransferError> {
        let state = self.state.lock().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.account_id);
        Ok(accounts)
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, TransferError> {
        let state = self.state.lock().await;
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.entry_id.cmp(&a.entry_id));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }

    async fn ping(&self) -> Result<(), TransferError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_accounts_are_visible() {
        let store = MemTransferStore::new();
        let a = store.open_account(10, "USD", 10_000).await;
        let b = store.open_account(10, "USD", 5_000).await;
        assert_ne!(a, b);

        let accounts = store.list_accounts(10).await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].balance, 10_000);
    }

    #[tokio::test]
    async fn fail_point_is_one_shot() {
        let store = MemTransferStore::new();
        let a = store.open_account(10, "USD", 10_000).await;
        let b = store.open_account(11, "USD", 0).await;

        store.arm_fail_point(FailPoint::Commit);

        let req = TransferRequest {
            from_account: a,
            to_account: b,
            amount: 1_000,
            description: String::new(),
            recipient_label: String::new(),
            idempotency_key: None,
            kind: Default::default(),
        };

        let err = store
            .apply_transfer(TransferId::new(), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Unavailable(_)));

        // Fault consumed; retry succeeds
        let receipt = store.apply_transfer(TransferId::new(), &req).await.unwrap();
        assert_eq!(receipt.from_balance, 9_000);
    }

    #[tokio::test]
    async fn credit_overflow_rejected_with_zero_effect() {
        let store = MemTransferStore::new();
        let a = store.open_account(10, "USD", 10_000).await;
        let b = store.open_account(11, "USD", i64::MAX - 500).await;

        let req = TransferRequest {
            from_account: a,
            to_account: b,
            amount: 1_000,
            description: String::new(),
            recipient_label: String::new(),
            idempotency_key: None,
            kind: Default::default(),
        };

        let err = store
            .apply_transfer(TransferId::new(), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Unavailable(_)));

        // Neither side moved, no ledger rows
        assert_eq!(store.get_account(a).await.unwrap().unwrap().balance, 10_000);
        assert_eq!(
            store.get_account(b).await.unwrap().unwrap().balance,
            i64::MAX - 500
        );
        assert_eq!(store.entry_count().await, 0);

        let err = store.apply_deposit(b, 1_000, "top-up").await.unwrap_err();
        assert!(matches!(err, TransferError::Unavailable(_)));
        assert_eq!(store.entry_count().await, 0);
    }
}
