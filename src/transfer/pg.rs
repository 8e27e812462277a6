//! PostgreSQL transfer store
//!
//! The atomic unit is one database transaction. Both account rows are locked
//! with `SELECT ... FOR UPDATE` in ascending account_id order (two transfers
//! touching the same pair in opposite directions cannot deadlock), every
//! precondition is re-checked under those locks, and the balance writes bump
//! the row version. The receipt insert carries the unique idempotency key,
//! so two racing submissions of the same key serialize on the constraint and
//! the loser returns the winner's receipt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};

use super::error::TransferError;
use super::store::TransferStore;
use super::types::{TransferId, TransferKind, TransferReceipt, TransferRequest};
use crate::account::repository::row_to_account;
use crate::account::{Account, AccountRepository};
use crate::ledger::{EntryKind, LedgerEntry, LedgerQueries};

pub struct PgTransferStore {
    pool: PgPool,
}

impl PgTransferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock one account row. Callers must lock in ascending id order.
    async fn lock_account(
        tx: &mut Transaction<'_, Postgres>,
        account_id: i64,
    ) -> Result<Option<Account>, TransferError> {
        let row = sqlx::query(
            "SELECT account_id, owner_id, currency, balance, version, status, created_at \
             FROM accounts_tb WHERE account_id = $1 FOR UPDATE",
        )
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.as_ref().map(row_to_account))
    }

    /// Debit or credit a locked row. `delta` is signed minor units.
    async fn write_balance(
        tx: &mut Transaction<'_, Postgres>,
        account_id: i64,
        delta: i64,
    ) -> Result<i64, TransferError> {
        let row = sqlx::query(
            "UPDATE accounts_tb SET balance = balance + $1, version = version + 1 \
             WHERE account_id = $2 RETURNING balance",
        )
        .bind(delta)
        .bind(account_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.get("balance"))
    }

    async fn insert_entry(
        tx: &mut Transaction<'_, Postgres>,
        account_id: i64,
        amount: i64,
        kind: EntryKind,
        description: &str,
        counterparty: &str,
    ) -> Result<(i64, DateTime<Utc>), TransferError> {
        let row = sqlx::query(
            "INSERT INTO ledger_entries_tb (account_id, amount, kind, description, counterparty) \
             VALUES ($1, $2, $3, $4, $5) RETURNING entry_id, created_at",
        )
        .bind(account_id)
        .bind(amount)
        .bind(kind.as_str())
        .bind(description)
        .bind(counterparty)
        .fetch_one(&mut **tx)
        .await?;

        Ok((row.get("entry_id"), row.get("created_at")))
    }

    fn row_to_receipt(row: &sqlx::postgres::PgRow) -> Result<TransferReceipt, TransferError> {
        let transfer_id_str: String = row.get("transfer_id");
        let transfer_id: TransferId = transfer_id_str
            .parse()
            .map_err(|_| TransferError::Unavailable("Invalid transfer_id format in store".into()))?;

        let kind_str: String = row.get("kind");
        let kind = TransferKind::from_name(&kind_str).ok_or_else(|| {
            TransferError::Unavailable(format!("Unknown transfer kind in store: {}", kind_str))
        })?;

        Ok(TransferReceipt {
            transfer_id,
            from_account: row.get("from_account"),
            to_account: row.get("to_account"),
            amount: row.get("amount"),
            currency: row.get("currency"),
            kind,
            from_balance: row.get("from_balance"),
            to_balance: row.get("to_balance"),
            debit_entry_id: row.get("debit_entry_id"),
            credit_entry_id: row.get("credit_entry_id"),
            created_at: row.get("created_at"),
        })
    }
}

const RECEIPT_COLUMNS: &str = "transfer_id, idempotency_key, from_account, to_account, amount, \
                               currency, kind, from_balance, to_balance, debit_entry_id, \
                               credit_entry_id, created_at";

#[async_trait]
impl TransferStore for PgTransferStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<TransferReceipt>, TransferError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transfer_receipts_tb WHERE idempotency_key = $1",
            RECEIPT_COLUMNS
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_receipt).transpose()
    }

    async fn get_receipt(
        &self,
        transfer_id: TransferId,
    ) -> Result<Option<TransferReceipt>, TransferError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transfer_receipts_tb WHERE transfer_id = $1",
            RECEIPT_COLUMNS
        ))
        .bind(transfer_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_receipt).transpose()
    }

    async fn apply_transfer(
        &self,
        transfer_id: TransferId,
        req: &TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        if req.from_account == req.to_account {
            return Err(TransferError::InvalidAccounts);
        }

        let mut tx = self.pool.begin().await?;

        // Deterministic lock order: ascending account_id
        let (lo, hi) = if req.from_account < req.to_account {
            (req.from_account, req.to_account)
        } else {
            (req.to_account, req.from_account)
        };
        let lo_row = Self::lock_account(&mut tx, lo).await?;
        let hi_row = Self::lock_account(&mut tx, hi).await?;

        let (from, to) = match (lo_row, hi_row) {
            (Some(a), Some(b)) => {
                if a.account_id == req.from_account {
                    (a, b)
                } else {
                    (b, a)
                }
            }
            _ => return Err(TransferError::AccountsNotFound),
        };

        if !from.is_usable() || !to.is_usable() {
            return Err(TransferError::AccountNotActive);
        }
        if from.currency != to.currency {
            return Err(TransferError::CurrencyMismatch);
        }
        // Funds check happens HERE, on the balance read under the row lock.
        // Any balance read before this transaction opened is advisory only.
        if from.balance < req.amount {
            return Err(TransferError::InsufficientFunds);
        }

        let from_balance = Self::write_balance(&mut tx, from.account_id, -req.amount).await?;
        let to_balance = Self::write_balance(&mut tx, to.account_id, req.amount).await?;

        let (debit_entry_id, _) = Self::insert_entry(
            &mut tx,
            from.account_id,
            -req.amount,
            req.kind.debit_kind(),
            &req.description,
            &req.recipient_label,
        )
        .await?;
        let (credit_entry_id, _) = Self::insert_entry(
            &mut tx,
            to.account_id,
            req.amount,
            req.kind.credit_kind(),
            &req.description,
            &format!("account {}", from.account_id),
        )
        .await?;

        // Receipt insert is the idempotency commit point. ON CONFLICT means
        // another transaction already committed this key; yield to it.
        let inserted = sqlx::query(
            "INSERT INTO transfer_receipts_tb \
               (transfer_id, idempotency_key, from_account, to_account, amount, currency, kind, \
                from_balance, to_balance, debit_entry_id, credit_entry_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (idempotency_key) DO NOTHING \
             RETURNING created_at",
        )
        .bind(transfer_id.to_string())
        .bind(&req.idempotency_key)
        .bind(from.account_id)
        .bind(to.account_id)
        .bind(req.amount)
        .bind(&from.currency)
        .bind(req.kind.as_str())
        .bind(from_balance)
        .bind(to_balance)
        .bind(debit_entry_id)
        .bind(credit_entry_id)
        .fetch_optional(&mut *tx)
        .await?;

        let created_at = match inserted {
            Some(row) => row.get("created_at"),
            None => {
                // Lost the idempotency race: discard our writes, return the
                // winner's receipt.
                tx.rollback().await?;
                let key = req
                    .idempotency_key
                    .as_deref()
                    .unwrap_or_default();
                info!(
                    transfer_id = %transfer_id,
                    idempotency_key = %key,
                    "Duplicate idempotency key committed concurrently; returning original receipt"
                );
                return self
                    .find_by_idempotency_key(key)
                    .await?
                    .ok_or_else(|| TransferError::TransferNotFound(key.to_string()));
            }
        };

        tx.commit().await?;

        debug!(
            transfer_id = %transfer_id,
            from = from.account_id,
            to = to.account_id,
            amount = req.amount,
            "Transfer committed"
        );

        Ok(TransferReceipt {
            transfer_id,
            from_account: from.account_id,
            to_account: to.account_id,
            amount: req.amount,
            currency: from.currency,
            kind: req.kind,
            from_balance,
            to_balance,
            debit_entry_id,
            credit_entry_id,
            created_at,
        })
    }

    async fn apply_deposit(
        &self,
        account_id: i64,
        amount: i64,
        description: &str,
    ) -> Result<LedgerEntry, TransferError> {
        let mut tx = self.pool.begin().await?;

        let account = Self::lock_account(&mut tx, account_id)
            .await?
            .ok_or(TransferError::AccountsNotFound)?;
        if !account.is_usable() {
            return Err(TransferError::AccountNotActive);
        }

        Self::write_balance(&mut tx, account_id, amount).await?;
        let (entry_id, created_at) = Self::insert_entry(
            &mut tx,
            account_id,
            amount,
            EntryKind::Deposit,
            description,
            "",
        )
        .await?;

        tx.commit().await?;

        Ok(LedgerEntry {
            entry_id,
            account_id,
            amount,
            kind: EntryKind::Deposit,
            description: description.to_string(),
            counterparty: String::new(),
            status: "completed".to_string(),
            created_at,
        })
    }

    async fn get_account(&self, account_id: i64) -> Result<Option<Account>, TransferError> {
        Ok(AccountRepository::get_by_id(&self.pool, account_id).await?)
    }

    async fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>, TransferError> {
        Ok(AccountRepository::list_for_owner(&self.pool, owner_id).await?)
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, TransferError> {
        Ok(LedgerQueries::list_for_account(&self.pool, account_id, limit).await?)
    }

    async fn ping(&self) -> Result<(), TransferError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
