//! Transfer orchestrator
//!
//! Validation and idempotency short-circuit in front of the store's atomic
//! unit. The service never writes balances itself; everything that must be
//! all-or-nothing happens inside `TransferStore::apply_transfer`.

use std::sync::Arc;

use tracing::{info, warn};

use super::error::TransferError;
use super::store::TransferStore;
use super::types::{TransferCommand, TransferId, TransferReceipt, TransferRequest};
use crate::ledger::LedgerEntry;
use crate::money;

pub struct TransferService {
    store: Arc<dyn TransferStore>,
}

impl TransferService {
    pub fn new(store: Arc<dyn TransferStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TransferStore> {
        &self.store
    }

    /// Execute a transfer
    ///
    /// The sufficient-funds check performed here-abouts is the store's, under
    /// its locks; the account read below only resolves the currency for
    /// amount scaling.
    pub async fn transfer(&self, cmd: TransferCommand) -> Result<TransferReceipt, TransferError> {
        if cmd.from_account == cmd.to_account {
            return Err(TransferError::InvalidAccounts);
        }

        // Idempotency short-circuit: a key that already committed returns
        // the original receipt and performs no writes. The store re-checks
        // under its own serialization for the racing-duplicate case.
        if let Some(key) = &cmd.idempotency_key
            && let Some(existing) = self.store.find_by_idempotency_key(key).await?
        {
            info!(
                transfer_id = %existing.transfer_id,
                idempotency_key = %key,
                "Idempotent replay; returning original receipt"
            );
            return Ok(existing);
        }

        let from = self
            .store
            .get_account(cmd.from_account)
            .await?
            .ok_or(TransferError::AccountsNotFound)?;
        let exponent = money::currency_exponent(&from.currency);
        let amount = money::parse_amount(&cmd.amount, exponent)?;

        let transfer_id = TransferId::new();
        let req = TransferRequest {
            from_account: cmd.from_account,
            to_account: cmd.to_account,
            amount,
            description: cmd.description,
            recipient_label: cmd.recipient_label,
            idempotency_key: cmd.idempotency_key,
            kind: cmd.kind,
        };

        match self.store.apply_transfer(transfer_id, &req).await {
            Ok(receipt) => {
                info!(
                    transfer_id = %receipt.transfer_id,
                    from = receipt.from_account,
                    to = receipt.to_account,
                    amount = receipt.amount,
                    currency = %receipt.currency,
                    kind = %receipt.kind,
                    "Transfer committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(
                    transfer_id = %transfer_id,
                    from = req.from_account,
                    to = req.to_account,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Transfer rejected"
                );
                Err(e)
            }
        }
    }

    /// Credit a single account (deposit flow)
    pub async fn deposit(
        &self,
        account_id: i64,
        amount: &str,
        description: &str,
    ) -> Result<LedgerEntry, TransferError> {
        let account = self
            .store
            .get_account(account_id)
            .await?
            .ok_or(TransferError::AccountsNotFound)?;
        let exponent = money::currency_exponent(&account.currency);
        let minor = money::parse_amount(amount, exponent)?;

        let entry = self.store.apply_deposit(account_id, minor, description).await?;
        info!(
            account = account_id,
            amount = minor,
            entry_id = entry.entry_id,
            "Deposit committed"
        );
        Ok(entry)
    }

    /// Receipt lookup by transfer id
    pub async fn get(
        &self,
        transfer_id: TransferId,
    ) -> Result<Option<TransferReceipt>, TransferError> {
        self.store.get_receipt(transfer_id).await
    }
}

#[cfg(all(test, feature = "mem-store"))]
mod tests {
    use super::*;
    use crate::transfer::memory::MemTransferStore;
    use crate::transfer::types::TransferKind;

    fn command(from: i64, to: i64, amount: &str) -> TransferCommand {
        TransferCommand {
            from_account: from,
            to_account: to,
            amount: amount.to_string(),
            description: "test".to_string(),
            recipient_label: String::new(),
            idempotency_key: None,
            kind: TransferKind::Transfer,
        }
    }

    async fn service_with_accounts() -> (TransferService, i64, i64) {
        let store = Arc::new(MemTransferStore::new());
        let a = store.open_account(10, "USD", 10_000).await;
        let b = store.open_account(11, "USD", 5_000).await;
        (TransferService::new(store), a, b)
    }

    #[tokio::test]
    async fn rejects_same_account() {
        let (service, a, _) = service_with_accounts().await;
        let result = service.transfer(command(a, a, "10.00")).await;
        assert!(matches!(result, Err(TransferError::InvalidAccounts)));
    }

    #[tokio::test]
    async fn rejects_unknown_source() {
        let (service, _, b) = service_with_accounts().await;
        let result = service.transfer(command(999, b, "10.00")).await;
        assert!(matches!(result, Err(TransferError::AccountsNotFound)));
    }

    #[tokio::test]
    async fn rejects_malformed_amount() {
        let (service, a, b) = service_with_accounts().await;
        for bad in ["0", "-5.00", ".5", "10.001", "abc"] {
            let result = service.transfer(command(a, b, bad)).await;
            assert!(
                matches!(result, Err(TransferError::InvalidAmount(_))),
                "should reject amount {:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn moves_money_and_reports_balances() {
        let (service, a, b) = service_with_accounts().await;
        let receipt = service.transfer(command(a, b, "30.00")).await.unwrap();
        assert_eq!(receipt.amount, 3_000);
        assert_eq!(receipt.from_balance, 7_000);
        assert_eq!(receipt.to_balance, 8_000);
        assert_eq!(receipt.currency, "USD");
    }

    #[tokio::test]
    async fn idempotency_short_circuits_before_any_write() {
        let (service, a, b) = service_with_accounts().await;

        let mut cmd = command(a, b, "30.00");
        cmd.idempotency_key = Some("key-1".to_string());
        let first = service.transfer(cmd.clone()).await.unwrap();

        // Same key, different amount: the original receipt wins and no
        // second movement happens.
        cmd.amount = "99.00".to_string();
        let replay = service.transfer(cmd).await.unwrap();
        assert_eq!(replay.transfer_id, first.transfer_id);
        assert_eq!(replay.amount, 3_000);

        let from = service.store().get_account(a).await.unwrap().unwrap();
        assert_eq!(from.balance, 7_000);
    }

    #[tokio::test]
    async fn deposit_credits_and_records_entry() {
        let (service, a, _) = service_with_accounts().await;
        let entry = service.deposit(a, "12.34", "payroll").await.unwrap();
        assert_eq!(entry.amount, 1_234);

        let account = service.store().get_account(a).await.unwrap().unwrap();
        assert_eq!(account.balance, 11_234);
    }
}
