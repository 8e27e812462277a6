//! Transfer consistency properties
//!
//! The guarantees the orchestrator exists to provide, driven through the
//! in-memory store so the suite runs without a database: conservation,
//! non-negativity, atomicity under injected faults, concurrency safety,
//! idempotent retry and ledger pairing.

#![cfg(feature = "mem-store")]

use std::sync::Arc;

use ledgercore::ledger::EntryKind;
use ledgercore::transfer::{
    FailPoint, MemTransferStore, TransferCommand, TransferError, TransferId, TransferKind,
    TransferRequest, TransferService, TransferStore,
};

fn command(from: i64, to: i64, amount: &str) -> TransferCommand {
    TransferCommand {
        from_account: from,
        to_account: to,
        amount: amount.to_string(),
        description: "rent".to_string(),
        recipient_label: "Landlord".to_string(),
        idempotency_key: None,
        kind: TransferKind::Transfer,
    }
}

/// A=100.00, B=50.00 in USD
async fn seeded() -> (Arc<MemTransferStore>, TransferService, i64, i64) {
    let store = Arc::new(MemTransferStore::new());
    let a = store.open_account(1, "USD", 10_000).await;
    let b = store.open_account(2, "USD", 5_000).await;
    let service = TransferService::new(store.clone());
    (store, service, a, b)
}

#[tokio::test]
async fn conservation_across_the_pair() {
    let (store, service, a, b) = seeded().await;

    service.transfer(command(a, b, "30.00")).await.unwrap();
    service.transfer(command(b, a, "12.34")).await.unwrap();

    let bal_a = store.get_account(a).await.unwrap().unwrap().balance;
    let bal_b = store.get_account(b).await.unwrap().unwrap().balance;
    assert_eq!(bal_a + bal_b, 15_000);
}

#[tokio::test]
async fn overdraw_rejected_with_zero_effect() {
    let (store, service, a, b) = seeded().await;

    let err = service.transfer(command(a, b, "100.01")).await.unwrap_err();
    assert!(matches!(err, TransferError::InsufficientFunds));

    assert_eq!(store.get_account(a).await.unwrap().unwrap().balance, 10_000);
    assert_eq!(store.get_account(b).await.unwrap().unwrap().balance, 5_000);
    assert_eq!(store.entry_count().await, 0);
}

#[tokio::test]
async fn injected_fault_leaves_no_partial_effect() {
    let (store, service, a, b) = seeded().await;

    for fp in [
        FailPoint::CreditWrite,
        FailPoint::DebitLedgerInsert,
        FailPoint::CreditLedgerInsert,
        FailPoint::Commit,
    ] {
        store.arm_fail_point(fp);
        let err = service.transfer(command(a, b, "30.00")).await.unwrap_err();
        assert!(matches!(err, TransferError::Unavailable(_)), "{:?}", fp);
        assert!(err.is_retryable());

        // Source balance untouched, no orphaned ledger rows
        assert_eq!(
            store.get_account(a).await.unwrap().unwrap().balance,
            10_000,
            "partial debit survived fault at {:?}",
            fp
        );
        assert_eq!(
            store.get_account(b).await.unwrap().unwrap().balance,
            5_000
        );
        assert_eq!(store.entry_count().await, 0, "orphaned entries at {:?}", fp);
    }

    // Nothing about the faults poisoned the accounts; a clean retry commits.
    let receipt = service.transfer(command(a, b, "30.00")).await.unwrap();
    assert_eq!(receipt.from_balance, 7_000);
}

#[tokio::test]
async fn fault_then_retry_with_same_key_moves_money_once() {
    let (store, service, a, b) = seeded().await;

    let mut cmd = command(a, b, "30.00");
    cmd.idempotency_key = Some("retry-1".to_string());

    store.arm_fail_point(FailPoint::Commit);
    let err = service.transfer(cmd.clone()).await.unwrap_err();
    assert!(err.is_retryable());

    // Client retries with the same key; the first attempt committed nothing,
    // so this is the real transfer.
    let receipt = service.transfer(cmd.clone()).await.unwrap();
    assert_eq!(receipt.from_balance, 7_000);

    // And a third submission is a pure replay.
    let replay = service.transfer(cmd).await.unwrap();
    assert_eq!(replay.transfer_id, receipt.transfer_id);
    assert_eq!(store.get_account(a).await.unwrap().unwrap().balance, 7_000);
    assert_eq!(store.entry_count().await, 2);
}

#[tokio::test]
async fn concurrent_overdraw_commits_exactly_one() {
    let (store, service, a, b) = seeded().await;
    let service = Arc::new(service);

    // Each individually valid against 100.00; jointly they overdraw.
    let t1 = tokio::spawn({
        let service = service.clone();
        let cmd = command(a, b, "60.00");
        async move { service.transfer(cmd).await }
    });
    let t2 = tokio::spawn({
        let service = service.clone();
        let cmd = command(a, b, "70.00");
        async move { service.transfer(cmd).await }
    });

    let (r1, r2) = (t1.await.unwrap(), t2.await.unwrap());
    let ok_count = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1, "exactly one concurrent transfer may commit");

    let loser = if r1.is_err() { r1 } else { r2 };
    assert!(matches!(
        loser.unwrap_err(),
        TransferError::InsufficientFunds
    ));

    // Conservation still holds and the loser left nothing behind.
    let bal_a = store.get_account(a).await.unwrap().unwrap().balance;
    let bal_b = store.get_account(b).await.unwrap().unwrap().balance;
    assert_eq!(bal_a + bal_b, 15_000);
    assert_eq!(store.entry_count().await, 2);
    assert!(bal_a == 4_000 || bal_a == 3_000);
}

#[tokio::test]
async fn concurrent_duplicate_key_moves_money_once() {
    let (store, service, a, b) = seeded().await;
    let service = Arc::new(service);

    let mut cmd = command(a, b, "30.00");
    cmd.idempotency_key = Some("dup-race".to_string());

    let t1 = tokio::spawn({
        let service = service.clone();
        let cmd = cmd.clone();
        async move { service.transfer(cmd).await }
    });
    let t2 = tokio::spawn({
        let service = service.clone();
        let cmd = cmd.clone();
        async move { service.transfer(cmd).await }
    });

    let r1 = t1.await.unwrap().unwrap();
    let r2 = t2.await.unwrap().unwrap();
    assert_eq!(r1.transfer_id, r2.transfer_id);

    assert_eq!(store.get_account(a).await.unwrap().unwrap().balance, 7_000);
    assert_eq!(store.entry_count().await, 2);
}

#[tokio::test]
async fn ledger_pairing_and_attribution() {
    let (store, service, a, b) = seeded().await;

    let receipt = service.transfer(command(a, b, "30.00")).await.unwrap();

    let debits = store.list_entries(a, 10).await.unwrap();
    let credits = store.list_entries(b, 10).await.unwrap();
    assert_eq!(debits.len(), 1);
    assert_eq!(credits.len(), 1);

    let debit = &debits[0];
    let credit = &credits[0];
    assert_eq!(debit.entry_id, receipt.debit_entry_id);
    assert_eq!(credit.entry_id, receipt.credit_entry_id);
    assert_eq!(debit.amount, -3_000);
    assert_eq!(credit.amount, 3_000);
    assert_eq!(debit.amount + credit.amount, 0);
    assert_eq!(debit.kind, EntryKind::TransferOut);
    assert_eq!(credit.kind, EntryKind::TransferIn);
    assert_eq!(debit.counterparty, "Landlord");
    assert_eq!(debit.status, "completed");
}

#[tokio::test]
async fn bill_payment_uses_bill_category_on_debit_side() {
    let (store, service, a, b) = seeded().await;

    let mut cmd = command(a, b, "45.00");
    cmd.kind = TransferKind::BillPayment;
    service.transfer(cmd).await.unwrap();

    let debit = &store.list_entries(a, 10).await.unwrap()[0];
    let credit = &store.list_entries(b, 10).await.unwrap()[0];
    assert_eq!(debit.kind, EntryKind::BillPayment);
    assert_eq!(credit.kind, EntryKind::TransferIn);
}

#[tokio::test]
async fn currency_mismatch_and_frozen_account_rejected() {
    let store = Arc::new(MemTransferStore::new());
    let usd = store.open_account(1, "USD", 10_000).await;
    let eur = store.open_account(2, "EUR", 10_000).await;
    let service = TransferService::new(store.clone());

    let err = service.transfer(command(usd, eur, "10.00")).await.unwrap_err();
    assert!(matches!(err, TransferError::CurrencyMismatch));

    let usd2 = store.open_account(3, "USD", 10_000).await;
    store.freeze_account(usd2).await;
    let err = service.transfer(command(usd, usd2, "10.00")).await.unwrap_err();
    assert!(matches!(err, TransferError::AccountNotActive));
    assert_eq!(store.entry_count().await, 0);
}

#[tokio::test]
async fn dashboard_scenario_end_to_end() {
    // A starts at 100.00, B at 50.00. transfer(A, B, 30.00) yields A=70.00,
    // B=80.00 with a (-30.00 out, +30.00 in) pair; a follow-up 80.00 fails
    // and changes nothing.
    let (store, service, a, b) = seeded().await;

    let receipt = service.transfer(command(a, b, "30.00")).await.unwrap();
    assert_eq!(receipt.from_balance, 7_000);
    assert_eq!(receipt.to_balance, 8_000);

    let err = service.transfer(command(a, b, "80.00")).await.unwrap_err();
    assert!(matches!(err, TransferError::InsufficientFunds));

    assert_eq!(store.get_account(a).await.unwrap().unwrap().balance, 7_000);
    assert_eq!(store.get_account(b).await.unwrap().unwrap().balance, 8_000);
    assert_eq!(store.entry_count().await, 2);
}

#[tokio::test]
async fn version_counts_every_balance_write() {
    let (store, service, a, b) = seeded().await;

    let before_a = store.get_account(a).await.unwrap().unwrap().version;
    service.transfer(command(a, b, "10.00")).await.unwrap();
    service.transfer(command(a, b, "10.00")).await.unwrap();

    let after_a = store.get_account(a).await.unwrap().unwrap().version;
    let after_b = store.get_account(b).await.unwrap().unwrap().version;
    assert_eq!(after_a, before_a + 2);
    assert_eq!(after_b, before_a + 2);

    // Rejected transfers do not bump versions
    let _ = service.transfer(command(a, b, "999.00")).await;
    assert_eq!(
        store.get_account(a).await.unwrap().unwrap().version,
        after_a
    );
}

#[tokio::test]
async fn receipt_lookup_by_id() {
    let (_store, service, a, b) = seeded().await;

    let receipt = service.transfer(command(a, b, "30.00")).await.unwrap();
    let fetched = service.get(receipt.transfer_id).await.unwrap().unwrap();
    assert_eq!(fetched.amount, receipt.amount);
    assert_eq!(fetched.debit_entry_id, receipt.debit_entry_id);

    assert!(service.get(TransferId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn store_rejects_same_account_even_if_service_bypassed() {
    let (store, _service, a, _b) = seeded().await;

    let req = TransferRequest {
        from_account: a,
        to_account: a,
        amount: 1_000,
        description: String::new(),
        recipient_label: String::new(),
        idempotency_key: None,
        kind: TransferKind::Transfer,
    };
    let err = store
        .apply_transfer(TransferId::new(), &req)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidAccounts));
}
