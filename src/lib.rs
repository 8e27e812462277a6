//! ledgercore - Atomic money-transfer core
//!
//! The dashboard's one correctness-critical operation, done honestly:
//! paired debit/credit between accounts inside a single atomic unit, with
//! locked re-checks, per-account versioning and idempotent retry.
//!
//! # Modules
//!
//! - [`money`] - Minor-unit amount parsing/formatting
//! - [`account`] - Account records and read/seed repository
//! - [`ledger`] - Insert-only ledger entries
//! - [`transfer`] - The orchestrator, storage seam and both stores
//! - [`gateway`] - HTTP surface (axum)
//! - [`config`] / [`logging`] / [`db`] - Service plumbing

pub mod account;
pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountRepository, AccountStatus};
pub use db::Database;
pub use ledger::{EntryKind, LedgerEntry, LedgerQueries};
pub use transfer::{
    PgTransferStore, TransferCommand, TransferError, TransferId, TransferKind, TransferReceipt,
    TransferService, TransferStore,
};

#[cfg(feature = "mem-store")]
pub use transfer::{FailPoint, MemTransferStore};
