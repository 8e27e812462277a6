//! Money-transfer orchestration
//!
//! The one correctness-critical operation of the dashboard backend: a paired
//! debit/credit between two accounts, with the ledger entries recording it.
//!
//! # Consistency contract
//!
//! 1. **Atomic unit**: balance check, both balance writes and both ledger
//!    inserts commit together or not at all (`TransferStore::apply_transfer`).
//! 2. **Locked re-check**: sufficient funds is decided on the balance read
//!    under the store's locks, never on an earlier read.
//! 3. **Single-writer per account**: row locks are taken in ascending
//!    account_id order; concurrent transfers against one source serialize.
//! 4. **Idempotency**: a caller-supplied key makes retries safe; the second
//!    submission returns the first receipt.

pub mod error;
#[cfg(feature = "mem-store")]
pub mod memory;
pub mod pg;
pub mod service;
pub mod store;
pub mod types;

pub use error::TransferError;
#[cfg(feature = "mem-store")]
pub use memory::{FailPoint, MemTransferStore};
pub use pg::PgTransferStore;
pub use service::TransferService;
pub use store::TransferStore;
pub use types::{TransferCommand, TransferId, TransferKind, TransferReceipt, TransferRequest};
