//! Account management module
//!
//! PostgreSQL-backed records for customer accounts. Balances are only ever
//! mutated through the transfer store's atomic unit; the repository here is
//! the read/seed surface.

pub mod models;
pub mod repository;

pub use models::{Account, AccountStatus};
pub use repository::AccountRepository;
