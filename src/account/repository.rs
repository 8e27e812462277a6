//! Repository layer for account reads and seeding
//!
//! Balance mutation is deliberately absent here: every balance write in the
//! system goes through `PgTransferStore::apply_transfer`, which takes row
//! locks and bumps the version column.

use super::models::{Account, AccountStatus};
use sqlx::{PgPool, Row};

const SELECT_COLUMNS: &str =
    "account_id, owner_id, currency, balance, version, status, created_at";

/// Account repository for read/seed operations
pub struct AccountRepository;

impl AccountRepository {
    /// Get account by ID
    pub async fn get_by_id(pool: &PgPool, account_id: i64) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts_tb WHERE account_id = $1",
            SELECT_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| row_to_account(&r)))
    }

    /// All accounts belonging to an owner
    pub async fn list_for_owner(pool: &PgPool, owner_id: i64) -> Result<Vec<Account>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM accounts_tb WHERE owner_id = $1 ORDER BY account_id",
            SELECT_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.iter().map(row_to_account).collect())
    }

    /// Open a new account with a starting balance (seeding and ops tooling;
    /// customer-facing account opening lives outside this service)
    pub async fn open(
        pool: &PgPool,
        owner_id: i64,
        currency: &str,
        opening_balance: i64,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            "INSERT INTO accounts_tb (owner_id, currency, balance) VALUES ($1, $2, $3) \
             RETURNING account_id",
        )
        .bind(owner_id)
        .bind(currency)
        .bind(opening_balance)
        .fetch_one(pool)
        .await?;

        Ok(row.get("account_id"))
    }
}

pub(crate) fn row_to_account(r: &sqlx::postgres::PgRow) -> Account {
    Account {
        account_id: r.get("account_id"),
        owner_id: r.get("owner_id"),
        currency: r.get("currency"),
        balance: r.get("balance"),
        version: r.get("version"),
        status: AccountStatus::from(r.get::<i16, _>("status")),
        created_at: r.get("created_at"),
    }
}
