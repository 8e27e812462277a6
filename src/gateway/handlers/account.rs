//! Account and ledger query handlers, plus the deposit flow

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};
use super::require_user;
use crate::account::Account;
use crate::ledger::LedgerEntry;
use crate::money;

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountApiData {
    pub account_id: i64,
    pub currency: String,
    /// Decimal string balance
    pub balance: String,
    pub status: String,
}

impl AccountApiData {
    fn from_account(account: &Account) -> Self {
        let exponent = money::currency_exponent(&account.currency);
        Self {
            account_id: account.account_id,
            currency: account.currency.clone(),
            balance: money::format_amount(account.balance, exponent),
            status: format!("{:?}", account.status).to_lowercase(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerEntryApiData {
    pub entry_id: i64,
    pub account_id: i64,
    /// Signed decimal string
    pub amount: String,
    pub kind: String,
    pub description: String,
    pub counterparty: String,
    pub status: String,
    pub timestamp: i64,
}

impl LedgerEntryApiData {
    fn from_entry(entry: &LedgerEntry, exponent: u32) -> Self {
        Self {
            entry_id: entry.entry_id,
            account_id: entry.account_id,
            amount: money::format_amount(entry.amount, exponent),
            kind: entry.kind.as_str().to_string(),
            description: entry.description.clone(),
            counterparty: entry.counterparty.clone(),
            status: entry.status.clone(),
            timestamp: entry.created_at.timestamp_millis(),
        }
    }
}

/// List the caller's accounts
#[utoipa::path(
    get,
    path = "/api/v1/private/accounts",
    responses(
        (status = 200, description = "Accounts for the caller", body = [AccountApiData], content_type = "application/json"),
        (status = 401, description = "User not authenticated")
    ),
    tag = "Account"
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<AccountApiData>> {
    let user_id = require_user(&headers)?;
    let accounts = state.service.store().list_accounts(user_id).await?;
    ok(accounts.iter().map(AccountApiData::from_account).collect())
}

#[derive(Debug, Deserialize)]
pub struct LedgerParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Recent ledger entries for one of the caller's accounts
#[utoipa::path(
    get,
    path = "/api/v1/private/accounts/{account_id}/ledger",
    params(
        ("account_id" = i64, Path, description = "Account id"),
        ("limit" = i64, Query, description = "Max entries, default 50")
    ),
    responses(
        (status = 200, description = "Ledger entries, newest first", body = [LedgerEntryApiData], content_type = "application/json"),
        (status = 401, description = "User not authenticated"),
        (status = 404, description = "No such account for this caller")
    ),
    tag = "Account"
)]
pub async fn get_ledger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(account_id): Path<i64>,
    Query(params): Query<LedgerParams>,
) -> ApiResult<Vec<LedgerEntryApiData>> {
    let user_id = require_user(&headers)?;

    let account = state
        .service
        .store()
        .get_account(account_id)
        .await?
        .filter(|a| a.owner_id == user_id)
        .ok_or_else(|| ApiError::not_found("Accounts not found"))?;

    let limit = params.limit.clamp(1, 500);
    let entries = state.service.store().list_entries(account_id, limit).await?;
    let exponent = money::currency_exponent(&account.currency);
    ok(entries
        .iter()
        .map(|e| LedgerEntryApiData::from_entry(e, exponent))
        .collect())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositApiRequest {
    pub account: i64,
    /// Decimal amount string
    #[schema(example = "100.00")]
    pub amount: String,
    #[serde(default)]
    pub description: String,
}

/// Credit one of the caller's accounts
#[utoipa::path(
    post,
    path = "/api/v1/private/deposit",
    request_body = DepositApiRequest,
    responses(
        (status = 200, description = "Deposit committed", body = LedgerEntryApiData, content_type = "application/json"),
        (status = 400, description = "Invalid amount or inactive account"),
        (status = 401, description = "User not authenticated")
    ),
    tag = "Account"
)]
pub async fn create_deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DepositApiRequest>,
) -> ApiResult<LedgerEntryApiData> {
    let user_id = require_user(&headers)?;

    let account = state
        .service
        .store()
        .get_account(req.account)
        .await?
        .filter(|a| a.owner_id == user_id)
        .ok_or_else(|| ApiError::not_found("Accounts not found"))?;

    let entry = state
        .service
        .deposit(req.account, &req.amount, &req.description)
        .await?;
    let exponent = money::currency_exponent(&account.currency);
    ok(LedgerEntryApiData::from_entry(&entry, exponent))
}
