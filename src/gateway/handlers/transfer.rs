//! Transfer handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};
use super::require_user;
use crate::money;
use crate::transfer::{TransferCommand, TransferId, TransferKind, TransferReceipt};

/// Transfer request body
///
/// Amounts are decimal strings to avoid float precision issues in JSON.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferApiRequest {
    /// Source account id (must belong to the caller)
    pub from: i64,
    /// Destination account id
    pub to: i64,
    /// Decimal amount string, e.g. "30.00"
    #[schema(example = "30.00")]
    pub amount: String,
    #[serde(default)]
    pub description: String,
    /// Human-readable recipient label for the debit ledger row
    #[serde(default)]
    pub recipient: String,
    /// Client idempotency key: same key, same outcome, money moves once
    #[serde(default)]
    pub idempotency_key: Option<String>,
    /// "transfer" (default) or "bill_payment"
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferApiResponse {
    pub transfer_id: String,
    pub status: String,
    pub from: i64,
    pub to: i64,
    /// Amount moved, decimal string
    pub amount: String,
    pub currency: String,
    pub kind: String,
    /// Source balance after commit, decimal string
    pub from_balance: String,
    /// Destination balance after commit, decimal string
    pub to_balance: String,
    pub debit_entry_id: i64,
    pub credit_entry_id: i64,
    pub timestamp: i64,
}

impl TransferApiResponse {
    pub(crate) fn from_receipt(receipt: &TransferReceipt) -> Self {
        let exponent = money::currency_exponent(&receipt.currency);
        Self {
            transfer_id: receipt.transfer_id.to_string(),
            status: "completed".to_string(),
            from: receipt.from_account,
            to: receipt.to_account,
            amount: money::format_amount(receipt.amount, exponent),
            currency: receipt.currency.clone(),
            kind: receipt.kind.as_str().to_string(),
            from_balance: money::format_amount(receipt.from_balance, exponent),
            to_balance: money::format_amount(receipt.to_balance, exponent),
            debit_entry_id: receipt.debit_entry_id,
            credit_entry_id: receipt.credit_entry_id,
            timestamp: receipt.created_at.timestamp_millis(),
        }
    }
}

/// Execute a transfer
#[utoipa::path(
    post,
    path = "/api/v1/private/transfer",
    request_body = TransferApiRequest,
    responses(
        (status = 200, description = "Transfer committed", body = TransferApiResponse, content_type = "application/json"),
        (status = 400, description = "Invalid parameters or insufficient funds"),
        (status = 401, description = "User not authenticated"),
        (status = 403, description = "Source account not owned by caller"),
        (status = 503, description = "Store unavailable; nothing committed")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferApiRequest>,
) -> ApiResult<TransferApiResponse> {
    let user_id = require_user(&headers)?;

    let kind = match req.kind.as_deref() {
        None => TransferKind::Transfer,
        Some(name) => TransferKind::from_name(name)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown transfer kind: {}", name)))?,
    };

    // Ownership check on the source account before anything else
    let from = state
        .service
        .store()
        .get_account(req.from)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Accounts not found"))?;
    if from.owner_id != user_id {
        return Err(ApiError::forbidden("Source account not owned by caller"));
    }

    let receipt = state
        .service
        .transfer(TransferCommand {
            from_account: req.from,
            to_account: req.to,
            amount: req.amount,
            description: req.description,
            recipient_label: req.recipient,
            idempotency_key: req.idempotency_key,
            kind,
        })
        .await?;

    ok(TransferApiResponse::from_receipt(&receipt))
}

/// Look up a committed transfer by id
#[utoipa::path(
    get,
    path = "/api/v1/private/transfer/{transfer_id}",
    params(("transfer_id" = String, Path, description = "Transfer ULID")),
    responses(
        (status = 200, description = "Receipt found", body = TransferApiResponse, content_type = "application/json"),
        (status = 404, description = "No such transfer")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(transfer_id): Path<String>,
) -> ApiResult<TransferApiResponse> {
    let user_id = require_user(&headers)?;

    let transfer_id: TransferId = transfer_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid transfer id"))?;

    let receipt = state
        .service
        .get(transfer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transfer not found"))?;

    // A receipt is visible to the owner of either side
    let from = state
        .service
        .store()
        .get_account(receipt.from_account)
        .await
        .map_err(ApiError::from)?;
    let to = state
        .service
        .store()
        .get_account(receipt.to_account)
        .await
        .map_err(ApiError::from)?;
    let visible = from.map(|a| a.owner_id == user_id).unwrap_or(false)
        || to.map(|a| a.owner_id == user_id).unwrap_or(false);
    if !visible {
        return Err(ApiError::not_found("Transfer not found"));
    }

    ok(TransferApiResponse::from_receipt(&receipt))
}
