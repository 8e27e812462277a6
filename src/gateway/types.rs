//! Gateway response envelope and error mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::transfer::TransferError;

/// Uniform response envelope: code 0 is success, non-zero carries the error
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

/// Handler error: HTTP status plus envelope code/message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, 400, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, 401, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, 403, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, 404, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, 503, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse {
            code: self.code,
            msg: self.msg,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        match &e {
            TransferError::AccountsNotFound | TransferError::TransferNotFound(_) => {
                ApiError::not_found(e.to_string())
            }
            TransferError::InvalidAccounts
            | TransferError::CurrencyMismatch
            | TransferError::AccountNotActive
            | TransferError::InsufficientFunds
            | TransferError::InvalidAmount(_) => ApiError::bad_request(e.to_string()),
            TransferError::Storage(_) | TransferError::Unavailable(_) => {
                tracing::error!(error = %e, "Storage failure surfaced to gateway");
                ApiError::service_unavailable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::MoneyError;

    #[test]
    fn envelope_omits_data_on_error() {
        let body: ApiResponse<()> = ApiResponse {
            code: 400,
            msg: "Insufficient funds".to_string(),
            data: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("data"));
    }

    #[test]
    fn transfer_error_status_mapping() {
        let e: ApiError = TransferError::InsufficientFunds.into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);

        let e: ApiError = TransferError::AccountsNotFound.into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e: ApiError = TransferError::InvalidAmount(MoneyError::InvalidAmount).into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);

        let e: ApiError = TransferError::Unavailable("fault".into()).into();
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
