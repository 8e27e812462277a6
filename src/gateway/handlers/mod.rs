//! HTTP handlers

pub mod account;
pub mod health;
pub mod transfer;

pub use account::{
    AccountApiData, DepositApiRequest, LedgerEntryApiData, create_deposit, get_ledger,
    list_accounts,
};
pub use health::{HealthResponse, health_check};
pub use transfer::{TransferApiRequest, TransferApiResponse, create_transfer, get_transfer};

use axum::http::HeaderMap;

use super::types::ApiError;

/// Resolve the authenticated user from the session header.
///
/// The dashboard's BaaS session is out of scope here; the gateway trusts the
/// `X-User-Id` header placed by the front proxy. Its absence is the
/// `"User not authenticated"` path callers display verbatim.
pub(crate) fn require_user(headers: &HeaderMap) -> Result<i64, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| ApiError::unauthorized("User not authenticated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_unauthenticated() {
        let headers = HeaderMap::new();
        let err = require_user(&headers).unwrap_err();
        assert_eq!(err.msg, "User not authenticated");
        assert_eq!(err.code, 401);
    }

    #[test]
    fn valid_header_resolves_user() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("42"));
        assert_eq!(require_user(&headers).unwrap(), 42);
    }

    #[test]
    fn garbage_header_is_unauthenticated() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("alice"));
        assert!(require_user(&headers).is_err());
    }
}
