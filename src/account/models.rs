//! Data models for customer accounts

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Closed = 0,
    Active = 1,
    Frozen = 2,
}

impl AccountStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(AccountStatus::Closed),
            1 => Some(AccountStatus::Active),
            2 => Some(AccountStatus::Frozen),
            _ => None,
        }
    }
}

impl From<i16> for AccountStatus {
    fn from(v: i16) -> Self {
        AccountStatus::from_id(v).unwrap_or(AccountStatus::Closed)
    }
}

/// Customer account
///
/// `balance` is in minor units of `currency`. `version` increments on every
/// balance write; a transfer that commits bumps both involved rows by one.
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: i64,
    pub owner_id: i64,
    pub currency: String,
    pub balance: i64,
    pub version: i64,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_usable(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_id_roundtrip() {
        for status in [
            AccountStatus::Closed,
            AccountStatus::Active,
            AccountStatus::Frozen,
        ] {
            assert_eq!(AccountStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(AccountStatus::from_id(99), None);
        // Unknown ids decode to Closed rather than Active
        assert_eq!(AccountStatus::from(99i16), AccountStatus::Closed);
    }

    #[test]
    fn usable_only_when_active() {
        let mut account = Account {
            account_id: 1,
            owner_id: 10,
            currency: "USD".to_string(),
            balance: 10_000,
            version: 1,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };
        assert!(account.is_usable());

        account.status = AccountStatus::Frozen;
        assert!(!account.is_usable());
        account.status = AccountStatus::Closed;
        assert!(!account.is_usable());
    }
}
