use crate::dates::parse_timestamp;
use crate::errors::{LedgerError, LedgerResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Commission percentages keyed by club name.
pub type CommissionRates = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub club_name: String,
    pub account_name: String,
    pub result: f64,
    pub date_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Raw create/update payload, also the row shape accepted by restore.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionInput {
    pub club_name: Option<String>,
    pub account_name: Option<String>,
    pub result: Option<f64>,
    pub date_time: Option<String>,
}

/// A session that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub club_name: String,
    pub account_name: String,
    pub result: f64,
    pub date_time: DateTime<Utc>,
}

impl SessionInput {
    pub fn validate<Tz: TimeZone>(self, tz: &Tz) -> LedgerResult<NewSession> {
        let required = || LedgerError::InvalidRecord("All fields are required".to_string());

        let club_name = trimmed(self.club_name).ok_or_else(required)?;
        let account_name = trimmed(self.account_name).ok_or_else(required)?;
        let result = self.result.ok_or_else(required)?;
        let date_time = trimmed(self.date_time).ok_or_else(required)?;

        if !result.is_finite() {
            return Err(LedgerError::InvalidRecord("result must be a finite number".to_string()));
        }

        Ok(NewSession {
            club_name,
            account_name,
            result,
            date_time: parse_timestamp(&date_time, tz)?,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerData {
    #[serde(default)]
    pub last_id: i64,
    #[serde(default)]
    pub results: Vec<SessionRecord>,
    #[serde(default)]
    pub commissions: CommissionRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRate {
    pub club_name: String,
    pub commission_percentage: f64,
}

#[derive(Debug, Deserialize)]
pub struct CommissionInput {
    pub commission_percentage: Option<f64>,
}

/// Query parameters shared by every period-filtered endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub date: Option<String>,
    pub day_start_time: Option<String>,
    pub week_start_day: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodResponse {
    pub period: String,
    pub date: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub local_start: String,
    pub local_end: String,
    pub previous: String,
    pub next: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RestoreResponse {
    pub message: String,
    pub restored_records: usize,
    pub skipped_records: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(club: &str, account: &str, result: Option<f64>, date_time: &str) -> SessionInput {
        SessionInput {
            club_name: Some(club.to_string()),
            account_name: Some(account.to_string()),
            result,
            date_time: Some(date_time.to_string()),
        }
    }

    #[test]
    fn validate_trims_labels_and_normalises_time() {
        let session = input("  River Club ", "hero", Some(-12.5), "2024-01-10T20:00:00+01:00")
            .validate(&Utc)
            .unwrap();
        assert_eq!(session.club_name, "River Club");
        assert_eq!(session.account_name, "hero");
        assert_eq!(session.result, -12.5);
        assert_eq!(session.date_time.to_rfc3339(), "2024-01-10T19:00:00+00:00");
    }

    #[test]
    fn validate_requires_every_field() {
        let err = input("club", "   ", Some(1.0), "2024-01-10T20:00:00Z")
            .validate(&Utc)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidRecord("All fields are required".to_string()));

        let err = input("club", "acct", None, "2024-01-10T20:00:00Z")
            .validate(&Utc)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidRecord("All fields are required".to_string()));
    }

    #[test]
    fn validate_rejects_non_finite_results() {
        let err = input("club", "acct", Some(f64::INFINITY), "2024-01-10T20:00:00Z")
            .validate(&Utc)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRecord(_)));
    }

    #[test]
    fn ledger_data_tolerates_missing_sections() {
        let data: LedgerData = serde_json::from_str("{}").unwrap();
        assert_eq!(data.last_id, 0);
        assert!(data.results.is_empty());
        assert!(data.commissions.is_empty());
    }
}
