use crate::errors::{LedgerError, LedgerResult};
use crate::models::{CommissionRates, LedgerData, SessionInput, SessionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const BACKUP_VERSION: &str = "1.1";

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupDocument {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub data: Vec<SessionRecord>,
    pub commissions: CommissionRates,
}

/// What a backup file yields for restore. Rows are checked one by one later,
/// so a single bad row does not reject the whole file.
#[derive(Debug)]
pub struct RestorePayload {
    pub rows: Vec<SessionInput>,
    pub commissions: Option<CommissionRates>,
    pub unreadable_rows: usize,
}

pub fn build_backup(data: &LedgerData, now: DateTime<Utc>) -> BackupDocument {
    BackupDocument {
        version: BACKUP_VERSION.to_string(),
        timestamp: now,
        data: data.all_records(),
        commissions: data.commissions.clone(),
    }
}

pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("poker-ledger-backup-{}.json", now.format("%Y-%m-%d"))
}

/// Accepts both `1.0` documents (rows only) and `1.1` documents with commissions.
pub fn parse_backup(bytes: &[u8]) -> LedgerResult<RestorePayload> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|err| LedgerError::InvalidBackup(format!("Failed to parse backup file: {err}")))?;

    let Some(rows) = document.get("data").and_then(Value::as_array) else {
        return Err(LedgerError::InvalidBackup("Invalid backup file format".to_string()));
    };

    let mut parsed = Vec::with_capacity(rows.len());
    let mut unreadable_rows = 0;
    for row in rows {
        match serde_json::from_value::<SessionInput>(row.clone()) {
            Ok(input) => parsed.push(input),
            Err(_) => unreadable_rows += 1,
        }
    }

    let commissions = match document.get("commissions") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<CommissionRates>(value.clone())
                .map_err(|_| LedgerError::InvalidBackup("Invalid backup file format".to_string()))?,
        ),
    };

    Ok(RestorePayload {
        rows: parsed,
        commissions,
        unreadable_rows,
    })
}
