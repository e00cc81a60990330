use crate::errors::{LedgerError, LedgerResult};
use crate::models::{CommissionRate, CommissionRates, LedgerData, NewSession, SessionInput, SessionRecord};
use crate::period::PeriodWindow;
use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub restored: usize,
    pub skipped: usize,
}

impl LedgerData {
    /// Stores a new session and returns its id. Ids are never reused.
    pub fn insert(&mut self, session: NewSession, now: DateTime<Utc>) -> i64 {
        self.last_id += 1;
        let id = self.last_id;
        self.results.push(SessionRecord {
            id,
            club_name: session.club_name,
            account_name: session.account_name,
            result: session.result,
            date_time: session.date_time,
            created_at: now,
        });
        id
    }

    /// Replaces the editable fields of session `id`. Returns false if it does not exist.
    pub fn update(&mut self, id: i64, session: NewSession) -> bool {
        match self.results.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.club_name = session.club_name;
                record.account_name = session.account_name;
                record.result = session.result;
                record.date_time = session.date_time;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.results.len();
        self.results.retain(|r| r.id != id);
        self.results.len() != before
    }

    /// Sessions with `start <= date_time < end`, newest first.
    pub fn records_in_window(&self, window: &PeriodWindow<DateTime<Utc>>) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self
            .results
            .iter()
            .filter(|r| window.contains(&r.date_time))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        records
    }

    pub fn all_records(&self) -> Vec<SessionRecord> {
        let mut records = self.results.clone();
        sort_newest_first(&mut records);
        records
    }

    pub fn commission_rates(&self) -> &CommissionRates {
        &self.commissions
    }

    pub fn commission_list(&self) -> Vec<CommissionRate> {
        self.commissions
            .iter()
            .map(|(club_name, pct)| CommissionRate {
                club_name: club_name.clone(),
                commission_percentage: *pct,
            })
            .collect()
    }

    pub fn upsert_commission(&mut self, club_name: &str, percentage: f64) -> LedgerResult<CommissionRate> {
        let club_name = club_name.trim();
        if club_name.is_empty() {
            return Err(LedgerError::InvalidCommission("club name is required".to_string()));
        }
        validate_percentage(percentage)?;

        self.commissions.insert(club_name.to_string(), percentage);
        Ok(CommissionRate {
            club_name: club_name.to_string(),
            commission_percentage: percentage,
        })
    }

    pub fn remove_commission(&mut self, club_name: &str) -> bool {
        self.commissions.remove(club_name.trim()).is_some()
    }

    /// Drops every stored session and loads `rows` in their place. Invalid rows
    /// are skipped; ids continue from the previous counter.
    pub fn restore<Tz: TimeZone>(
        &mut self,
        rows: Vec<SessionInput>,
        commissions: Option<CommissionRates>,
        tz: &Tz,
        now: DateTime<Utc>,
    ) -> RestoreOutcome {
        self.results.clear();

        let mut outcome = RestoreOutcome { restored: 0, skipped: 0 };
        for (index, row) in rows.into_iter().enumerate() {
            match row.validate(tz) {
                Ok(session) => {
                    self.insert(session, now);
                    outcome.restored += 1;
                }
                Err(err) => {
                    warn!(row = index, "skipping backup row: {err}");
                    outcome.skipped += 1;
                }
            }
        }

        if let Some(commissions) = commissions {
            self.commissions = commissions
                .into_iter()
                .filter_map(|(club, pct)| {
                    let trimmed = club.trim();
                    if trimmed.is_empty() || validate_percentage(pct).is_err() {
                        warn!(club = %club, "skipping backup commission {pct}");
                        return None;
                    }
                    Some((trimmed.to_string(), pct))
                })
                .collect();
        }

        outcome
    }
}

fn validate_percentage(percentage: f64) -> LedgerResult<()> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(LedgerError::InvalidCommission(format!(
            "commission percentage must be between 0 and 100, got {percentage}"
        )));
    }
    Ok(())
}

fn sort_newest_first(records: &mut [SessionRecord]) {
    records.sort_by(|a, b| b.date_time.cmp(&a.date_time).then(b.id.cmp(&a.id)));
}
