use crate::models::{CommissionRates, SessionRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubRollup {
    pub club_name: String,
    pub commission_percentage: f64,
    pub sessions: usize,
    pub total_result: f64,
    pub adjusted_total: f64,
    pub avg_result: f64,
    pub best_session: f64,
    pub worst_session: f64,
}

impl ClubRollup {
    fn open(club_name: &str, commission_percentage: f64) -> Self {
        Self {
            club_name: club_name.to_string(),
            commission_percentage,
            sessions: 0,
            total_result: 0.0,
            adjusted_total: 0.0,
            avg_result: 0.0,
            best_session: f64::NEG_INFINITY,
            worst_session: f64::INFINITY,
        }
    }

    fn add(&mut self, result: f64) {
        self.sessions += 1;
        self.total_result += result;
        self.adjusted_total += result * (1.0 - self.commission_percentage / 100.0);
        self.best_session = self.best_session.max(result);
        self.worst_session = self.worst_session.min(result);
    }
}

/// Groups `records` by club and sums raw and commission-adjusted results.
///
/// The commission is applied to every record before summing. Output is ordered
/// by `adjusted_total` descending; clubs with equal totals keep the order in
/// which they first appear in `records`.
pub fn aggregate(records: &[SessionRecord], commission_by_club: &CommissionRates) -> Vec<ClubRollup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rollups: Vec<ClubRollup> = Vec::new();

    for record in records {
        let slot = *index.entry(record.club_name.as_str()).or_insert_with(|| {
            let rate = commission_by_club
                .get(&record.club_name)
                .copied()
                .unwrap_or(0.0);
            rollups.push(ClubRollup::open(&record.club_name, rate));
            rollups.len() - 1
        });
        rollups[slot].add(record.result);
    }

    for rollup in &mut rollups {
        rollup.avg_result = rollup.total_result / rollup.sessions as f64;
    }

    // sort_by is stable, which keeps first-seen order for ties.
    rollups.sort_by(|a, b| b.adjusted_total.total_cmp(&a.adjusted_total));
    rollups
}
