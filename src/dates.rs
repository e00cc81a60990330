use crate::errors::{LedgerError, LedgerResult};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

const LOCAL_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Widest span between two readings of one wall-clock time; offsets stay within +-14h.
const GAP_SEARCH_SECS: i64 = 26 * 3600;

/// Maps a wall-clock time in `tz` to an absolute instant.
///
/// Ambiguous times (clocks turned back) take the earlier instant. Times that do
/// not exist (clocks turned forward) move to the first valid instant after the gap.
pub fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => end_of_gap(tz, naive).unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}

/// First instant whose wall-clock reading in `tz` is at or after `naive`.
fn end_of_gap<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    let target = naive.and_utc().timestamp();
    let mut before = target.checked_sub(GAP_SEARCH_SECS)?;
    let mut after = target.checked_add(GAP_SEARCH_SECS)?;

    // wall(before) < naive <= wall(after)
    while after - before > 1 {
        let mid = before + (after - before) / 2;
        let instant = DateTime::from_timestamp(mid, 0)?;
        if tz.from_utc_datetime(&instant.naive_utc()).naive_local() >= naive {
            after = mid;
        } else {
            before = mid;
        }
    }
    DateTime::from_timestamp(after, 0)
}

/// Parses a reference date: either `YYYY-MM-DD` or an RFC 3339 instant, which is
/// reduced to its calendar date in `tz`.
pub fn parse_reference_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> LedgerResult<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(tz).date_naive())
        .map_err(|_| LedgerError::InvalidDate(raw.to_string()))
}

/// Parses a session timestamp. RFC 3339 values keep their own offset; bare
/// `YYYY-MM-DDTHH:MM[:SS]` values are wall time in `tz`. The result is UTC.
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> LedgerResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    LOCAL_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| localize(tz, naive))
        .ok_or_else(|| LedgerError::InvalidRecord(format!("unrecognised date_time: {raw}")))
}
