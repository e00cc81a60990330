use crate::dates::localize;
use crate::errors::{LedgerError, LedgerResult};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DAY_START_HOUR: u32 = 0;
/// Monday, counted from Sunday = 0.
pub const DEFAULT_WEEK_START_DAY: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodKind {
    pub const ALL: [PeriodKind; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(LedgerError::InvalidPeriodKind(s.to_string())),
        }
    }
}

/// Per-user calendar preferences. Only constructible through [`PeriodSettings::new`],
/// so a value in hand is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodSettings {
    day_start_hour: u32,
    week_start_day: u32,
}

impl Default for PeriodSettings {
    fn default() -> Self {
        Self {
            day_start_hour: DEFAULT_DAY_START_HOUR,
            week_start_day: DEFAULT_WEEK_START_DAY,
        }
    }
}

impl PeriodSettings {
    pub fn new(day_start_hour: u32, week_start_day: u32) -> LedgerResult<Self> {
        if day_start_hour > 23 {
            return Err(LedgerError::InvalidSettings(format!(
                "day start hour must be 0-23, got {day_start_hour}"
            )));
        }
        if week_start_day > 6 {
            return Err(LedgerError::InvalidSettings(format!(
                "week start day must be 0-6, got {week_start_day}"
            )));
        }
        Ok(Self {
            day_start_hour,
            week_start_day,
        })
    }

    /// Builds settings from the `dayStartTime` / `weekStartDay` query values.
    /// `dayStartTime` accepts `H`, `HH` or `HH:MM` with a zero minute part.
    pub fn from_query(day_start_time: Option<&str>, week_start_day: Option<&str>) -> LedgerResult<Self> {
        let hour = match non_blank(day_start_time) {
            Some(raw) => parse_day_start(raw)?,
            None => DEFAULT_DAY_START_HOUR,
        };
        let weekday = match non_blank(week_start_day) {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                LedgerError::InvalidSettings(format!("week start day is not a number: {raw}"))
            })?,
            None => DEFAULT_WEEK_START_DAY,
        };
        Self::new(hour, weekday)
    }

    pub fn day_start_hour(&self) -> u32 {
        self.day_start_hour
    }

    pub fn week_start_day(&self) -> u32 {
        self.week_start_day
    }

    fn day_start(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.day_start_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_day_start(raw: &str) -> LedgerResult<u32> {
    let invalid = || LedgerError::InvalidSettings(format!("day start time must be H, HH or HH:00, got {raw}"));
    let (hour, minute) = match raw.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (raw, None),
    };
    let hour = hour.parse::<u32>().map_err(|_| invalid())?;
    if let Some(minute) = minute {
        if minute.parse::<u32>().map_err(|_| invalid())? != 0 {
            return Err(invalid());
        }
    }
    Ok(hour)
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodWindow<T = NaiveDateTime> {
    pub start: T,
    pub end: T,
}

impl<T: PartialOrd> PeriodWindow<T> {
    pub fn contains(&self, instant: &T) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

impl PeriodWindow<NaiveDateTime> {
    /// Maps both wall-clock boundaries into absolute instants in `tz`.
    pub fn localize<Tz: TimeZone>(&self, tz: &Tz) -> PeriodWindow<DateTime<Utc>> {
        PeriodWindow {
            start: localize(tz, self.start),
            end: localize(tz, self.end),
        }
    }
}

/// Computes the window of the `kind` period containing `reference`, in local wall time.
pub fn resolve(kind: PeriodKind, reference: NaiveDate, settings: &PeriodSettings) -> LedgerResult<PeriodWindow> {
    let overflow = || LedgerError::DateOutOfRange(format!("{kind} containing {reference}"));

    let (first, next) = match kind {
        PeriodKind::Day => {
            let next = reference.checked_add_days(Days::new(1));
            (Some(reference), next)
        }
        PeriodKind::Week => {
            let weekday = reference.weekday().num_days_from_sunday();
            let offset = (weekday + 7 - settings.week_start_day) % 7;
            let first = reference.checked_sub_days(Days::new(u64::from(offset)));
            (first, first.and_then(|d| d.checked_add_days(Days::new(7))))
        }
        PeriodKind::Month => {
            let first = reference.with_day(1);
            (first, first.and_then(|d| d.checked_add_months(Months::new(1))))
        }
        PeriodKind::Year => {
            let first = NaiveDate::from_ymd_opt(reference.year(), 1, 1);
            (first, first.and_then(|d| d.checked_add_months(Months::new(12))))
        }
    };

    let first = first.ok_or_else(overflow)?;
    let next = next.ok_or_else(overflow)?;
    let day_start = settings.day_start();

    Ok(PeriodWindow {
        start: first.and_time(day_start),
        end: next.and_time(day_start),
    })
}
