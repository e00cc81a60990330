use crate::errors::{LedgerError, LedgerResult};
use crate::period::PeriodKind;
use chrono::{Days, Months, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl TryFrom<i32> for Direction {
    type Error = LedgerError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Previous),
            1 => Ok(Self::Next),
            other => Err(LedgerError::InvalidDirection(other)),
        }
    }
}

/// Moves `reference` one period instance forwards or backwards.
///
/// Month and year steps clamp the day of month to the target month's length,
/// so Jan 31 + 1 month lands on the last day of February.
pub fn advance(kind: PeriodKind, reference: NaiveDate, direction: Direction) -> LedgerResult<NaiveDate> {
    let moved = match (kind, direction) {
        (PeriodKind::Day, Direction::Next) => reference.checked_add_days(Days::new(1)),
        (PeriodKind::Day, Direction::Previous) => reference.checked_sub_days(Days::new(1)),
        (PeriodKind::Week, Direction::Next) => reference.checked_add_days(Days::new(7)),
        (PeriodKind::Week, Direction::Previous) => reference.checked_sub_days(Days::new(7)),
        (PeriodKind::Month, Direction::Next) => reference.checked_add_months(Months::new(1)),
        (PeriodKind::Month, Direction::Previous) => reference.checked_sub_months(Months::new(1)),
        (PeriodKind::Year, Direction::Next) => reference.checked_add_months(Months::new(12)),
        (PeriodKind::Year, Direction::Previous) => reference.checked_sub_months(Months::new(12)),
    };

    moved.ok_or_else(|| LedgerError::DateOutOfRange(format!("{kind} step from {reference}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{resolve, PeriodSettings};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_step_clamps_to_short_month() {
        assert_eq!(advance(PeriodKind::Month, date(2024, 1, 31), Direction::Next).unwrap(), date(2024, 2, 29));
        assert_eq!(advance(PeriodKind::Month, date(2023, 1, 31), Direction::Next).unwrap(), date(2023, 2, 28));
        assert_eq!(advance(PeriodKind::Month, date(2024, 3, 31), Direction::Previous).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn jan_31_next_month_resolves_to_february() {
        let settings = PeriodSettings::default();
        let next = advance(PeriodKind::Month, date(2024, 1, 31), Direction::Next).unwrap();
        let window = resolve(PeriodKind::Month, next, &settings).unwrap();
        assert_eq!(window.start.date(), date(2024, 2, 1));
        assert_eq!(window.end.date(), date(2024, 3, 1));
    }

    #[test]
    fn year_step_clamps_leap_day() {
        assert_eq!(advance(PeriodKind::Year, date(2024, 2, 29), Direction::Next).unwrap(), date(2025, 2, 28));
        assert_eq!(advance(PeriodKind::Year, date(2024, 2, 29), Direction::Previous).unwrap(), date(2023, 2, 28));
    }

    #[test]
    fn day_and_week_steps_cross_month_boundaries() {
        assert_eq!(advance(PeriodKind::Day, date(2024, 2, 29), Direction::Next).unwrap(), date(2024, 3, 1));
        assert_eq!(advance(PeriodKind::Week, date(2024, 1, 3), Direction::Previous).unwrap(), date(2023, 12, 27));
    }

    #[test]
    fn direction_from_integer() {
        assert_eq!(Direction::try_from(-1).unwrap(), Direction::Previous);
        assert_eq!(Direction::try_from(1).unwrap(), Direction::Next);
        assert_eq!(Direction::try_from(2), Err(LedgerError::InvalidDirection(2)));
        assert_eq!(Direction::try_from(0), Err(LedgerError::InvalidDirection(0)));
    }

    #[test]
    fn adjacent_windows_tile_in_both_directions() {
        let mut reference = date(2023, 11, 15);
        for _ in 0..500 {
            for hour in [0, 6, 23] {
                for weekday in 0..7 {
                    let settings = PeriodSettings::new(hour, weekday).unwrap();
                    for kind in PeriodKind::ALL {
                        let current = resolve(kind, reference, &settings).unwrap();

                        let next = advance(kind, reference, Direction::Next).unwrap();
                        let next_window = resolve(kind, next, &settings).unwrap();
                        assert_eq!(current.end, next_window.start, "{kind} after {reference}");

                        let prev = advance(kind, reference, Direction::Previous).unwrap();
                        let prev_window = resolve(kind, prev, &settings).unwrap();
                        assert_eq!(prev_window.end, current.start, "{kind} before {reference}");
                    }
                }
            }
            reference = reference.succ_opt().unwrap();
        }
    }
}
