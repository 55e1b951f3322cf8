use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::service::calendar::CalendarError;

/// Inclusive absolute time range covering whole calendar days in a fixed
/// local offset.
///
/// `start` is the first day's 00:00:00.000 and `end` the last day's
/// 23:59:59.999 local wall-clock, both normalized to UTC. Constructed
/// fresh per query and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateWindow {
    /// Resolve a pair of `%Y-%m-%d` calendar dates into an inclusive UTC
    /// window using a fixed offset in minutes east of UTC.
    ///
    /// The offset is applied as-is to both boundaries; daylight-saving
    /// transitions are not handled. Reversed ranges (`start > end`) are
    /// rejected.
    pub fn resolve(start: &str, end: &str, offset_minutes: i32) -> Result<Self, CalendarError> {
        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;

        if start_date > end_date {
            return Err(CalendarError::InvalidRange(format!(
                "start date {start_date} is after end date {end_date}"
            )));
        }

        let offset = FixedOffset::east_opt(offset_minutes.saturating_mul(60)).ok_or_else(|| {
            CalendarError::InvalidRange(format!(
                "offset of {offset_minutes} minutes is not a valid timezone offset"
            ))
        })?;

        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).ok_or_else(|| {
            CalendarError::InvalidRange("could not build end-of-day time".to_string())
        })?;

        Ok(Self {
            start: to_utc(start_date.and_time(NaiveTime::MIN), offset),
            end: to_utc(end_date.and_time(end_of_day), offset),
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Window start as epoch milliseconds, the wire representation.
    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// Window end as epoch milliseconds, the wire representation.
    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, CalendarError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CalendarError::InvalidRange("date is empty".to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|e| {
        CalendarError::InvalidRange(format!("could not parse date {trimmed:?}: {e}"))
    })
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(local - offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn resolves_day_edges_for_nine_hour_offset() {
        let window = DateWindow::resolve("2026-01-05", "2026-01-06", 540).unwrap();

        // Local midnight at UTC+9 is 15:00 the previous day in UTC.
        assert_eq!(
            window.start(),
            Utc.with_ymd_and_hms(2026, 1, 4, 15, 0, 0).unwrap()
        );
        assert_eq!(
            window.end(),
            Utc.with_ymd_and_hms(2026, 1, 6, 14, 59, 59).unwrap()
                + chrono::Duration::milliseconds(999)
        );
    }

    #[test]
    fn single_day_window_is_ordered() {
        let window = DateWindow::resolve("2026-03-10", "2026-03-10", 540).unwrap();
        assert!(window.start() <= window.end());
        assert_eq!(window.end() - window.start(), chrono::Duration::milliseconds(86_399_999));
    }

    #[test]
    fn negative_offsets_shift_the_other_way() {
        let window = DateWindow::resolve("2026-01-05", "2026-01-05", -300).unwrap();
        assert_eq!(
            window.start(),
            Utc.with_ymd_and_hms(2026, 1, 5, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn resolve_is_deterministic() {
        let a = DateWindow::resolve("2026-01-05", "2026-01-09", 540).unwrap();
        let b = DateWindow::resolve("2026-01-05", "2026-01-09", 540).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_empty_dates() {
        let err = DateWindow::resolve("", "2026-01-09", 540).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidRange(_)));

        let err = DateWindow::resolve("2026-01-05", "   ", 540).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidRange(_)));
    }

    #[test]
    fn rejects_unparseable_dates() {
        let err = DateWindow::resolve("01/05/2026", "2026-01-09", 540).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidRange(_)));

        let err = DateWindow::resolve("2026-01-05", "not-a-date", 540).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidRange(_)));
    }

    #[test]
    fn rejects_reversed_ranges() {
        let err = DateWindow::resolve("2026-01-09", "2026-01-05", 540).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidRange(_)));
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        let err = DateWindow::resolve("2026-01-05", "2026-01-09", 1500).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidRange(_)));
    }
}
