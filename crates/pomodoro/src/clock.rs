//! System clock on the local calendar

use chrono::{DateTime, Days, Local, LocalResult, NaiveDate, TimeZone, Utc};
use pomodoro_core::Clock;

/// Wall clock; day boundaries follow the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        local_midnight(instant.with_timezone(&Local).date_naive()).unwrap_or(instant)
    }

    fn add_days(&self, instant: DateTime<Utc>, days: i64) -> DateTime<Utc> {
        let local = instant.with_timezone(&Local);
        let shifted = if days >= 0 {
            local.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            local.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| instant + chrono::Duration::days(days))
    }
}

/// First instant of `date` in local time. Days that start inside a DST gap
/// begin at the first valid local time after midnight.
fn local_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => (1..=3)
            .filter_map(|h| date.and_hms_opt(h, 0, 0))
            .find_map(|t| Local.from_local_datetime(&t).earliest())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_day_is_not_after_now() {
        let clock = SystemClock::new();
        let now = clock.now();
        let start = clock.start_of_day(now);
        assert!(start <= now);
        assert!(now - start < chrono::Duration::hours(25));
        assert!(clock.is_same_day(start, now));
    }

    #[test]
    fn test_add_days_moves_whole_days() {
        let clock = SystemClock::new();
        let start = clock.start_of_day(clock.now());
        let tomorrow = clock.add_days(start, 1);
        assert_eq!(clock.start_of_day(tomorrow), tomorrow);
        assert_eq!(clock.add_days(tomorrow, -1), start);
    }
}
