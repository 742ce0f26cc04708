//! Focus statistics
//!
//! Pure aggregations over the session log. Only work sessions are counted;
//! breaks are logged but never contribute to a statistic.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;

use crate::ports::Clock;
use crate::session::SessionLog;

/// Number of days in the weekly histogram
pub const WEEK_DAYS: i64 = 7;

/// Work sessions completed on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyStat {
    /// An instant within the day (the current time shifted back whole days)
    pub date: DateTime<Utc>,
    pub count: u32,
}

impl DailyStat {
    /// Abbreviated weekday name ("Mon") in the given time zone
    pub fn day_label<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.date.with_timezone(tz).format("%a").to_string()
    }
}

/// Work sessions on the same calendar day as now
pub fn today_count(log: &SessionLog, clock: &dyn Clock) -> u32 {
    let now = clock.now();
    log.work_sessions()
        .filter(|s| clock.is_same_day(s.timestamp, now))
        .count() as u32
}

/// Work sessions in the last seven days, measured as an exact duration
pub fn week_count(log: &SessionLog, clock: &dyn Clock) -> u32 {
    let since = clock.now() - Duration::days(WEEK_DAYS);
    log.work_sessions().filter(|s| s.timestamp >= since).count() as u32
}

/// Work sessions ever recorded
pub fn total_count(log: &SessionLog) -> u32 {
    log.work_sessions().count() as u32
}

/// Seven daily counts, oldest first, ending with today
pub fn weekly_stats(log: &SessionLog, clock: &dyn Clock) -> Vec<DailyStat> {
    let now = clock.now();
    (0..WEEK_DAYS)
        .rev()
        .map(|offset| {
            let date = clock.add_days(now, -offset);
            let start = clock.start_of_day(date);
            let end = clock.add_days(start, 1);
            let count = log
                .work_sessions()
                .filter(|s| s.timestamp >= start && s.timestamp < end)
                .count() as u32;
            DailyStat { date, count }
        })
        .collect()
}

/// Render a minute count as "1h 15m", or "25 min" under an hour
pub fn format_focus_time(total_minutes: u64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{} min", minutes)
    }
}

/// Aggregated focus statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusStats {
    pub today: u32,
    pub week: u32,
    pub total: u32,
    /// Total work sessions times the current work duration
    pub total_minutes: u64,
    pub weekly: Vec<DailyStat>,
}

impl FocusStats {
    /// Compute every statistic at once.
    ///
    /// Focus time uses the current work duration for every session, not the
    /// duration that was configured when each session ran.
    pub fn compute(log: &SessionLog, clock: &dyn Clock, work_minutes: u32) -> Self {
        let total = total_count(log);
        Self {
            today: today_count(log, clock),
            week: week_count(log, clock),
            total,
            total_minutes: u64::from(total) * u64::from(work_minutes),
            weekly: weekly_stats(log, clock),
        }
    }

    pub fn total_focus_time_string(&self) -> String {
        format_focus_time(self.total_minutes)
    }
}
