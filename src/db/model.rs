//! Row types for the logs table.

use crate::model::{DayKey, LogEntry};
use chrono::{DateTime, Utc};

/// One persisted row: the day key plus the six nullable record fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LogRow {
    pub day_key: DayKey,
    pub am_in: Option<DateTime<Utc>>,
    pub am_out: Option<DateTime<Utc>>,
    pub pm_in: Option<DateTime<Utc>>,
    pub pm_out: Option<DateTime<Utc>>,
    pub activity: Option<String>,
    pub accomplished: Option<String>,
}

impl LogRow {
    pub fn into_parts(self) -> (DayKey, LogEntry) {
        (
            self.day_key,
            LogEntry {
                am_in: self.am_in,
                am_out: self.am_out,
                pm_in: self.pm_in,
                pm_out: self.pm_out,
                activity: self.activity,
                accomplished: self.accomplished,
            },
        )
    }
}
