//! Wire types for the spreadsheet webhook.

use crate::model::{DayKey, LogEntry};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outbound payload. The sheet script keys rows by an unambiguous ISO
/// calendar date and expects clock-time strings (or empty) for the punches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetPayload {
    pub date_key: String,
    pub am_in: String,
    pub am_out: String,
    pub pm_in: String,
    pub pm_out: String,
    pub activity: String,
    pub accomplished: String,
}

impl SheetPayload {
    /// Build the mirror's shape from a merged record: ISO date key,
    /// localized clock times, text defaulted to empty strings.
    pub fn from_entry<Tz>(day: DayKey, entry: &LogEntry, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            date_key: day.format("%Y-%m-%d").to_string(),
            am_in: clock_time(entry.am_in, tz),
            am_out: clock_time(entry.am_out, tz),
            pm_in: clock_time(entry.pm_in, tz),
            pm_out: clock_time(entry.pm_out, tz),
            activity: entry.activity.clone().unwrap_or_default(),
            accomplished: entry.accomplished.clone().unwrap_or_default(),
        }
    }
}

/// Render an instant as a localized clock-time string ("8:05 AM"), or empty
/// when the slot was never punched.
pub fn clock_time<Tz>(at: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match at {
        Some(at) => at.with_timezone(tz).format("%-I:%M %p").to_string(),
        None => String::new(),
    }
}

/// Inbound response. `result` is a discriminator (`success`, `not_found`,
/// ...); `logs` carries the script's diagnostics, surfaced only as log
/// output on our side.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetResponse {
    pub result: String,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl SheetResponse {
    pub fn is_not_found(&self) -> bool {
        self.result == "not_found"
    }
}
