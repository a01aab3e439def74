//! Time-based edit-lock policy and day eligibility.
//!
//! All predicates are pure functions of the stored instant, the current
//! instant and day equality. Callers must re-evaluate them on every check;
//! eligibility decays as wall-clock time passes, so a cached answer goes
//! stale.

use crate::engine;
use crate::model::{DayKey, LogEntry, PunchSlot};
use chrono::{DateTime, Duration, Utc};

/// A recorded punch stays editable for this long after the recorded instant.
pub const EDIT_WINDOW_SECS: i64 = 3_600;

/// True while `punched_at` is still within the edit window at `now`.
pub fn within_edit_window(punched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(punched_at) <= Duration::seconds(EDIT_WINDOW_SECS)
}

/// Whether a punch slot may currently be written.
///
/// Days before today are read-only regardless of content; days after today
/// are never editable. For today, a recorded value locks once the edit
/// window elapses, and an empty slot follows punch eligibility.
pub fn is_punch_editable(entry: &LogEntry, slot: PunchSlot, day: DayKey, now: DateTime<Utc>) -> bool {
    if day != now.date_naive() {
        return false;
    }
    match entry.slot(slot) {
        Some(at) => within_edit_window(at, now),
        None => engine::is_slot_eligible(entry, slot),
    }
}

/// Report text is editable only while viewing today; otherwise view-only,
/// independent of the punch edit window.
pub fn is_report_editable(day: DayKey, today: DayKey) -> bool {
    day == today
}

/// Day navigation predicate for the calendar collaborator: future days are
/// never selectable, and past days only when they hold data.
pub fn is_day_selectable(day: DayKey, today: DayKey, has_data: bool) -> bool {
    day <= today && (day == today || has_data)
}
