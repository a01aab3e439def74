//! Session-owned cache of all known days.
//!
//! Constructed once per session from a bulk fetch and mutated only by the
//! session after adapter acknowledgment; there is no implicit re-fetch and
//! no background writer, so no interior locking is needed.

use crate::model::{DayKey, LogEntry};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct LogBook {
    entries: HashMap<DayKey, LogEntry>,
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load-on-init from the primary store's bulk fetch.
    pub fn load(records: impl IntoIterator<Item = (DayKey, LogEntry)>) -> Self {
        Self {
            entries: records.into_iter().collect(),
        }
    }

    pub fn get(&self, day: DayKey) -> Option<&LogEntry> {
        self.entries.get(&day)
    }

    /// Whether the day holds any recorded data. Feeds day selectability.
    pub fn has_data(&self, day: DayKey) -> bool {
        self.entries.get(&day).is_some_and(|e| !e.is_empty())
    }

    /// Replace the entry for `day`, returning the previous one so a failed
    /// persist can be rolled back with [`restore`](Self::restore).
    pub fn apply(&mut self, day: DayKey, entry: LogEntry) -> Option<LogEntry> {
        self.entries.insert(day, entry)
    }

    /// Undo a tentative [`apply`](Self::apply).
    pub fn restore(&mut self, day: DayKey, previous: Option<LogEntry>) {
        match previous {
            Some(entry) => {
                self.entries.insert(day, entry);
            }
            None => {
                self.entries.remove(&day);
            }
        }
    }

    pub fn days(&self) -> Vec<DayKey> {
        let mut days: Vec<_> = self.entries.keys().copied().collect();
        days.sort();
        days
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day(d: u32) -> DayKey {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn punched_entry() -> LogEntry {
        LogEntry {
            am_in: Some(Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()),
            ..LogEntry::default()
        }
    }

    #[test]
    fn apply_then_restore_roundtrips() {
        let mut book = LogBook::new();
        let previous = book.apply(day(10), punched_entry());
        assert!(previous.is_none());
        assert!(book.has_data(day(10)));

        book.restore(day(10), previous);
        assert!(book.get(day(10)).is_none());
    }

    #[test]
    fn restore_reinstates_prior_entry() {
        let mut book = LogBook::load([(day(10), punched_entry())]);
        let mut updated = punched_entry();
        updated.activity = Some("afternoon review".into());

        let previous = book.apply(day(10), updated);
        book.restore(day(10), previous);
        assert_eq!(book.get(day(10)), Some(&punched_entry()));
    }

    #[test]
    fn empty_entries_do_not_count_as_data() {
        let book = LogBook::load([(day(10), LogEntry::default())]);
        assert!(book.get(day(10)).is_some());
        assert!(!book.has_data(day(10)));
    }

    #[test]
    fn days_are_sorted() {
        let book = LogBook::load([
            (day(12), punched_entry()),
            (day(10), punched_entry()),
            (day(11), punched_entry()),
        ]);
        assert_eq!(book.days(), vec![day(10), day(11), day(12)]);
    }
}
