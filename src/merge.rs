//! Merge-on-write: reconcile a partial update against the stored record.

use crate::model::{LogEntry, LogPatch};

/// Compute the full record to persist from the stored baseline and a
/// partial update. Omitted fields keep the stored value, explicit clears
/// overwrite with absent, explicit values overwrite.
///
/// Callers are responsible for only passing `existing = None` when the
/// store genuinely holds no record for the day; an unreachable store must
/// abort the operation instead (see the sync coordinator), otherwise the
/// merge would clobber stored fields outside the patch.
pub fn resolve(existing: Option<&LogEntry>, patch: &LogPatch) -> LogEntry {
    let base = existing.cloned().unwrap_or_default();
    LogEntry {
        am_in: patch.am_in.resolve(base.am_in),
        am_out: patch.am_out.resolve(base.am_out),
        pm_in: patch.pm_in.resolve(base.pm_in),
        pm_out: patch.pm_out.resolve(base.pm_out),
        activity: patch.activity.resolve(base.activity),
        accomplished: patch.accomplished.resolve(base.accomplished),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, PunchSlot};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, 0, 0).unwrap()
    }

    fn stored() -> LogEntry {
        LogEntry {
            am_in: Some(at(8)),
            am_out: Some(at(12)),
            activity: Some("triage".into()),
            ..LogEntry::default()
        }
    }

    #[test]
    fn omitted_fields_are_preserved() {
        let merged = resolve(Some(&stored()), &LogPatch::punch(PunchSlot::PmIn, at(13)));
        assert_eq!(merged.am_in, Some(at(8)));
        assert_eq!(merged.am_out, Some(at(12)));
        assert_eq!(merged.pm_in, Some(at(13)));
        assert_eq!(merged.activity.as_deref(), Some("triage"));
        assert_eq!(merged.pm_out, None);
    }

    #[test]
    fn explicit_clear_overwrites_and_does_not_cascade() {
        let merged = resolve(Some(&stored()), &LogPatch::clear(PunchSlot::AmIn));
        assert_eq!(merged.am_in, None);
        // the dependent later slot is intentionally left in place
        assert_eq!(merged.am_out, Some(at(12)));
    }

    #[test]
    fn resolve_is_idempotent() {
        let patch = LogPatch {
            am_in: Field::Clear,
            pm_in: Field::Set(at(13)),
            activity: Field::Set("review".into()),
            ..LogPatch::default()
        };
        let once = resolve(Some(&stored()), &patch);
        let twice = resolve(Some(&once), &patch);
        assert_eq!(once, twice);
    }

    #[test]
    fn absent_baseline_yields_only_patch_fields() {
        let merged = resolve(None, &LogPatch::punch(PunchSlot::AmIn, at(8)));
        assert_eq!(merged.am_in, Some(at(8)));
        assert!(merged.am_out.is_none());
        assert!(merged.activity.is_none());
    }

    #[test]
    fn empty_patch_returns_baseline_unchanged() {
        let merged = resolve(Some(&stored()), &LogPatch::default());
        assert_eq!(merged, stored());
    }
}
