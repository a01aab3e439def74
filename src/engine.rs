//! Punch state machine: which of the four slots accepts a new punch, and
//! the patches produced by punching or clearing one.
//!
//! Everything here is pure and synchronous; persistence happens in the
//! sync coordinator.

use crate::model::{LogEntry, LogPatch, PunchSlot};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Grace period before the caller advances to the report stage after the
/// terminal `pm_out` punch. Acknowledges the UI transition; nothing in the
/// engine waits on it.
pub const REPORT_STAGE_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PunchError {
    #[error("{0} is already recorded")]
    AlreadyPunched(PunchSlot),
    #[error("cannot record {slot} before {missing}")]
    OutOfOrder { slot: PunchSlot, missing: PunchSlot },
}

/// Result of a validated punch: the patch to persist and whether this punch
/// completed the workday (terminal `pm_out` transition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunchOutcome {
    pub patch: LogPatch,
    pub day_complete: bool,
}

/// A slot accepts a punch iff it is empty and its predecessor is filled.
pub fn is_slot_eligible(entry: &LogEntry, slot: PunchSlot) -> bool {
    if entry.slot(slot).is_some() {
        return false;
    }
    match slot.predecessor() {
        Some(prev) => entry.slot(prev).is_some(),
        None => true,
    }
}

/// The single currently eligible slot, or none once the day is complete.
pub fn next_slot(entry: &LogEntry) -> Option<PunchSlot> {
    PunchSlot::ALL.into_iter().find(|s| is_slot_eligible(entry, *s))
}

/// Validate a punch request and produce the patch setting `slot` to `now`.
pub fn punch(entry: &LogEntry, slot: PunchSlot, now: DateTime<Utc>) -> Result<PunchOutcome, PunchError> {
    if entry.slot(slot).is_some() {
        return Err(PunchError::AlreadyPunched(slot));
    }
    if !is_slot_eligible(entry, slot) {
        // predecessor() is Some here: a predecessor-less slot with an empty
        // value is always eligible.
        let missing = slot.predecessor().unwrap_or(slot);
        return Err(PunchError::OutOfOrder { slot, missing });
    }
    Ok(PunchOutcome {
        patch: LogPatch::punch(slot, now),
        day_complete: slot == PunchSlot::PmOut,
    })
}

/// Patch explicitly clearing one slot. Clearing is unconditional on slot
/// position and does not cascade: clearing `am_in` while `am_out` is set
/// leaves an out-of-order record. Known invariant gap, kept as observable
/// behavior.
pub fn clear_slot(slot: PunchSlot) -> LogPatch {
    LogPatch::clear(slot)
}
