use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar-day key for a log record. Always a plain calendar date in the
/// UTC reference frame; rendered forms exist only at the mirror boundary.
pub type DayKey = NaiveDate;

/// The four daily punch slots, in workday order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PunchSlot {
    AmIn,
    AmOut,
    PmIn,
    PmOut,
}

impl PunchSlot {
    pub const ALL: [PunchSlot; 4] = [
        PunchSlot::AmIn,
        PunchSlot::AmOut,
        PunchSlot::PmIn,
        PunchSlot::PmOut,
    ];

    /// The slot that must be punched before this one, if any.
    pub fn predecessor(&self) -> Option<PunchSlot> {
        match self {
            PunchSlot::AmIn => None,
            PunchSlot::AmOut => Some(PunchSlot::AmIn),
            PunchSlot::PmIn => Some(PunchSlot::AmOut),
            PunchSlot::PmOut => Some(PunchSlot::PmIn),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PunchSlot::AmIn => "morning time-in",
            PunchSlot::AmOut => "morning time-out",
            PunchSlot::PmIn => "afternoon time-in",
            PunchSlot::PmOut => "afternoon time-out",
        }
    }
}

impl fmt::Display for PunchSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PunchSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "am-in" | "amin" => Ok(PunchSlot::AmIn),
            "am-out" | "amout" => Ok(PunchSlot::AmOut),
            "pm-in" | "pmin" => Ok(PunchSlot::PmIn),
            "pm-out" | "pmout" => Ok(PunchSlot::PmOut),
            other => Err(format!(
                "unknown punch slot '{}' (expected am-in, am-out, pm-in or pm-out)",
                other
            )),
        }
    }
}

/// One day's attendance record: four punch instants and the end-of-day
/// report text. The punch fields are conceptually ordered
/// `am_in <= am_out <= pm_in <= pm_out`, but only slot eligibility is
/// enforced, never chronological consistency of stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub am_in: Option<DateTime<Utc>>,
    pub am_out: Option<DateTime<Utc>>,
    pub pm_in: Option<DateTime<Utc>>,
    pub pm_out: Option<DateTime<Utc>>,
    pub activity: Option<String>,
    pub accomplished: Option<String>,
}

impl LogEntry {
    pub fn slot(&self, slot: PunchSlot) -> Option<DateTime<Utc>> {
        match slot {
            PunchSlot::AmIn => self.am_in,
            PunchSlot::AmOut => self.am_out,
            PunchSlot::PmIn => self.pm_in,
            PunchSlot::PmOut => self.pm_out,
        }
    }

    pub fn set_slot(&mut self, slot: PunchSlot, value: Option<DateTime<Utc>>) {
        match slot {
            PunchSlot::AmIn => self.am_in = value,
            PunchSlot::AmOut => self.am_out = value,
            PunchSlot::PmIn => self.pm_in = value,
            PunchSlot::PmOut => self.pm_out = value,
        }
    }

    pub fn has_punches(&self) -> bool {
        PunchSlot::ALL.iter().any(|s| self.slot(*s).is_some())
    }

    /// True when nothing at all is recorded: no punches and no report text.
    pub fn is_empty(&self) -> bool {
        !self.has_punches()
            && self.activity.as_deref().map_or(true, str::is_empty)
            && self.accomplished.as_deref().map_or(true, str::is_empty)
    }
}

/// Tri-state update for a single field. `Omitted` preserves whatever is
/// stored, `Clear` overwrites with absent, `Set` overwrites with a value.
/// An explicit clear is a write, never a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Omitted,
    Clear,
    Set(T),
}

// Hand-written so Field<T> defaults to Omitted without requiring T: Default.
impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Omitted
    }
}

impl<T: Clone> Field<T> {
    /// Resolve this update against the stored value.
    pub fn resolve(&self, existing: Option<T>) -> Option<T> {
        match self {
            Field::Omitted => existing,
            Field::Clear => None,
            Field::Set(value) => Some(value.clone()),
        }
    }
}

impl<T> Field<T> {
    pub fn is_omitted(&self) -> bool {
        matches!(self, Field::Omitted)
    }
}

/// Partial update for one day's record, one tri-state per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPatch {
    pub am_in: Field<DateTime<Utc>>,
    pub am_out: Field<DateTime<Utc>>,
    pub pm_in: Field<DateTime<Utc>>,
    pub pm_out: Field<DateTime<Utc>>,
    pub activity: Field<String>,
    pub accomplished: Field<String>,
}

impl LogPatch {
    /// A patch recording `at` into a single slot.
    pub fn punch(slot: PunchSlot, at: DateTime<Utc>) -> Self {
        let mut patch = Self::default();
        *patch.slot_mut(slot) = Field::Set(at);
        patch
    }

    /// A patch explicitly clearing a single slot.
    pub fn clear(slot: PunchSlot) -> Self {
        let mut patch = Self::default();
        *patch.slot_mut(slot) = Field::Clear;
        patch
    }

    /// A patch writing both report fields. Empty strings are written as-is;
    /// submitting an empty report is a valid write.
    pub fn report(activity: String, accomplished: String) -> Self {
        Self {
            activity: Field::Set(activity),
            accomplished: Field::Set(accomplished),
            ..Self::default()
        }
    }

    pub fn slot_mut(&mut self, slot: PunchSlot) -> &mut Field<DateTime<Utc>> {
        match slot {
            PunchSlot::AmIn => &mut self.am_in,
            PunchSlot::AmOut => &mut self.am_out,
            PunchSlot::PmIn => &mut self.pm_in,
            PunchSlot::PmOut => &mut self.pm_out,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.am_in.is_omitted()
            && self.am_out.is_omitted()
            && self.pm_in.is_omitted()
            && self.pm_out.is_omitted()
            && self.activity.is_omitted()
            && self.accomplished.is_omitted()
    }
}

/// Outcome state of one sync channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChannelState {
    Waiting,
    Loading,
    Success,
    Error,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelState::Waiting => "waiting",
            ChannelState::Loading => "loading",
            ChannelState::Success => "success",
            ChannelState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Two-channel sync outcome: the primary store and the sheet mirror report
/// independently. A partial failure leaves the pair partially set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatus {
    pub db: ChannelState,
    pub sheet: ChannelState,
}

impl SyncStatus {
    pub fn waiting() -> Self {
        Self {
            db: ChannelState::Waiting,
            sheet: ChannelState::Waiting,
        }
    }

    pub fn loading() -> Self {
        Self {
            db: ChannelState::Loading,
            sheet: ChannelState::Loading,
        }
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::waiting()
    }
}
