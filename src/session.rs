//! Per-session orchestration: validate a requested edit, run the sync
//! pipeline, and keep the in-memory book consistent with the primary store.
//!
//! Cache updates are two-phase: a tentative local apply before the sync,
//! committed with the coordinator's authoritative merged record on success
//! and rolled back on failure. The book never keeps a write the store
//! rejected.

use crate::config::Config;
use crate::db::{self, Pool};
use crate::engine;
use crate::merge;
use crate::model::{DayKey, LogEntry, LogPatch, PunchSlot, SyncStatus};
use crate::policy;
use crate::sheet::MirrorService;
use crate::store::LogBook;
use crate::sync::SyncCoordinator;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

/// Result of a successful punch: the persisted record and whether the
/// workday just completed (terminal `pm_out`).
#[derive(Debug, Clone)]
pub struct PunchReceipt {
    pub entry: LogEntry,
    pub day_complete: bool,
}

pub struct Session<M: MirrorService> {
    book: LogBook,
    coordinator: SyncCoordinator<M>,
}

impl<M: MirrorService> Session<M> {
    /// Open a session: bulk-load every stored day into the book, then hold
    /// the coordinator for the lifetime of the session. No re-fetch happens
    /// after this point.
    pub async fn open(pool: Pool, mirror: Option<M>, cfg: &Config) -> Result<Self> {
        let records = db::fetch_all_logs(&pool)
            .await
            .context("failed to load stored logs")?;
        let book = LogBook::load(records);
        let coordinator = SyncCoordinator::new(
            pool,
            mirror,
            cfg.request_timeout(),
            cfg.app.primary_write_attempts,
        );
        Ok(Self { book, coordinator })
    }

    pub fn book(&self) -> &LogBook {
        &self.book
    }

    pub fn entry(&self, day: DayKey) -> Option<&LogEntry> {
        self.book.get(day)
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.coordinator.status()
    }

    pub fn is_selectable(&self, day: DayKey, today: DayKey) -> bool {
        policy::is_day_selectable(day, today, self.book.has_data(day))
    }

    /// Record the current instant into `slot`. Only today's log accepts
    /// punches; slot order is enforced by the engine.
    pub async fn punch(&mut self, day: DayKey, slot: PunchSlot, now: DateTime<Utc>) -> Result<PunchReceipt> {
        let today = now.date_naive();
        if day != today {
            bail!("{} is read-only; punches are only accepted for today ({})", day, today);
        }

        let entry = self.book.get(day).cloned().unwrap_or_default();
        let outcome = engine::punch(&entry, slot, now)?;

        let merged = self.persist(day, &entry, &outcome.patch).await?;
        Ok(PunchReceipt {
            entry: merged,
            day_complete: outcome.day_complete,
        })
    }

    /// Clear a recorded punch. Subject to the edit-lock window; clearing
    /// does not cascade to dependent later slots.
    pub async fn clear(&mut self, day: DayKey, slot: PunchSlot, now: DateTime<Utc>) -> Result<LogEntry> {
        let today = now.date_naive();
        if day != today {
            bail!("{} is read-only; only today's log can be edited", day);
        }

        let entry = self.book.get(day).cloned().unwrap_or_default();
        if entry.slot(slot).is_none() {
            bail!("{} has no recorded time to clear", slot);
        }
        if !policy::is_punch_editable(&entry, slot, day, now) {
            bail!("{} was recorded more than an hour ago and is locked", slot);
        }

        let patch = engine::clear_slot(slot);
        self.persist(day, &entry, &patch).await
    }

    /// Submit the end-of-day report. Resets the status pair to waiting
    /// before the sync so the caller observes a full lifecycle.
    pub async fn submit_report(
        &mut self,
        day: DayKey,
        activity: String,
        accomplished: String,
        now: DateTime<Utc>,
    ) -> Result<SyncStatus> {
        if !policy::is_report_editable(day, now.date_naive()) {
            bail!("the report for {} is view-only; reports can only be submitted for today", day);
        }

        self.coordinator.reset_status();
        let entry = self.book.get(day).cloned().unwrap_or_default();
        let patch = LogPatch::report(activity, accomplished);
        self.persist(day, &entry, &patch).await?;
        Ok(self.coordinator.status())
    }

    /// Two-phase write: tentative local merge into the book, sync, then
    /// commit the store's merged record or restore the previous state.
    async fn persist(&mut self, day: DayKey, entry: &LogEntry, patch: &LogPatch) -> Result<LogEntry> {
        let tentative = merge::resolve(Some(entry), patch);
        let previous = self.book.apply(day, tentative);

        match self.coordinator.sync(day, patch).await {
            Ok(merged) => {
                self.book.apply(day, merged.clone());
                Ok(merged)
            }
            Err(err) => {
                self.book.restore(day, previous);
                Err(err.into())
            }
        }
    }
}
