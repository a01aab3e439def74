//! Two-channel synchronization coordinator.
//!
//! `sync` runs a strictly sequential pipeline (fetch baseline, merge,
//! primary upsert, best-effort mirror push) and tracks a per-channel
//! status pair. Each stage is awaited before the next; merge correctness
//! depends on the ordering.

use crate::db::{self, Pool};
use crate::merge;
use crate::model::{ChannelState, DayKey, LogEntry, LogPatch, SyncStatus};
use crate::sheet::MirrorService;
use anyhow::anyhow;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Pause between primary-write retries. The mirror is never retried.
const PRIMARY_RETRY_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum SyncError {
    /// The stored baseline could not be fetched. The operation aborts
    /// before any write: merging against an assumed-empty baseline would
    /// clobber stored fields outside the patch.
    #[error("cannot load the stored record for {day}: {source}")]
    BaselineUnavailable { day: DayKey, source: anyhow::Error },
    /// The primary upsert failed after the configured attempts. The mirror
    /// stage is never reached and the whole call fails.
    #[error("primary write failed for {day}: {source}")]
    PrimaryWriteFailed { day: DayKey, source: anyhow::Error },
}

pub struct SyncCoordinator<M: MirrorService> {
    pool: Pool,
    mirror: Option<M>,
    status: SyncStatus,
    op_timeout: Duration,
    primary_attempts: u32,
}

impl<M: MirrorService> SyncCoordinator<M> {
    pub fn new(pool: Pool, mirror: Option<M>, op_timeout: Duration, primary_attempts: u32) -> Self {
        Self {
            pool,
            mirror,
            status: SyncStatus::waiting(),
            op_timeout,
            primary_attempts: primary_attempts.max(1),
        }
    }

    /// Current per-channel status. Snapshot; re-read after each sync.
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Reset both channels to waiting, ahead of a report-submit sync.
    pub fn reset_status(&mut self) {
        self.status = SyncStatus::waiting();
    }

    /// Persist `patch` for `day` and mirror the merged record when the
    /// trigger condition holds. Returns the merged record as persisted.
    #[instrument(skip_all, fields(%day))]
    pub async fn sync(&mut self, day: DayKey, patch: &LogPatch) -> Result<LogEntry, SyncError> {
        self.status = SyncStatus::loading();

        let existing = match timeout(self.op_timeout, db::fetch_log(&self.pool, day)).await {
            Ok(Ok(existing)) => existing,
            Ok(Err(err)) => return Err(self.abort_primary(day, err, Stage::Baseline)),
            Err(_) => {
                let err = anyhow!("timed out after {:?}", self.op_timeout);
                return Err(self.abort_primary(day, err, Stage::Baseline));
            }
        };

        let merged = merge::resolve(existing.as_ref(), patch);

        if let Err(err) = self.write_primary(day, &merged).await {
            return Err(self.abort_primary(day, err, Stage::Write));
        }
        self.status.db = ChannelState::Success;
        info!("primary record persisted");

        let sheet_state = match &self.mirror {
            Some(mirror) if should_mirror(&merged) => {
                self.push_mirror(mirror, day, &merged).await
            }
            Some(_) => {
                debug!("mirror trigger condition not met; skipping mirror write");
                ChannelState::Waiting
            }
            None => {
                debug!("no mirror configured; skipping mirror write");
                ChannelState::Waiting
            }
        };
        self.status.sheet = sheet_state;

        Ok(merged)
    }

    async fn write_primary(&self, day: DayKey, merged: &LogEntry) -> anyhow::Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match timeout(self.op_timeout, db::upsert_log(&self.pool, day, merged)).await
            {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(err)) => err,
                Err(_) => anyhow!("timed out after {:?}", self.op_timeout),
            };
            if attempt >= self.primary_attempts {
                return Err(err);
            }
            warn!(?err, attempt, "primary write failed; retrying");
            tokio::time::sleep(PRIMARY_RETRY_DELAY).await;
        }
    }

    /// One best-effort mirror call. Failures of any shape are logged and
    /// reported on the sheet channel only; they never fail the sync.
    async fn push_mirror(&self, mirror: &M, day: DayKey, merged: &LogEntry) -> ChannelState {
        match timeout(self.op_timeout, mirror.push_day(day, merged)).await {
            Ok(Ok(response)) => {
                for line in &response.logs {
                    debug!(%line, "sheet script log");
                }
                if response.is_not_found() {
                    warn!("day not present in sheet; mirror reported not_found");
                    ChannelState::Error
                } else {
                    info!("mirror record updated");
                    ChannelState::Success
                }
            }
            Ok(Err(err)) => {
                warn!(?err, "mirror write failed");
                ChannelState::Error
            }
            Err(_) => {
                warn!(timeout = ?self.op_timeout, "mirror write timed out");
                ChannelState::Error
            }
        }
    }

    /// Mark the primary channel failed before the mirror stage ran; the
    /// sheet channel drops back to waiting since it was never attempted.
    fn abort_primary(&mut self, day: DayKey, source: anyhow::Error, stage: Stage) -> SyncError {
        self.status.db = ChannelState::Error;
        self.status.sheet = ChannelState::Waiting;
        match stage {
            Stage::Baseline => SyncError::BaselineUnavailable { day, source },
            Stage::Write => SyncError::PrimaryWriteFailed { day, source },
        }
    }
}

enum Stage {
    Baseline,
    Write,
}

/// Mirror trigger: at least one of the report fields, the opening punch or
/// the terminal punch must be present. Empty text does not count.
pub fn should_mirror(entry: &LogEntry) -> bool {
    entry.activity.as_deref().is_some_and(|s| !s.is_empty())
        || entry.accomplished.as_deref().is_some_and(|s| !s.is_empty())
        || entry.am_in.is_some()
        || entry.pm_out.is_some()
}
