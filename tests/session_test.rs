use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use punchlog::config::{self, Config};
use punchlog::db;
use punchlog::model::{ChannelState, DayKey, LogEntry, PunchSlot};
use punchlog::session::Session;
use punchlog::sheet::{MirrorService, SheetResponse};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn test_config() -> Config {
    let mut cfg: Config = serde_yaml::from_str(config::example()).unwrap();
    cfg.app.primary_write_attempts = 1;
    cfg
}

fn ok_response() -> SheetResponse {
    serde_json::from_str(r#"{"result":"success"}"#).unwrap()
}

#[derive(Clone, Default)]
struct RecordingMirror {
    responses: Arc<Mutex<VecDeque<Result<SheetResponse>>>>,
    calls: Arc<Mutex<Vec<(DayKey, LogEntry)>>>,
}

impl RecordingMirror {
    async fn calls(&self) -> Vec<(DayKey, LogEntry)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl MirrorService for RecordingMirror {
    async fn push_day(&self, day: DayKey, entry: &LogEntry) -> Result<SheetResponse> {
        self.calls.lock().await.push((day, entry.clone()));
        let mut guard = self.responses.lock().await;
        guard.pop_front().unwrap_or_else(|| Ok(ok_response()))
    }
}

async fn open_session(
    pool: sqlx::SqlitePool,
    mirror: RecordingMirror,
) -> Session<RecordingMirror> {
    Session::open(pool, Some(mirror), &test_config()).await.unwrap()
}

#[tokio::test]
async fn full_workday_punch_flow() {
    let pool = setup_pool().await;
    let mut session = open_session(pool.clone(), RecordingMirror::default()).await;

    let now = Utc::now();
    let today = now.date_naive();

    let receipt = session.punch(today, PunchSlot::AmIn, now).await.unwrap();
    assert!(!receipt.day_complete);

    session.punch(today, PunchSlot::AmOut, now).await.unwrap();
    session.punch(today, PunchSlot::PmIn, now).await.unwrap();
    let receipt = session.punch(today, PunchSlot::PmOut, now).await.unwrap();
    assert!(receipt.day_complete, "pm_out is the terminal transition");

    // cache and primary store agree
    let cached = session.entry(today).unwrap().clone();
    let stored = db::fetch_log(&pool, today).await.unwrap().unwrap();
    assert_eq!(cached, stored);
    assert!(stored.am_in.is_some() && stored.pm_out.is_some());
}

#[tokio::test]
async fn out_of_order_punch_is_rejected_locally() {
    let pool = setup_pool().await;
    let mut session = open_session(pool.clone(), RecordingMirror::default()).await;

    let now = Utc::now();
    let err = session
        .punch(now.date_naive(), PunchSlot::PmOut, now)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("before"));
    assert!(db::fetch_log(&pool, now.date_naive()).await.unwrap().is_none());
}

#[tokio::test]
async fn punching_another_day_is_rejected() {
    let pool = setup_pool().await;
    let mut session = open_session(pool, RecordingMirror::default()).await;

    let now = Utc::now();
    let yesterday = now.date_naive().pred_opt().unwrap();
    let err = session.punch(yesterday, PunchSlot::AmIn, now).await.unwrap_err();
    assert!(err.to_string().contains("read-only"));
}

#[tokio::test]
async fn failed_primary_write_rolls_the_cache_back() {
    let pool = setup_pool().await;
    sqlx::query(
        "CREATE TRIGGER block_log_writes BEFORE INSERT ON logs \
         BEGIN SELECT RAISE(ABORT, 'writes disabled'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mut session = open_session(pool, RecordingMirror::default()).await;
    let now = Utc::now();
    let today = now.date_naive();

    let err = session.punch(today, PunchSlot::AmIn, now).await.unwrap_err();
    assert!(err.to_string().contains("primary write failed"));

    // the tentative local apply must not survive the failed persist
    assert!(session.entry(today).is_none());
    assert!(!session.book().has_data(today));
}

#[tokio::test]
async fn report_submit_updates_both_channels() {
    let pool = setup_pool().await;
    let mirror = RecordingMirror::default();
    let mut session = open_session(pool.clone(), mirror.clone()).await;

    let now = Utc::now();
    let today = now.date_naive();
    session.punch(today, PunchSlot::AmIn, now).await.unwrap();

    let status = session
        .submit_report(today, "wrote the report".into(), "shipped it".into(), now)
        .await
        .unwrap();
    assert_eq!(status.db, ChannelState::Success);
    assert_eq!(status.sheet, ChannelState::Success);

    let (pushed_day, pushed_entry) = mirror.calls().await.pop().unwrap();
    assert_eq!(pushed_day, today);
    assert_eq!(pushed_entry.activity.as_deref(), Some("wrote the report"));
    assert_eq!(pushed_entry.am_in, session.entry(today).unwrap().am_in);

    let stored = db::fetch_log(&pool, today).await.unwrap().unwrap();
    assert_eq!(stored.accomplished.as_deref(), Some("shipped it"));
}

#[tokio::test]
async fn report_for_another_day_is_view_only() {
    let pool = setup_pool().await;
    let mut session = open_session(pool, RecordingMirror::default()).await;

    let now = Utc::now();
    let yesterday = now.date_naive().pred_opt().unwrap();
    let err = session
        .submit_report(yesterday, "late".into(), String::new(), now)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("view-only"));
}

#[tokio::test]
async fn clear_keeps_the_dependent_later_slot() {
    let pool = setup_pool().await;
    let mut session = open_session(pool.clone(), RecordingMirror::default()).await;

    let now = Utc::now();
    let today = now.date_naive();
    session.punch(today, PunchSlot::AmIn, now).await.unwrap();
    session.punch(today, PunchSlot::AmOut, now).await.unwrap();

    let entry = session.clear(today, PunchSlot::AmIn, now).await.unwrap();
    assert!(entry.am_in.is_none());
    assert!(entry.am_out.is_some(), "clearing must not cascade");

    let stored = db::fetch_log(&pool, today).await.unwrap().unwrap();
    assert!(stored.am_in.is_none());
    assert!(stored.am_out.is_some());
}

#[tokio::test]
async fn clear_respects_the_edit_lock_window() {
    let pool = setup_pool().await;
    let now = Utc::now();
    let today = now.date_naive();
    db::upsert_log(
        &pool,
        today,
        &LogEntry {
            am_in: Some(now - ChronoDuration::hours(2)),
            ..LogEntry::default()
        },
    )
    .await
    .unwrap();

    let mut session = open_session(pool, RecordingMirror::default()).await;
    let err = session.clear(today, PunchSlot::AmIn, now).await.unwrap_err();
    assert!(err.to_string().contains("locked"));

    let err = session.clear(today, PunchSlot::PmIn, now).await.unwrap_err();
    assert!(err.to_string().contains("no recorded time"));
}

#[tokio::test]
async fn session_loads_stored_days_on_open() {
    let pool = setup_pool().await;
    let now = Utc::now();
    let today = now.date_naive();
    let yesterday = today.pred_opt().unwrap();
    db::upsert_log(
        &pool,
        yesterday,
        &LogEntry {
            am_in: Some(now - ChronoDuration::days(1)),
            ..LogEntry::default()
        },
    )
    .await
    .unwrap();

    let session = open_session(pool, RecordingMirror::default()).await;
    assert_eq!(session.book().len(), 1);
    assert!(session.is_selectable(yesterday, today));
    assert!(session.is_selectable(today, today));
    assert!(!session.is_selectable(today.succ_opt().unwrap(), today));
    // a dataless past day is not navigable
    assert!(!session.is_selectable(yesterday.pred_opt().unwrap(), today));
}
