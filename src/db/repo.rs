use super::model::LogRow;
use crate::model::{DayKey, LogEntry};
use anyhow::Result;
use sqlx::SqlitePool;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous=FULL;").execute(&pool).await?;
    Ok(pool)
}

/// For file-backed SQLite URLs, expand a leading `~/` and make sure the
/// parent directory exists. In-memory and non-sqlite URLs pass through.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }

    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() {
        return url.to_string();
    }

    let path = match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path.to_string(),
    };
    if let Some(parent) = std::path::Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query {
        Some(q) => format!("sqlite://{}?{}", path, q),
        None => format!("sqlite://{}", path),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Fetch the stored record for one day, if any.
#[instrument(skip_all)]
pub async fn fetch_log(pool: &Pool, day: DayKey) -> Result<Option<LogEntry>> {
    let row = sqlx::query_as::<_, LogRow>(
        "SELECT day_key, am_in, am_out, pm_in, pm_out, activity, accomplished \
         FROM logs WHERE day_key = ?",
    )
    .bind(day)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.into_parts().1))
}

/// Bulk fetch of every persisted day, ordered by day key.
#[instrument(skip_all)]
pub async fn fetch_all_logs(pool: &Pool) -> Result<Vec<(DayKey, LogEntry)>> {
    let rows = sqlx::query_as::<_, LogRow>(
        "SELECT day_key, am_in, am_out, pm_in, pm_out, activity, accomplished \
         FROM logs ORDER BY day_key ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(LogRow::into_parts).collect())
}

/// Idempotent upsert keyed by day. Writes the full record; NULLs overwrite,
/// so a cleared field is persisted as cleared.
#[instrument(skip_all)]
pub async fn upsert_log(pool: &Pool, day: DayKey, entry: &LogEntry) -> Result<()> {
    sqlx::query(
        "INSERT INTO logs (day_key, am_in, am_out, pm_in, pm_out, activity, accomplished) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(day_key) DO UPDATE SET \
            am_in = excluded.am_in, \
            am_out = excluded.am_out, \
            pm_in = excluded.pm_in, \
            pm_out = excluded.pm_out, \
            activity = excluded.activity, \
            accomplished = excluded.accomplished, \
            updated_at = datetime('now')",
    )
    .bind(day)
    .bind(entry.am_in)
    .bind(entry.am_out)
    .bind(entry.pm_in)
    .bind(entry.pm_out)
    .bind(entry.activity.as_deref())
    .bind(entry.accomplished.as_deref())
    .execute(pool)
    .await?;
    Ok(())
}
