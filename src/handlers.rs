//! CLI command handlers. Thin presentation over the session: validate via
//! the engine and policy, surface per-channel sync status, keep the output
//! plain.

use crate::engine;
use crate::model::{DayKey, LogEntry, PunchSlot, SyncStatus};
use crate::policy;
use crate::session::{PunchReceipt, Session};
use crate::sheet::{model::clock_time, MirrorService};
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use std::io::{self, Write};
use tracing::instrument;

#[instrument(skip_all)]
pub async fn punch<M: MirrorService>(session: &mut Session<M>, slot: PunchSlot) -> Result<()> {
    let now = Utc::now();
    let PunchReceipt { entry, day_complete } = session.punch(now.date_naive(), slot, now).await?;

    println!("{} recorded at {}", slot, display_time(entry.slot(slot)));
    report_sheet_state(session.sync_status());

    if day_complete {
        // Let the terminal punch land on screen before switching stages.
        tokio::time::sleep(engine::REPORT_STAGE_DELAY).await;
        println!("Day complete. Submit your report with `punchlog report --activity ... --accomplished ...`");
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn clear<M: MirrorService>(
    session: &mut Session<M>,
    slot: PunchSlot,
    assume_yes: bool,
) -> Result<()> {
    if !assume_yes && !confirm(&format!("Clear {}? [y/N] ", slot))? {
        println!("Aborted.");
        return Ok(());
    }

    let now = Utc::now();
    session.clear(now.date_naive(), slot, now).await?;
    println!("{} cleared", slot);
    Ok(())
}

#[instrument(skip_all)]
pub async fn report<M: MirrorService>(
    session: &mut Session<M>,
    activity: Option<String>,
    accomplished: Option<String>,
) -> Result<()> {
    let now = Utc::now();
    let status = session
        .submit_report(
            now.date_naive(),
            activity.unwrap_or_default(),
            accomplished.unwrap_or_default(),
            now,
        )
        .await?;

    println!("primary store: {}", status.db);
    println!("sheet mirror:  {}", status.sheet);
    report_sheet_state(status);
    Ok(())
}

pub fn show<M: MirrorService>(session: &Session<M>, day: Option<DayKey>) -> Result<()> {
    let now = Utc::now();
    let today = now.date_naive();
    let day = day.unwrap_or(today);

    if !session.is_selectable(day, today) {
        anyhow::bail!("{} is not viewable (future day, or past day with no data)", day);
    }

    let empty = LogEntry::default();
    let entry = session.entry(day).unwrap_or(&empty);
    let next = engine::next_slot(entry).filter(|_| day == today);

    println!("{}{}", day, if day == today { " (today)" } else { " (read-only)" });
    for slot in PunchSlot::ALL {
        let value = entry.slot(slot);
        let marker = if Some(slot) == next {
            "  <- next"
        } else if value.is_some() && !policy::is_punch_editable(entry, slot, day, now) {
            "  (locked)"
        } else {
            ""
        };
        println!("  {:<22} {}{}", slot.label(), display_time(value), marker);
    }
    println!("  activity:     {}", entry.activity.as_deref().unwrap_or("--"));
    println!("  accomplished: {}", entry.accomplished.as_deref().unwrap_or("--"));
    Ok(())
}

pub fn list<M: MirrorService>(session: &Session<M>) {
    let today = Utc::now().date_naive();
    let days = session.book().days();
    if days.is_empty() {
        println!("No days recorded yet.");
        return;
    }
    for day in days {
        let empty = LogEntry::default();
        let entry = session.entry(day).unwrap_or(&empty);
        let punches = PunchSlot::ALL.iter().filter(|s| entry.slot(**s).is_some()).count();
        let reported = entry.activity.as_deref().is_some_and(|s| !s.is_empty())
            || entry.accomplished.as_deref().is_some_and(|s| !s.is_empty());
        println!(
            "{}{}  punches: {}/4{}",
            day,
            if day == today { " (today)" } else { "" },
            punches,
            if reported { "  report: yes" } else { "" }
        );
    }
}

fn report_sheet_state(status: SyncStatus) {
    if status.sheet == crate::model::ChannelState::Error {
        println!("note: the sheet mirror failed; the primary record is saved and the mirror is best-effort");
    }
}

fn display_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(_) => clock_time(at, &Local),
        None => "--:--".to_string(),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
