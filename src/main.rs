use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use punchlog::{config, db, handlers, model::PunchSlot, session::Session, sheet::SheetClient};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record the current time into a punch slot (am-in, am-out, pm-in, pm-out)
    Punch { slot: PunchSlot },
    /// Clear a recorded punch (asks for confirmation)
    Clear {
        slot: PunchSlot,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Submit the end-of-day report
    Report {
        #[arg(long)]
        activity: Option<String>,
        #[arg(long)]
        accomplished: Option<String>,
    },
    /// Show one day's record (defaults to today)
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List all recorded days
    List,
    /// Print an example config.yaml
    ConfigExample,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    if matches!(args.command, Command::ConfigExample) {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/punchlog.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let mirror = SheetClient::from_config(&cfg)?;
    let mut session = Session::open(pool, mirror, &cfg).await?;
    info!(days = session.book().len(), "session opened");

    match args.command {
        Command::Punch { slot } => handlers::punch(&mut session, slot).await?,
        Command::Clear { slot, yes } => handlers::clear(&mut session, slot, yes).await?,
        Command::Report { activity, accomplished } => {
            handlers::report(&mut session, activity, accomplished).await?
        }
        Command::Show { date } => handlers::show(&session, date)?,
        Command::List => handlers::list(&session),
        Command::ConfigExample => unreachable!("handled above"),
    }

    Ok(())
}
