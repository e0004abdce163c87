use activity_sync::collect::{
    CalendarEntry, CommitWindow, GitLabClient, RepositorySpec, commit_events, mentoring_events,
};
use activity_sync::storage::json::{read_json, write_json_atomic};
use activity_sync::{
    EventSink, HttpEventSink, IncomingEvent, JsonWorkspace, LogObserver, SyncConfig, SyncService,
};
use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "activity-sync")]
#[command(about = "Reconcile collected activity events with the monthly activity ledger")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge an events file into a JSON ledger workspace
    Reconcile {
        #[arg(long)]
        workspace: PathBuf,
        #[arg(long)]
        events: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Collect commit and mentoring events for one day
    Collect {
        #[arg(long)]
        calendar: Option<PathBuf>,
        /// Collection day, defaults to yesterday
        #[arg(long)]
        day: Option<NaiveDate>,
        #[arg(long)]
        out: PathBuf,
    },
    /// POST an events file to the configured delivery URL
    Deliver {
        #[arg(long)]
        events: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Reconcile {
            workspace,
            events,
            dry_run,
        } => {
            let dry_run = dry_run || config.dry_run;
            reconcile(config.dry_run(dry_run), &workspace, &events)
        }
        Command::Collect { calendar, day, out } => {
            collect(&config, calendar.as_deref(), day, &out).await
        }
        Command::Deliver { events } => deliver(&config, &events).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    match path {
        Some(path) => SyncConfig::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display())),
        None => Ok(SyncConfig::default()),
    }
}

fn reconcile(config: SyncConfig, workspace: &Path, events: &Path) -> Result<()> {
    let events: Vec<IncomingEvent> = read_json(events)
        .with_context(|| format!("Failed to read events '{}'", events.display()))?;
    let mut workspace = JsonWorkspace::open(workspace)
        .with_context(|| format!("Failed to open workspace '{}'", workspace.display()))?;

    let observer = LogObserver;
    let report = SyncService::with_observer(config, &observer)
        .run_on(&mut workspace, events)
        .context("Reconciliation failed")?;

    println!(
        "events={} resolved={} dropped={} inserted={} updated={}{}",
        report.stats.events,
        report.stats.resolved,
        report.stats.dropped,
        report.inserted(),
        report.updated(),
        if report.dry_run { " (dry run)" } else { "" }
    );
    if report.dry_run {
        println!("{}", serde_json::to_string_pretty(&report.changes)?);
    }
    Ok(())
}

async fn collect(
    config: &SyncConfig,
    calendar: Option<&Path>,
    day: Option<NaiveDate>,
    out: &Path,
) -> Result<()> {
    let day = match day {
        Some(day) => day,
        None => Local::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .context("Cannot compute yesterday")?,
    };

    let specs = config
        .source_control
        .repositories
        .iter()
        .map(|entry| RepositorySpec::parse(entry, &config.source_control.separator))
        .collect::<activity_sync::Result<Vec<_>>>()?;

    let mut events = Vec::new();
    if !specs.is_empty() {
        let client = GitLabClient::new(config.source_control.token.as_deref())?;
        let window = CommitWindow::ending(day, config.source_control.lookback_days);
        let repositories = client
            .collect(&specs, window)
            .await
            .context("Failed to fetch commits")?;
        events.extend(commit_events(&repositories));
    }

    if let Some(path) = calendar {
        let entries: Vec<CalendarEntry> = read_json(path)
            .with_context(|| format!("Failed to read calendar '{}'", path.display()))?;
        events.extend(mentoring_events(&entries, day, &config.mentoring_activity));
    }

    write_json_atomic(out, &events)
        .with_context(|| format!("Failed to write events '{}'", out.display()))?;
    println!("collected {} events for {}", events.len(), day);
    Ok(())
}

async fn deliver(config: &SyncConfig, events: &Path) -> Result<()> {
    let events: Vec<IncomingEvent> = read_json(events)
        .with_context(|| format!("Failed to read events '{}'", events.display()))?;
    let sink = HttpEventSink::from_config(&config.delivery)?;
    sink.deliver(&events).await.context("Delivery failed")?;
    println!("delivered {} events", events.len());
    Ok(())
}
