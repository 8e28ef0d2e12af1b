//! CLI for reconstructing play time from a match log
//!
//! Reads either an exported JSON event list or the live database and prints
//! one line per player as of the given cursor.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use matchday_core::common::{AggregateRef, MatchId, TeamInMatchId};
use matchday_core::config::Config;
use matchday_core::domains::game_events::{GameEvent, GameTime};
use matchday_core::domains::timeline::{PlayTimeResult, Timeline};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "playtime_report")]
#[command(about = "Per-player play time at a match cursor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct from a JSON file holding an array of events
    File {
        path: PathBuf,
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Reconstruct from the game_events table (needs DATABASE_URL)
    Db {
        #[arg(long)]
        match_id: MatchId,
        #[arg(long)]
        team_in_match_id: TeamInMatchId,
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Apply pending database migrations (needs DATABASE_URL)
    Migrate,
}

#[derive(Args)]
struct ReportArgs {
    /// Cursor period label, e.g. "2" or "OT1"
    #[arg(long)]
    period: String,

    /// Cursor seconds into the period
    #[arg(long)]
    second: u32,

    /// Overrides PERIOD_LENGTH_SECONDS
    #[arg(long)]
    period_length: Option<u32>,

    /// Print JSON lines instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ReportLine<'a> {
    name: String,
    #[serde(flatten)]
    result: &'a PlayTimeResult,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,matchday_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::File { path, report } => cmd_file(&config, &path, &report),
        Commands::Db {
            match_id,
            team_in_match_id,
            report,
        } => cmd_db(&config, AggregateRef::new(match_id, team_in_match_id), &report).await,
        Commands::Migrate => cmd_migrate(&config).await,
    }
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_file(config: &Config, path: &Path, report: &ReportArgs) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let events: Vec<GameEvent> =
        serde_json::from_str(&raw).context("Event file must be a JSON array of events")?;

    tracing::info!(events = events.len(), path = %path.display(), "loaded event export");
    print_report(config, &events, report)
}

async fn cmd_db(config: &Config, aggregate: AggregateRef, report: &ReportArgs) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(config.require_database_url()?)
        .await
        .context("Failed to connect to database")?;

    let events = GameEvent::find_by_aggregate(aggregate, &pool).await?;
    tracing::info!(aggregate = %aggregate, events = events.len(), "loaded match log");
    print_report(config, &events, report)
}

async fn cmd_migrate(config: &Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(config.require_database_url()?)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");
    Ok(())
}

fn print_report(config: &Config, events: &[GameEvent], report: &ReportArgs) -> Result<()> {
    let mut periods = config.period_scheme();
    if let Some(length) = report.period_length {
        periods.period_length_seconds = length;
    }
    let categories = config.category_table()?;
    let cursor = GameTime::new(report.period.clone(), report.second);

    let timeline = Timeline::new(events, &categories, &periods);
    let mut results = timeline.play_time_for_all(&cursor);
    results.sort_by(|a, b| b.seconds.cmp(&a.seconds));

    if report.json {
        for result in &results {
            let line = ReportLine {
                name: result.player.to_string(),
                result,
            };
            println!("{}", serde_json::to_string(&line)?);
        }
        return Ok(());
    }

    println!("Play time at {}", cursor);
    for result in &results {
        println!(
            "{:<40} {:>4}:{:02} {}",
            result.player.to_string(),
            result.minutes,
            result.seconds % 60,
            if result.on_field { "on" } else { "off" }
        );
    }
    Ok(())
}
