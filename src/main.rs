use analyzer::Analyzer;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use configuration::Config;
use core_types::DateRange;
use std::{net::SocketAddr, path::PathBuf};
use uuid::Uuid;

mod import;
mod report;

/// The main entry point for the Trade Diary application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if present
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;
    let _log_guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args, &mut config).await,
        Commands::Import(args) => handle_import(args, &config).await,
        Commands::Report(args) => handle_report(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A personal crypto trading journal with behavioural analytics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Import closed bot trades from a .csv or .json export.
    Import(ImportArgs),
    /// Print the performance summary and insights for a user.
    Report(ReportArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to listen on (e.g., "0.0.0.0:5000"); overrides the configuration.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Keep trades in process memory instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,
}

#[derive(Parser)]
struct ImportArgs {
    /// The user the trades belong to.
    #[arg(long)]
    user: Uuid,

    /// The export file to read.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Parser)]
struct ReportArgs {
    /// The user to report on.
    #[arg(long)]
    user: Uuid,

    /// Only include trades entered on or after this date (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only include trades entered on or before this date (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, config: &mut Config) -> anyhow::Result<()> {
    if let Some(addr) = args.addr {
        config.server.host = addr.ip().to_string();
        config.server.port = addr.port();
    }

    let store = web_server::open_store(config, args.in_memory).await?;
    web_server::run_server(config, store).await
}

async fn handle_import(args: ImportArgs, config: &Config) -> anyhow::Result<()> {
    let rows = import::load_import_file(&args.file)?;
    tracing::info!(file = %args.file.display(), rows = rows.len(), "Loaded bot export.");

    let store = web_server::open_store(config, false).await?;
    let trades = store
        .import_bot_trades(args.user, rows)
        .await
        .context("Import rejected; no trades were stored")?;

    println!("{} trades imported successfully.", trades.len());
    Ok(())
}

async fn handle_report(args: ReportArgs, config: &Config) -> anyhow::Result<()> {
    let range = date_range(args.from, args.to)?;

    let store = web_server::open_store(config, false).await?;
    let analyzer = Analyzer::new(store);

    let summary = analyzer.summary(args.user, range).await?;
    let emotions = analyzer.by_emotion(args.user).await?;
    let insights = analyzer.insights(args.user).await?;

    println!("Summary");
    println!("{}", report::summary_table(&summary));
    if !emotions.is_empty() {
        println!("\nBy Emotion");
        println!("{}", report::emotion_table(&emotions));
    }
    println!("\nInsights");
    println!("{}", report::insights_table(&insights.insights));

    Ok(())
}

/// Turns inclusive calendar-day bounds into a UTC range: `from` starts at
/// midnight and `to` runs to the last second of the day.
fn date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> anyhow::Result<Option<DateRange>> {
    let start = from.map(start_of_day).transpose()?;
    let end = to.map(end_of_day).transpose()?;
    let range = DateRange::new(start, end)?;
    Ok((!range.is_unbounded()).then_some(range))
}

fn start_of_day(date: NaiveDate) -> anyhow::Result<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("{} has no midnight", date))
}

fn end_of_day(date: NaiveDate) -> anyhow::Result<DateTime<Utc>> {
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("{} has no end of day", date))
}
