use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gleaner_client::{HtmlExtractor, ReqwestFetcher};
use gleaner_core::models::{ExtractionOutcome, StoredResult};
use gleaner_core::{
    HarvestService, PoliteFetcher, PolitenessConfig, ScrapeRequest, ScrapeService,
    TracingWorkerReporter, WorkerConfig, WorkerPool,
};
use gleaner_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "gleaner", version, about = "Web content extraction and ingestion engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and extract one or more URLs, recording every attempt
    Scrape {
        /// Task the results are recorded under
        #[arg(short, long)]
        task_id: i64,

        /// URLs to scrape; a missing scheme defaults to https
        #[arg(required = true)]
        urls: Vec<String>,

        /// Maximum number of URLs processed at once
        #[arg(short, long, env = "GLEANER_WORKERS", default_value_t = 4)]
        workers: usize,

        /// Per-URL deadline for the fetch stage, in seconds
        #[arg(long, env = "GLEANER_JOB_DEADLINE_SECS", default_value_t = 90)]
        deadline_secs: u64,
    },

    /// Show stored results for a task, newest first
    Results {
        #[arg(short, long)]
        task_id: i64,

        /// Number of results to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Show aggregate statistics for a task
    Stats {
        #[arg(short, long)]
        task_id: i64,
    },

    /// Delete results and statistics older than the given number of days
    Purge {
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },

    /// Record new same-domain links found on a monitored page
    Harvest {
        /// Page to monitor; a missing scheme defaults to https
        #[arg(short, long)]
        url: String,
    },

    /// Inspect or clear discovered updates
    Updates {
        #[command(subcommand)]
        action: UpdatesAction,
    },
}

#[derive(Subcommand)]
enum UpdatesAction {
    /// List discovered updates, newest first
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete one discovered update
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Delete every discovered update
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gleaner=info".parse()?))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let db = connect_db().await?;

    match cli.command {
        Commands::Scrape {
            task_id,
            urls,
            workers,
            deadline_secs,
        } => cmd_scrape(&db, task_id, urls, workers, deadline_secs).await?,
        Commands::Results {
            task_id,
            limit,
            format,
        } => cmd_results(&db, task_id, limit, format).await?,
        Commands::Stats { task_id } => {
            let summary = db
                .result_repo()
                .query_stats_summary(task_id)
                .await
                .context("Failed to load statistics")?;
            print_json(&summary)?;
        }
        Commands::Purge { days } => {
            let report = db
                .result_repo()
                .purge_older_than(days)
                .await
                .context("Failed to purge old data")?;
            print_json(&report)?;
        }
        Commands::Harvest { url } => cmd_harvest(&db, &url).await?,
        Commands::Updates { action } => cmd_updates(&db, action).await?,
    }

    Ok(())
}

/// Open the database named by `DATABASE_URL` and bring its schema up to date.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .with_context(|| format!("Failed to open database {}", config.url))?;
    db.migrate().await?;
    db.result_repo()
        .health_check()
        .await
        .context("Database health check failed")?;
    Ok(db)
}

/// Cancelled on Ctrl-C so in-flight fetches stop and queued URLs are skipped.
fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

async fn cmd_scrape(
    db: &Database,
    task_id: i64,
    urls: Vec<String>,
    workers: usize,
    deadline_secs: u64,
) -> Result<()> {
    let fetcher = PoliteFetcher::new(
        ReqwestFetcher::for_extraction().context("Failed to create HTTP client")?,
        PolitenessConfig::default(),
    );
    let service = ScrapeService::with_store(fetcher, HtmlExtractor::new(), db.result_repo());
    let config = WorkerConfig::default()
        .with_max_workers(workers)
        .with_job_deadline(Duration::from_secs(deadline_secs));
    let pool = WorkerPool::new(service, config);

    let requests = urls
        .into_iter()
        .map(|url| ScrapeRequest::new(task_id, url))
        .collect();
    let outcomes = pool
        .run(requests, shutdown_token(), &TracingWorkerReporter)
        .await;

    let failed = outcomes
        .iter()
        .filter(|o| !o.result.outcome.is_success())
        .count();
    tracing::info!(
        task_id,
        scraped = outcomes.len(),
        failed,
        "Scrape finished"
    );

    print_json(&outcomes)
}

async fn cmd_results(
    db: &Database,
    task_id: i64,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let results = db
        .result_repo()
        .query_results(task_id, limit)
        .await
        .context("Failed to load results")?;

    match format {
        OutputFormat::Json => print_json(&results),
        OutputFormat::Csv => write_csv(&results),
    }
}

/// One flat CSV line per stored result. The structured payload is omitted.
#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    task_id: i64,
    url: &'a str,
    status: &'static str,
    title: Option<&'a str>,
    error_message: Option<&'a str>,
    status_code: Option<u16>,
    response_time: f64,
    content_size: u64,
    scraped_at: String,
}

impl<'a> From<&'a StoredResult> for CsvRow<'a> {
    fn from(stored: &'a StoredResult) -> Self {
        let result = &stored.result;
        let (title, error_message) = match &result.outcome {
            ExtractionOutcome::Success { title, .. } => (title.as_deref(), None),
            ExtractionOutcome::Error { message } => (None, Some(message.as_str())),
        };
        CsvRow {
            id: stored.id,
            task_id: result.task_id,
            url: &result.url,
            status: result.outcome.status().as_str(),
            title,
            error_message,
            status_code: result.status_code,
            response_time: result.response_time,
            content_size: result.content_size,
            scraped_at: result.scraped_at.to_rfc3339(),
        }
    }
}

fn write_csv(results: &[StoredResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    for stored in results {
        writer
            .serialize(CsvRow::from(stored))
            .context("Failed to write CSV row")?;
    }
    writer.flush()?;
    Ok(())
}

async fn cmd_harvest(db: &Database, url: &str) -> Result<()> {
    let fetcher = PoliteFetcher::new(
        ReqwestFetcher::for_harvesting().context("Failed to create HTTP client")?,
        PolitenessConfig::default(),
    );
    let harvester = HarvestService::new(fetcher, HtmlExtractor::new(), db.update_repo());

    let report = harvester
        .harvest(url, &shutdown_token())
        .await
        .with_context(|| format!("Failed to harvest {url}"))?;

    tracing::info!("{}", report.message);
    print_json(&report)
}

async fn cmd_updates(db: &Database, action: UpdatesAction) -> Result<()> {
    let repo = db.update_repo();
    match action {
        UpdatesAction::List { limit } => {
            let updates = repo
                .list_updates(limit)
                .await
                .context("Failed to list updates")?;
            print_json(&updates)
        }
        UpdatesAction::Delete { id } => {
            if repo.delete_update(id).await? {
                println!("Deleted update {id}");
            } else {
                println!("No update with id {id}");
            }
            Ok(())
        }
        UpdatesAction::Clear => {
            let deleted = repo.delete_all_updates().await?;
            println!("Deleted {deleted} updates");
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
