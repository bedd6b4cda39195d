//! idesk - terminal client for the Interview Support dashboard

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use idesk_cli::client::{ApiClient, ReportQuery, DEFAULT_SERVER};
use idesk_cli::MismatchBoard;
use idesk_common::api::StatusPatch;
use idesk_common::bson;
use idesk_common::rounds::CANONICAL_ROUNDS;
use idesk_common::subject::validation_issues;
use idesk_common::{MismatchRecord, TaskRecord};
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "idesk")]
#[command(about = "Terminal client for the Interview Support dashboard")]
#[command(version)]
struct Args {
    /// idesk-api base URL
    #[arg(long, env = "IDESK_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream tasks whose round is not one of the allowed values
    Mismatches {
        /// Only show rows whose candidate name or reason contains this
        #[arg(long)]
        search: Option<String>,

        /// Set this round on every listed task
        #[arg(long)]
        fix: Option<String>,
    },
    /// Set or clear the round override on one task
    FixRound {
        id: String,

        /// Allowed round label, e.g. "Final Round"
        #[arg(required_unless_present = "clear")]
        round: Option<String>,

        /// Remove the override instead
        #[arg(long, conflicts_with = "round")]
        clear: bool,
    },
    /// Stream tasks and check their subject lines
    Validations {
        /// Substring of receivedDateTime, e.g. 2026-01-26; live feed when absent
        #[arg(long)]
        date: Option<String>,

        /// Print passing tasks too
        #[arg(long)]
        all: bool,
    },
    /// Set the status on one or more tasks
    SetStatus {
        status: String,

        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Per-branch counts by status and round
    Report {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,

        /// Last day (inclusive), YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,

        /// interview or received
        #[arg(long)]
        date_field: Option<String>,
    },
    /// List the allowed round labels
    Rounds,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idesk_cli=warn,idesk_common=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let client = ApiClient::new(&args.server).context("Failed to build HTTP client")?;

    match args.command {
        Command::Mismatches { search, fix } => mismatches(&client, search.as_deref(), fix.as_deref()).await,
        Command::FixRound { id, round, clear } => fix_round(&client, &id, round.as_deref(), clear).await,
        Command::Validations { date, all } => validations(&client, date.as_deref(), all).await,
        Command::SetStatus { status, ids } => set_status(&client, status, ids).await,
        Command::Report {
            start,
            end,
            date_field,
        } => {
            let query = ReportQuery {
                start_date: start,
                end_date: end,
                date_field,
            };
            let report = client.report(&query).await.context("Report request failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Rounds => {
            for round in CANONICAL_ROUNDS {
                println!("{}", round);
            }
            Ok(())
        }
    }
}

async fn mismatches(client: &ApiClient, search: Option<&str>, fix: Option<&str>) -> Result<()> {
    let mut feed = client
        .mismatches()
        .await
        .with_context(|| format!("Failed to open mismatch feed at {}", client.base_url()))?;

    let mut board = MismatchBoard::new();
    while let Some(record) = feed.next().await {
        let record = record.context("Mismatch feed interrupted")?;
        if search.map_or(true, |q| MismatchBoard::matches(&record, q)) {
            print_mismatch(&record);
            board.push(record);
        }
    }
    println!("{} mismatches", board.len());

    if let Some(round) = fix {
        let ids = board.ids();
        let count = board
            .fix_rounds(client, &ids, round)
            .await
            .context("Bulk round update failed; local changes rolled back")?;
        println!("Set '{}' on {} tasks", round, count);
    }

    Ok(())
}

fn print_mismatch(record: &MismatchRecord) {
    println!(
        "{}\t{}\t{}\t{}",
        record.id().unwrap_or("-"),
        record.current_round().unwrap_or("-"),
        record.str_field("Candidate Name").unwrap_or("-"),
        record.subject().unwrap_or("-"),
    );
}

async fn fix_round(client: &ApiClient, id: &str, round: Option<&str>, clear: bool) -> Result<()> {
    let mut board = MismatchBoard::new();

    if clear {
        board
            .clear_round(client, id)
            .await
            .with_context(|| format!("Failed to clear round on {}", id))?;
        println!("Cleared round override on {}", id);
        return Ok(());
    }

    let Some(round) = round else {
        bail!("A round is required unless --clear is given");
    };
    board
        .fix_round(client, id, round)
        .await
        .with_context(|| format!("Failed to set round on {}", id))?;
    println!("Set '{}' on {}", round, id);
    Ok(())
}

async fn validations(client: &ApiClient, date: Option<&str>, all: bool) -> Result<()> {
    let mut feed = client
        .validations(date)
        .await
        .with_context(|| format!("Failed to open validation feed at {}", client.base_url()))?;

    let (mut passed, mut failed) = (0usize, 0usize);
    while let Some(value) = feed.next().await {
        let value = value.context("Validation feed interrupted")?;
        let Some(task) = to_task(&value) else {
            continue;
        };

        let issues = validation_issues(&task);
        let id = task.id_string().unwrap_or_else(|| "-".to_string());
        if issues.is_empty() {
            passed += 1;
            if all {
                println!("{}\tPassed", id);
            }
        } else {
            failed += 1;
            for issue in issues {
                println!("{}\t{}", id, issue);
            }
        }
    }

    println!("{} passed, {} with issues", passed, failed);
    Ok(())
}

fn to_task(value: &Value) -> Option<TaskRecord> {
    match bson::to_document(value) {
        Ok(doc) => Some(TaskRecord::new(doc)),
        Err(e) => {
            warn!("Skipping non-object feed record: {}", e);
            None
        }
    }
}

async fn set_status(client: &ApiClient, status: String, ids: Vec<String>) -> Result<()> {
    let patch = if ids.len() == 1 {
        StatusPatch {
            id: ids.into_iter().next(),
            ids: None,
            status: Some(status.clone()),
        }
    } else {
        StatusPatch {
            id: None,
            ids: Some(ids),
            status: Some(status.clone()),
        }
    };

    let response = client.patch_status(&patch).await.context("Status update failed")?;
    match response.count {
        Some(count) => println!("Set '{}' on {} tasks", status, count),
        None => println!("Set '{}'", status),
    }
    Ok(())
}
