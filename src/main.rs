use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

mod auth;
mod config;
mod console;
mod db;
mod errors;
mod export;
mod input;
mod marks;
mod models;
mod roster;
mod session;
mod sink;
mod store;
mod submission;

use crate::db::PgStore;
use crate::export::{ExportOutcome, ExportService};
use crate::models::Operator;
use crate::roster::Roster;
use crate::session::AttendanceSession;
use crate::sink::{SheetFormat, DEFAULT_EXPORT_FILE};
use crate::store::AttendanceStore;
use crate::submission::SubmissionService;

#[derive(Parser)]
#[command(name = "roll-call")]
#[command(about = "Classroom attendance taking and roll-call export", long_about = None)]
struct Cli {
    /// Roster CSV with roll_number,name,group columns
    #[arg(long, global = true, default_value = "roster.csv")]
    roster: PathBuf,
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Fixed timezone for export column labels
    #[arg(long, global = true, default_value = "+05:30", allow_hyphen_values = true)]
    utc_offset: String,
    /// Maximum attendance rows requested per page during export
    #[arg(long, global = true, default_value_t = 1000)]
    page_size: i64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Credentials {
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Create an operator account or reset its password
    AddOperator {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Take attendance interactively
    #[command(group(
        ArgGroup::new("start")
            .args(["group", "position"])
            .multiple(false)
    ))]
    Take {
        /// Group label to start in
        #[arg(long)]
        group: Option<String>,
        /// 1-based position within the group
        #[arg(long, default_value_t = 1)]
        from: usize,
        /// 1-based position in the whole roster
        #[arg(long)]
        position: Option<usize>,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Export the roll-call matrix to a spreadsheet
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = SheetFormat::Xlsx)]
        format: SheetFormat,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// List recorded sessions
    Sessions {
        /// Print JSON instead of a list
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        credentials: Credentials,
    },
}

async fn sign_in(store: &dyn AttendanceStore, credentials: Credentials) -> anyhow::Result<Operator> {
    let username = config::resolve_credential(credentials.username, config::USERNAME_VAR)?;
    let password = config::resolve_credential(credentials.password, config::PASSWORD_VAR)?;
    Ok(auth::authenticate(store, &username, &password).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::setup_logging(&cli.log_level);

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the attendance Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool.clone());

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::AddOperator { username, password } => {
            db::add_operator(&pool, &username, &password).await?;
            println!("Operator {username} saved.");
        }
        Commands::Take {
            group,
            from,
            position,
            credentials,
        } => {
            let roster = Roster::from_csv(&cli.roster)
                .with_context(|| format!("failed to load roster {}", cli.roster.display()))?;
            let operator = sign_in(&store, credentials).await?;

            let start = match (group, position) {
                (Some(group), _) => roster.start_position(&group, from)?,
                (None, Some(position)) => position,
                (None, None) => from,
            };

            let service = SubmissionService::new(&store, &roster);
            let mut session = AttendanceSession::new(&roster);
            session.start(start)?;
            info!(operator = %operator.username, start, "attendance session opened");

            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            let receipts =
                console::run_take(&mut session, &service, &mut stdin.lock(), &mut stdout).await?;
            for receipt in &receipts {
                info!(
                    session = %receipt.session.id,
                    operator = %operator.username,
                    "attendance session recorded"
                );
            }
            if receipts.is_empty() {
                println!("Closed without submitting.");
            } else {
                println!("{} session(s) submitted.", receipts.len());
            }
        }
        Commands::Export {
            out,
            format,
            credentials,
        } => {
            let roster = Roster::from_csv(&cli.roster)
                .with_context(|| format!("failed to load roster {}", cli.roster.display()))?;
            sign_in(&store, credentials).await?;
            let offset = config::parse_utc_offset(&cli.utc_offset)?;
            anyhow::ensure!(cli.page_size >= 1, "--page-size must be at least 1");

            let service = ExportService::new(&store, &roster, cli.page_size, offset);
            match service.build_export_matrix().await? {
                ExportOutcome::NoRecords => println!("No attendance records found."),
                ExportOutcome::Sheet(sheet) => {
                    let out = out.unwrap_or_else(|| match format {
                        SheetFormat::Xlsx => PathBuf::from(DEFAULT_EXPORT_FILE),
                        SheetFormat::Csv => PathBuf::from(DEFAULT_EXPORT_FILE).with_extension("csv"),
                    });
                    format.sink().write(&sheet, &out)?;
                    println!(
                        "Exported {} students across {} sessions to {}.",
                        roster.len(),
                        sheet.session_columns(),
                        out.display()
                    );
                }
            }
        }
        Commands::Sessions { json, credentials } => {
            sign_in(&store, credentials).await?;
            let offset = config::parse_utc_offset(&cli.utc_offset)?;
            let summaries = store.session_summaries().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
                return Ok(());
            }

            if summaries.is_empty() {
                println!("No attendance records found.");
                return Ok(());
            }

            println!("Recorded sessions:");
            for summary in &summaries {
                println!(
                    "- {} {} present, {} absent, {} unmarked{}",
                    export::column_label(&summary.session, offset),
                    summary.present,
                    summary.absent,
                    summary.unmarked,
                    if summary.session.remark.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", summary.session.remark)
                    }
                );
            }
        }
    }

    Ok(())
}
