// src/main.rs
use std::{fs, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rostersync_core::{
    server::{router, AppState},
    AppConfig, CsvWorkbook, InMemoryResultStore, ProcessingLog, Reconciler, SourceFile,
};

#[derive(Parser, Debug)]
#[command(name = "rostersync", about = "Reconcile duty rosters into a monthly attendance sheet")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP upload service
    Serve,
    /// Reconcile local CSV files
    Run {
        /// Monthly attendance sheet
        #[arg(long)]
        attendance: PathBuf,
        /// Roster file; repeat once per roster
        #[arg(long = "roster", required = true)]
        rosters: Vec<PathBuf>,
        /// Day covered by each roster, in the same order as --roster
        #[arg(long = "day", required = true, value_parser = clap::value_parser!(u32).range(1..))]
        days: Vec<u32>,
        /// Where to write the updated attendance sheet
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Loading configuration failed")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;
    info!("Tracing subscriber initialized.");

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => serve(config).await,
        Command::Run {
            attendance,
            rosters,
            days,
            output,
        } => run_local(&config, &attendance, &rosters, &days, &output),
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let settings = config.settings().context("Invalid shift configuration")?;
    let state = AppState {
        settings: Arc::new(settings),
        io: Arc::new(CsvWorkbook::new()),
        store: Arc::new(InMemoryResultStore::new()),
    };
    info!("Application state initialized.");

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Binding {} failed", addr))?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")?;
    Ok(())
}

fn read_source(path: &PathBuf) -> Result<SourceFile> {
    let bytes = fs::read(path).with_context(|| format!("Reading {} failed", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(name, bytes))
}

fn run_local(
    config: &AppConfig,
    attendance: &PathBuf,
    rosters: &[PathBuf],
    days: &[u32],
    output: &PathBuf,
) -> Result<()> {
    if rosters.len() != days.len() {
        bail!(
            "{} roster files but {} --day values; give one day per roster",
            rosters.len(),
            days.len()
        );
    }
    let settings = config.settings().context("Invalid shift configuration")?;
    let io = CsvWorkbook::new();
    let attendance_file = read_source(attendance)?;
    let roster_files = rosters.iter().map(read_source).collect::<Result<Vec<_>>>()?;

    let mut log = ProcessingLog::new();
    let reconciler = Reconciler::new(&settings, &io);
    let result = match reconciler.process_files(&roster_files, days, &attendance_file, &mut log) {
        Ok(result) => result,
        Err(e) => {
            error!("Reconciliation failed: {}", e);
            for line in log.lines() {
                eprintln!("{}", line);
            }
            return Err(e).context("Reconciliation failed");
        }
    };

    fs::write(output, &result.file_content)
        .with_context(|| format!("Writing {} failed", output.display()))?;
    for line in &result.logs {
        println!("{}", line);
    }
    info!("Wrote {}", output.display());
    Ok(())
}
