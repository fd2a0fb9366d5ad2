use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod app;
mod config;
mod csv_export;
mod dashboard;
mod models;
mod router;
mod views;

use api::{ApiClient, ScreeningApi};
use app::App;
use config::{Config, ConfigArgs};
use models::RecordId;
use router::Route;

#[derive(Parser)]
#[command(name = "resume-screener", version, about)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Screen to open first: /, /create-role or /role/<id>
    #[arg(long, default_value = "/")]
    open: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard (the default)
    Dashboard,
    /// Fetch a role's results and write candidate_evaluation_results.csv
    Export {
        /// Role identifier
        #[arg(long)]
        role: String,
        /// Directory to write into (defaults to the configured export dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing
    let cli = Cli::parse();
    let config = Config::resolve(cli.config)?;

    init_logging(&config)?;
    info!("Starting resume-screener v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let client = ApiClient::new(&config.api_base_url);
    info!(base_url = client.base_url(), "using screening backend");
    let api: Arc<dyn ScreeningApi> = Arc::new(client);

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Dashboard => {
            let _guard = runtime.enter();
            let mut app = App::new(api, &config, Route::parse(&cli.open));
            dashboard::run_dashboard(&mut app)?;
            info!(route = %app.route(), "dashboard closed");
        }
        Command::Export { role, out_dir } => {
            let dir = out_dir.unwrap_or_else(|| config.export_dir.clone());
            let results = runtime
                .block_on(api.get_role_results(&RecordId::new(role)))
                .context("fetching results")?;
            let path = csv_export::save_export(&dir, &results)?;
            println!("Exported {} results to {}", results.len(), path.display());
        }
    }

    info!("resume-screener exiting");
    Ok(())
}

/// The dashboard owns the terminal, so logs go to a file.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("opening log file {}", config.log_file.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=info", env!("CARGO_CRATE_NAME")))
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}
