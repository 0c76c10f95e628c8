use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{error, info};

use subsurface_cloud::cli::Cli;
use subsurface_cloud::cloud::DownloadOrchestrator;
use subsurface_cloud::config::Settings;
use subsurface_cloud::models::DownloadConfiguration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "subsurface_cloud=info,subsurface_cloud_download=info");
    }

    // Log to both console and a per-run file
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    std::fs::create_dir_all(&cli.log_dir)
        .with_context(|| format!("Cannot create log directory: {}", cli.log_dir.display()))?;
    let log_name = format!("log_{}.log", Local::now().format("%Y-%m-%dT%H_%M_%S"));
    let file_appender = tracing_appender::rolling::never(&cli.log_dir, log_name);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env())
        )
        .init();

    info!("Starting download using config: {}", cli.configuration.display());
    let configuration = DownloadConfiguration::from_file(&cli.configuration)?;

    let mut settings = Settings::from_env()?;
    if let Some(block) = &configuration.cloud {
        settings = settings.with_overrides(block);
    }

    let orchestrator = DownloadOrchestrator::from_settings(settings)
        .context("Failed to create HTTP client")?;
    let errors = orchestrator.process_and_run_download(&configuration).await;

    if errors.is_empty() {
        info!("Download finished successfully");
        return Ok(());
    }

    for e in &errors {
        error!("{}", e);
    }
    if let Some(fatal) = errors.iter().find(|e| e.is_fatal()) {
        bail!("Download aborted: {}", fatal);
    }
    bail!("Download finished with {} errors, please check logs", errors.len())
}
