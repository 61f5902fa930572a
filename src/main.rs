//! Dremio snapshot - main entry point
//!
//! Reads `dremio_api_properties.json`, refreshes the access token when the
//! stored one is rejected, queries the snapshot dataset and writes it to
//! stdout as tab-delimited text. Diagnostics go to stderr; every failure
//! exits with status 1.

use anyhow::{Context, Result};
use clap::Parser;
use dremio_snapshot::config::{self, PropertiesFile};
use dremio_snapshot::dremio::{DremioClient, DremioError, HttpTransport, PollPolicy, TokioSleeper};
use dremio_snapshot::{output, pipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "dremio_snapshot", version, about)]
struct Cli {
    /// Path to the JSON properties file
    #[arg(long, short, default_value = config::PROPERTY_FILENAME)]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Usage errors exit 1 like every other failure
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // If stderr is closed there is nowhere left to write; the exit code still reports it
            e.print().ok();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let store = PropertiesFile::new(&cli.config);
    let mut settings = store.load()?;

    let transport = HttpTransport::new(settings.verify_certificates)
        .context("Failed to create HTTP client")?;
    let client = DremioClient::new(transport);
    let target = pipeline::snapshot_dataset()?;

    let snapshot = pipeline::take_snapshot(
        &client,
        &mut settings,
        &store,
        TokioSleeper,
        PollPolicy::default(),
        &target,
    )
    .await?;

    let stdout = std::io::stdout();
    output::write_tab_delimited(&mut stdout.lock(), &snapshot.fields, &snapshot.records)?;
    Ok(())
}

/// Print a failure to stderr, with the template for a missing properties file
fn report(error: &anyhow::Error) {
    match error
        .downcast_ref::<DremioError>()
        .and_then(config::settings_failure_message)
    {
        Some(message) => eprint!("{}", message),
        None => eprintln!("✗ {:#}", error),
    }
}
