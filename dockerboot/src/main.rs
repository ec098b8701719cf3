use std::error::Error;
use std::process::ExitCode;

use tracing::{debug, instrument, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod cli;

use dockerboot_oci as oci;
use dockerboot_state as state;

use crate::cli::Cli;
use crate::state::{Outcome, Report, StateConfig};

fn initialize_tracing() {
    // Initialize tracing subscriber for human-readable logs
    tracing_subscriber::registry()
        .with(
            // Use some log defaults. These can be overriden using
            // RUST_LOG
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hyper=error,bollard=error")),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .event_format(fmt::format().compact().with_target(false)),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    initialize_tracing();

    let cli = cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        // failures have already been logged
        Ok(false) | Err(_) => ExitCode::FAILURE,
    }
}

/// Run the selected command, returning false if any service failed
#[instrument(name = "dockerboot", skip_all, err)]
async fn run(cli: Cli) -> Result<bool, Box<dyn Error>> {
    debug!(
        manifest = %cli.manifest.display(),
        endpoint = %cli.endpoint,
        command = ?cli.command,
        "using config:"
    );

    let state::Resources {
        docker,
        desired,
        observed,
    } = state::prepare(StateConfig {
        manifest: cli.manifest,
        endpoint: cli.endpoint,
    })
    .await?;

    let reports = state::dispatch(cli.command.into(), &desired, &observed, &docker).await;

    Ok(reports.iter().fold(true, |ok, report| summarize(report) && ok))
}

/// Log a summary of the report, returning true if every service succeeded
fn summarize(report: &Report) -> bool {
    let failed: Vec<&str> = report.failures().map(|(name, _)| name).collect();
    let done = report
        .iter()
        .filter(|(_, o)| !matches!(o, Outcome::Failed(_)))
        .count();

    if failed.is_empty() {
        debug!("{}: {done} services processed", report.action());
        true
    } else {
        warn!(
            "{}: {done} services processed, {} failed: {}",
            report.action(),
            failed.len(),
            failed.join(", ")
        );
        false
    }
}
