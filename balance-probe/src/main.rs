use std::process::ExitCode;

use anyhow::Result;
use balance_probe::{
    config::AppConfig,
    observability,
    pipeline::Probe,
    sinks::SeriesFile,
    sources::PortalHttpSource,
};

/// One run: a single confirmation line on stdout, or a single error line on
/// stderr and a failure exit status.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    let probe = Probe {
        source: PortalHttpSource::new(&cfg.portal, &cfg.accounts)?,
        store: SeriesFile::new(&cfg.store.path),
    };

    match probe.run().await {
        Ok(recorded) => {
            tracing::debug!(series_len = recorded.series_len, "series saved");
            println!("recorded {} ({})", recorded.observation, recorded.outcome);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, "balance run failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
