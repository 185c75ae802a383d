use anyhow::Context;
use chrono::Utc;
use engine_logging::{engine_info, engine_warn};
use harvester_core::HarvestSummary;
use harvester_engine::Harvester;

use super::config::AppConfig;
use super::reporter::LogReporter;

/// Runs one harvest to completion on a fresh tokio runtime.
pub fn run_app(config: AppConfig) -> anyhow::Result<HarvestSummary> {
    let harvest_config = config.into_harvest_config();
    engine_info!(
        "Harvesting {} into {:?} as {:?}",
        harvest_config.listing_url,
        harvest_config.output_dir,
        harvest_config.credentials
    );
    let harvester = Harvester::new(harvest_config).context("failed to set up http client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;

    let started = Utc::now();
    let summary = runtime
        .block_on(harvester.run(&LogReporter))
        .context("harvest aborted")?;
    let elapsed = Utc::now() - started;

    engine_info!(
        "Harvest started {} finished in {}s: {}/{} archives, {} of {} bytes",
        started.to_rfc3339(),
        elapsed.num_seconds(),
        summary.transferred,
        summary.discovered,
        summary.total_done,
        summary.total_size
    );
    for failure in &summary.failed {
        engine_warn!("Not downloaded: {} ({})", failure.name, failure.message);
    }
    Ok(summary)
}
