use engine_logging::{engine_info, engine_warn};
use harvester_engine::{EngineEvent, ProgressSink};

/// Renders engine events as human-readable log lines.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ProgressSink for LogReporter {
    fn emit(&self, event: EngineEvent) {
        let line = render(&event);
        match event {
            EngineEvent::ResourceFailed { .. } => engine_warn!("{}", line),
            _ => engine_info!("{}", line),
        }
    }
}

pub fn render(event: &EngineEvent) -> String {
    match event {
        EngineEvent::ListingFetched { url, bytes } => {
            format!("Fetched listing {url} ({bytes} bytes)")
        }
        EngineEvent::LinksExtracted { count } => format!("Found {count} archive links"),
        EngineEvent::SizeProbed { name, size } => format!("{name}: {size} bytes"),
        EngineEvent::ProbingFinished {
            resources,
            total_size,
        } => format!("Total of {resources} archives: {total_size} bytes"),
        EngineEvent::TransferStarted {
            name,
            url,
            file_size,
        } => format!("Downloading {name} ({file_size} bytes) from {url}"),
        EngineEvent::ChunkWritten(progress) => format!(
            "{}: {}/{} ({:.1}%) total {}/{} ({:.1}%)",
            progress.name,
            progress.file_done,
            progress.file_size,
            progress.file_percent,
            progress.total_done,
            progress.total_size,
            progress.total_percent
        ),
        EngineEvent::TransferFinished { name, bytes } => format!("Wrote {bytes} bytes to {name}"),
        EngineEvent::ResourceFailed { name, error } => format!("Skipped {name}: {error}"),
        EngineEvent::HarvestFinished {
            total_done,
            total_size,
        } => format!("Downloaded {total_done} of {total_size} bytes"),
    }
}
