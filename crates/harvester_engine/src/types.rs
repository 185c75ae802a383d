use harvester_core::TransferProgress;
use thiserror::Error;

/// Progress and lifecycle events emitted by the prober, the transfer engine
/// and the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ListingFetched { url: String, bytes: u64 },
    LinksExtracted { count: usize },
    SizeProbed { name: String, size: u64 },
    ProbingFinished { resources: usize, total_size: u64 },
    TransferStarted { name: String, url: String, file_size: u64 },
    ChunkWritten(TransferProgress),
    TransferFinished { name: String, bytes: u64 },
    /// Only emitted under `FailurePolicy::ContinueOnResourceFailure`.
    ResourceFailed { name: String, error: String },
    HarvestFinished { total_done: u64, total_size: u64 },
}

/// Observer for engine events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: EngineEvent) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    #[error("too many redirects (limit {limit}) starting at {url}")]
    TooManyRedirects { url: String, limit: usize },
    #[error("authentication required for {url}: {challenge}")]
    AuthChallenge { url: String, challenge: String },
    #[error("unexpected http status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    #[error("timed out talking to {url}")]
    Timeout { url: String },
    #[error("failed to parse {url}: {message}")]
    Parse { url: String, message: String },
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },
    #[error("probe task failed: {0}")]
    Task(String),
}

impl HarvestError {
    pub(crate) fn invalid_url(url: &str, err: impl ToString) -> Self {
        HarvestError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, err: impl ToString) -> Self {
        HarvestError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

/// How the orchestrator reacts to a failed probe or transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// First error aborts the run.
    #[default]
    FailFast,
    /// Record the failure, skip the resource, keep going.
    ContinueOnResourceFailure,
}
