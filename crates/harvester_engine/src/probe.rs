use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use harvester_core::{resolve_resource_url, ResourceFailure, SizeTable};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::filename::resource_filename;
use crate::{Credentials, EngineEvent, FailurePolicy, Fetcher, HarvestError, ProgressSink};

/// Sizes learned by one probing pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeReport {
    pub sizes: SizeTable,
    /// One slot per href, in discovery order; `None` where that href failed.
    pub resource_sizes: Vec<Option<u64>>,
    /// Empty unless probing ran with `FailurePolicy::ContinueOnResourceFailure`.
    pub failed: Vec<ResourceFailure>,
}

/// Learns the size of every resource before any transfer starts.
///
/// One task per href; with no concurrency limit every probe is in flight at
/// once, which on a big listing means one connection per link.
pub struct SizeProber {
    fetcher: Arc<dyn Fetcher>,
    max_concurrent: Option<usize>,
    policy: FailurePolicy,
}

impl SizeProber {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            max_concurrent: None,
            policy: FailurePolicy::FailFast,
        }
    }

    /// Caps simultaneous probes; `None` means unbounded.
    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.max_concurrent = max_concurrent.map(|limit| limit.max(1));
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Probes every href concurrently and waits for all of them.
    ///
    /// Results are folded in completion order at this single point, so the
    /// table needs no locking. Each task carries its href's index, so two
    /// hrefs sharing a basename keep their own sizes. Under fail-fast the first error returns at once
    /// and dropping the task set aborts the probes still running.
    pub async fn probe_all(
        &self,
        listing_url: &Url,
        hrefs: &[String],
        credentials: &Credentials,
        sink: &dyn ProgressSink,
    ) -> Result<ProbeReport, HarvestError> {
        let limiter = self.max_concurrent.map(|limit| Arc::new(Semaphore::new(limit)));
        let mut report = ProbeReport {
            resource_sizes: vec![None; hrefs.len()],
            ..ProbeReport::default()
        };
        let mut tasks = JoinSet::new();
        let mut launched = 0usize;

        for (index, href) in hrefs.iter().enumerate() {
            let name = resource_filename(href);
            let url = match resolve_resource_url(listing_url, href) {
                Ok(url) => url,
                Err(err) => {
                    self.handle_failure(&mut report, name, HarvestError::invalid_url(href, err), sink)?;
                    continue;
                }
            };
            let fetcher = Arc::clone(&self.fetcher);
            let limiter = limiter.clone();
            let credentials = credentials.clone();
            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let size = fetcher.probe_size(url.as_str(), &credentials).await;
                (index, name, size)
            });
            launched += 1;
        }

        let mut collected = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let (index, name, size) = joined.map_err(|err| HarvestError::Task(err.to_string()))?;
            collected += 1;
            match size {
                Ok(size) => {
                    engine_info!("Size of {} is {} bytes", name, size);
                    sink.emit(EngineEvent::SizeProbed {
                        name: name.clone(),
                        size,
                    });
                    report.resource_sizes[index] = Some(size);
                    report.sizes.record(name, size);
                }
                Err(err) => self.handle_failure(&mut report, name, err, sink)?,
            }
        }

        if collected != launched {
            return Err(HarvestError::Task(format!(
                "collected {collected} probe results, expected {launched}"
            )));
        }

        sink.emit(EngineEvent::ProbingFinished {
            resources: report.sizes.probe_count(),
            total_size: report.sizes.total_size(),
        });
        Ok(report)
    }

    fn handle_failure(
        &self,
        report: &mut ProbeReport,
        name: String,
        err: HarvestError,
        sink: &dyn ProgressSink,
    ) -> Result<(), HarvestError> {
        match self.policy {
            FailurePolicy::FailFast => Err(err),
            FailurePolicy::ContinueOnResourceFailure => {
                engine_warn!("Skipping {}: {}", name, err);
                sink.emit(EngineEvent::ResourceFailed {
                    name: name.clone(),
                    error: err.to_string(),
                });
                report.failed.push(ResourceFailure {
                    name,
                    message: err.to_string(),
                });
                Ok(())
            }
        }
    }
}
