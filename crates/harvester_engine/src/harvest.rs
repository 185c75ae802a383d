use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use harvester_core::{
    resolve_resource_url, HarvestSummary, Resource, ResourceFailure, SessionProgress,
};
use url::Url;

use crate::decode::decode_html;
use crate::filename::resource_filename;
use crate::links::{LinkExtractor, DEFAULT_LINK_MARKER};
use crate::persist::ensure_output_dir;
use crate::probe::SizeProber;
use crate::transfer::{TransferEngine, TransferRequest, DEFAULT_CHUNK_SIZE};
use crate::{
    Credentials, EngineEvent, FailurePolicy, FetchSettings, Fetcher, HarvestError, ProgressSink,
    ReqwestFetcher,
};

pub const DEFAULT_LISTING_URL: &str = "http://postgresql.org/list/pgsql-hackers/";

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub listing_url: String,
    /// Applied to every probe and transfer; the listing itself is fetched anonymously.
    pub credentials: Credentials,
    pub output_dir: PathBuf,
    pub link_marker: String,
    pub fetch: FetchSettings,
    /// `None` probes every resource at once.
    pub probe_concurrency: Option<usize>,
    pub chunk_size: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            credentials: Credentials::basic("archives", "antispam"),
            output_dir: PathBuf::from("."),
            link_marker: DEFAULT_LINK_MARKER.to_string(),
            fetch: FetchSettings::default(),
            probe_concurrency: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

/// One harvest run: listing -> links -> sizes -> sequential transfers.
pub struct Harvester {
    config: HarvestConfig,
    fetcher: Arc<dyn Fetcher>,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone())?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: HarvestConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config, fetcher }
    }

    pub async fn run(&self, sink: &dyn ProgressSink) -> Result<HarvestSummary, HarvestError> {
        let listing_url = Url::parse(&self.config.listing_url)
            .map_err(|err| HarvestError::invalid_url(&self.config.listing_url, err))?;
        let hrefs = self.discover(&listing_url, sink).await?;

        let prober = SizeProber::new(Arc::clone(&self.fetcher))
            .with_max_concurrent(self.config.probe_concurrency)
            .with_failure_policy(self.config.failure_policy);
        let report = prober
            .probe_all(&listing_url, &hrefs, &self.config.credentials, sink)
            .await?;
        engine_info!(
            "Total size of {} resources: {} bytes",
            report.sizes.probe_count(),
            report.sizes.total_size()
        );

        let mut summary = HarvestSummary {
            discovered: hrefs.len(),
            failed: report.failed,
            total_size: report.sizes.total_size(),
            ..HarvestSummary::default()
        };

        // Sizes are all known here; transfers go one at a time in discovery order.
        let resources: Vec<Resource> = hrefs
            .iter()
            .zip(&report.resource_sizes)
            .filter_map(|(href, size)| {
                Some(Resource {
                    path: href.clone(),
                    name: resource_filename(href),
                    size: (*size)?,
                })
            })
            .collect();

        ensure_output_dir(&self.config.output_dir)?;
        let engine = TransferEngine::with_chunk_size(Arc::clone(&self.fetcher), self.config.chunk_size);
        let mut session = SessionProgress::new(report.sizes.total_size());

        for resource in &resources {
            match self.transfer_one(&engine, &listing_url, resource, &session, sink).await {
                Ok(bytes) => {
                    session.complete_resource(bytes);
                    summary.transferred += 1;
                    engine_info!(
                        "Finished {}: {} bytes, session {}/{} bytes",
                        resource.name,
                        bytes,
                        session.total_done,
                        session.total_size
                    );
                    sink.emit(EngineEvent::TransferFinished {
                        name: resource.name.clone(),
                        bytes,
                    });
                }
                Err(err) => match self.config.failure_policy {
                    FailurePolicy::FailFast => return Err(err),
                    FailurePolicy::ContinueOnResourceFailure => {
                        engine_warn!("Transfer of {} failed: {}", resource.name, err);
                        sink.emit(EngineEvent::ResourceFailed {
                            name: resource.name.clone(),
                            error: err.to_string(),
                        });
                        summary.failed.push(ResourceFailure {
                            name: resource.name.clone(),
                            message: err.to_string(),
                        });
                    }
                },
            }
        }

        summary.total_done = session.total_done;
        sink.emit(EngineEvent::HarvestFinished {
            total_done: session.total_done,
            total_size: session.total_size,
        });
        Ok(summary)
    }

    async fn discover(
        &self,
        listing_url: &Url,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<String>, HarvestError> {
        let page = self
            .fetcher
            .fetch_page(listing_url.as_str(), &Credentials::anonymous())
            .await?;
        sink.emit(EngineEvent::ListingFetched {
            url: page.final_url.clone(),
            bytes: page.bytes.len() as u64,
        });

        let decoded = decode_html(&page.bytes, page.content_type.as_deref()).map_err(|err| {
            HarvestError::Parse {
                url: page.final_url.clone(),
                message: err.to_string(),
            }
        })?;
        let hrefs = LinkExtractor::with_marker(self.config.link_marker.clone()).extract(&decoded.html);
        engine_info!(
            "Found {} '{}' links on {}",
            hrefs.len(),
            self.config.link_marker,
            page.final_url
        );
        sink.emit(EngineEvent::LinksExtracted { count: hrefs.len() });
        Ok(hrefs)
    }

    async fn transfer_one(
        &self,
        engine: &TransferEngine,
        listing_url: &Url,
        resource: &Resource,
        session: &SessionProgress,
        sink: &dyn ProgressSink,
    ) -> Result<u64, HarvestError> {
        let url = resolve_resource_url(listing_url, &resource.path)
            .map_err(|err| HarvestError::invalid_url(&resource.path, err))?;
        let request = TransferRequest {
            name: resource.name.clone(),
            url: url.to_string(),
            destination: self.config.output_dir.join(&resource.name),
            file_size: resource.size,
            total_done_before: session.total_done,
            total_size: session.total_size,
        };
        sink.emit(EngineEvent::TransferStarted {
            name: request.name.clone(),
            url: request.url.clone(),
            file_size: request.file_size,
        });
        engine.transfer(&request, &self.config.credentials, sink).await
    }
}
