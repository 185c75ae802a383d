//! Harvester engine: fetching, link discovery, size probing and transfers.
mod decode;
mod fetch;
mod filename;
mod harvest;
mod links;
mod persist;
mod probe;
mod transfer;
mod types;

pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use fetch::{ByteStream, Credentials, FetchSettings, FetchedPage, Fetcher, ReqwestFetcher};
pub use filename::resource_filename;
pub use harvest::{HarvestConfig, Harvester, DEFAULT_LISTING_URL};
pub use links::{extract_resource_links, LinkExtractor, DEFAULT_LINK_MARKER};
pub use persist::ensure_output_dir;
pub use probe::{ProbeReport, SizeProber};
pub use transfer::{TransferEngine, TransferRequest, DEFAULT_CHUNK_SIZE};
pub use types::{EngineEvent, FailurePolicy, HarvestError, NullSink, ProgressSink};

pub use reqwest::Method;
