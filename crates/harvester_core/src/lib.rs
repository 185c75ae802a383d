//! Harvester core: pure progress accounting and resource bookkeeping.
mod progress;
mod resource;

pub use progress::{percent, FileProgress, SessionProgress, TransferProgress};
pub use resource::{
    resolve_resource_url, HarvestSummary, Resource, ResourceFailure, SizeTable,
};
