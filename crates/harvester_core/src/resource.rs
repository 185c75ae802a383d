use std::collections::HashMap;

use url::Url;

/// One downloadable archive discovered on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The href exactly as it appeared in the listing.
    pub path: String,
    /// Basename of the href; local filename and size-table key.
    pub name: String,
    /// Content length learned by probing.
    pub size: u64,
}

/// Resolves an href against the listing page URL.
///
/// Absolute-path hrefs land on the listing origin, relative ones under the
/// listing directory, absolute URLs are kept as they are.
pub fn resolve_resource_url(listing_url: &Url, href: &str) -> Result<Url, url::ParseError> {
    listing_url.join(href.trim())
}

/// Resource sizes keyed by name, plus the sum of every probe result.
///
/// `total_size` counts each recorded probe, so a name probed twice (a
/// duplicated href) contributes twice even though the map keeps one entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizeTable {
    sizes: HashMap<String, u64>,
    total_size: u64,
    probes: usize,
}

impl SizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, size: u64) {
        self.sizes.insert(name.into(), size);
        self.total_size += size;
        self.probes += 1;
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.sizes.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sizes.contains_key(name)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Number of probe results recorded, duplicates included.
    pub fn probe_count(&self) -> usize {
        self.probes
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.sizes.iter().map(|(name, size)| (name.as_str(), *size))
    }
}

/// A resource that could not be probed or transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFailure {
    pub name: String,
    pub message: String,
}

/// Outcome of one harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestSummary {
    /// Links found on the listing page, duplicates included.
    pub discovered: usize,
    pub transferred: usize,
    pub failed: Vec<ResourceFailure>,
    pub total_size: u64,
    pub total_done: u64,
}

impl HarvestSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.transferred == self.discovered
    }
}
