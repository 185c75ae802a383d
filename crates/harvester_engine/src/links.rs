use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

/// Substring that marks an href as an mbox archive.
pub const DEFAULT_LINK_MARKER: &str = "mbox";

/// Collects archive hrefs from a listing document.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    marker: String,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self::with_marker(DEFAULT_LINK_MARKER)
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Parses `html` leniently and returns matching hrefs in document order.
    pub fn extract(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        extract_resource_links(document.tree.root(), &self.marker)
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order walk: an anchor's own href first, then its children left to right.
///
/// Only `<a>` elements contribute. Every other node, text and comments
/// included, is still descended into. Duplicates are kept.
pub fn extract_resource_links(node: NodeRef<'_, Node>, marker: &str) -> Vec<String> {
    let mut links = Vec::new();
    if let Node::Element(element) = node.value() {
        if element.name().eq_ignore_ascii_case("a") {
            for (name, value) in element.attrs() {
                if name.eq_ignore_ascii_case("href") && value.contains(marker) {
                    links.push(value.to_string());
                }
            }
        }
    }
    for child in node.children() {
        links.extend(extract_resource_links(child, marker));
    }
    links
}
