#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use harvester_core::TransferProgress;
use harvester_engine::{
    ByteStream, Credentials, EngineEvent, FetchedPage, Fetcher, HarvestError, ProgressSink,
};

pub const LISTING_URL: &str = "http://archive.test/list/hackers/";

/// In-memory stand-in for the HTTP fetcher.
///
/// Bodies are keyed by absolute URL and served in small pieces so the
/// transfer engine has to re-chunk them.
#[derive(Default)]
pub struct StaticFetcher {
    pub listing: Vec<u8>,
    pub listing_error: Option<HarvestError>,
    pub bodies: HashMap<String, Vec<u8>>,
    /// Urls whose stream breaks after the first piece.
    pub broken: HashSet<String>,
    pub probe_delay: Option<Duration>,
    pub piece_size: usize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    opened: Mutex<Vec<String>>,
    credentials_seen: Mutex<Vec<Credentials>>,
}

impl StaticFetcher {
    pub fn new(listing: &str) -> Self {
        Self {
            listing: listing.as_bytes().to_vec(),
            piece_size: 7_000,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, path: &str, len: usize) -> Self {
        self.bodies.insert(absolute(path), vec![b'm'; len]);
        self
    }

    pub fn with_broken(mut self, path: &str) -> Self {
        self.broken.insert(absolute(path));
        self
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn credentials_seen(&self) -> Vec<Credentials> {
        self.credentials_seen.lock().unwrap().clone()
    }

    fn body(&self, url: &str) -> Result<&Vec<u8>, HarvestError> {
        self.bodies.get(url).ok_or_else(|| HarvestError::UnexpectedStatus {
            status: 404,
            url: url.to_string(),
        })
    }
}

pub fn absolute(path: &str) -> String {
    format!("http://archive.test{path}")
}

#[async_trait::async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch_page(
        &self,
        url: &str,
        _credentials: &Credentials,
    ) -> Result<FetchedPage, HarvestError> {
        if let Some(err) = &self.listing_error {
            return Err(err.clone());
        }
        Ok(FetchedPage {
            final_url: url.to_string(),
            content_type: Some("text/html; charset=utf-8".to_string()),
            bytes: self.listing.clone(),
        })
    }

    async fn open_stream(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<ByteStream, HarvestError> {
        self.opened.lock().unwrap().push(url.to_string());
        self.credentials_seen.lock().unwrap().push(credentials.clone());
        let body = self.body(url)?;
        let mut pieces: Vec<io::Result<Bytes>> = body
            .chunks(self.piece_size.max(1))
            .map(|piece| Ok(Bytes::copy_from_slice(piece)))
            .collect();
        if self.broken.contains(url) {
            pieces.truncate(1);
            pieces.push(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        Ok(stream::iter(pieces).boxed())
    }

    async fn probe_size(&self, url: &str, credentials: &Credentials) -> Result<u64, HarvestError> {
        self.credentials_seen.lock().unwrap().push(credentials.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.body(url).map(|body| body.len() as u64)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn chunks(&self) -> Vec<TransferProgress> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::ChunkWritten(progress) => Some(progress),
                _ => None,
            })
            .collect()
    }

    pub fn chunks_for(&self, name: &str) -> Vec<TransferProgress> {
        self.chunks()
            .into_iter()
            .filter(|progress| progress.name == name)
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn listing(hrefs: &[&str]) -> String {
    let anchors = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
        .collect::<String>();
    format!("<html><body><h1>Archives</h1><ul>{anchors}</ul></body></html>")
}
