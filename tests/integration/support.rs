use async_trait::async_trait;
use landscout_core::{LandError, Property, Result};
use landscout_scrapers::{ListingViewer, PageFetcher, PageRequest};
use std::collections::HashMap;
use std::sync::Mutex;

pub const RIGHTMOVE_SEARCH: &str = include_str!("../fixtures/rightmove_search.html");
pub const RIGHTMOVE_ACRES: &str = include_str!("../fixtures/rightmove_listing_acres.html");
pub const RIGHTMOVE_POA: &str = include_str!("../fixtures/rightmove_listing_poa.html");
pub const RIGHTMOVE_PLOT: &str = include_str!("../fixtures/rightmove_listing_plot.html");
pub const UKLF_RESULTS: &str = include_str!("../fixtures/uklandandfarms_results.html");
pub const UKLF_EMPTY: &str = include_str!("../fixtures/uklandandfarms_empty.html");
pub const UKLF_LISTING: &str = include_str!("../fixtures/uklandandfarms_listing.html");
pub const UKLF_LET: &str = include_str!("../fixtures/uklandandfarms_let.html");

/// Serves fixture pages by URL and remembers what was asked for.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<PageRequest>>,
}

impl FixtureFetcher {
    pub fn with_page(mut self, url: impl AsRef<str>, html: &str) -> Self {
        self.pages.insert(url.as_ref().to_string(), html.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.to_string())
            .collect()
    }

    pub fn headers_for(&self, url: &str) -> Vec<(String, String)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.url.as_str() == url)
            .map(|r| r.headers.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.pages
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| LandError::Scraping(format!("404 for {}", request.url)))
    }
}

#[derive(Default)]
pub struct RecordingViewer {
    pub opened: Mutex<Vec<String>>,
}

impl ListingViewer for RecordingViewer {
    fn show(&self, property: &Property) -> Result<()> {
        self.opened.lock().unwrap().push(property.url().to_string());
        Ok(())
    }
}
