pub mod addland;
pub mod fetch;
pub mod rightmove;
pub mod scanner;
pub mod uklandandfarms;

use async_trait::async_trait;
use landscout_core::{Config, LandError, Property, Result, SearchRegion, Source};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

pub use addland::AddLandScraper;
pub use fetch::{FetchMode, PageFetcher, PageRequest, ThrottlePolicy, WebFetcher};
pub use rightmove::RightmoveScraper;
pub use scanner::{ListingViewer, LogViewer, ScanFailure, ScanReport, Scanner, SystemBrowserViewer};
pub use uklandandfarms::UkLandAndFarmsScraper;

/// One listing site: how to find its listings and how to read one.
#[async_trait]
pub trait Scraper: Send + Sync {
    fn source(&self) -> Source;

    /// Whether any page of this site must be rendered in a browser.
    fn needs_browser(&self) -> bool {
        false
    }

    /// Listing URLs for a region, deduplicated in first-seen order.
    async fn list_urls(&self, fetcher: &dyn PageFetcher, region: &SearchRegion) -> Result<Vec<Url>>;

    /// How a single listing page should be fetched.
    fn listing_request(&self, url: &Url) -> PageRequest;

    /// Normalizes a fetched listing page.
    fn extract(&self, page: &str, url: &Url) -> Result<Property>;

    async fn fetch_listing(&self, fetcher: &dyn PageFetcher, url: &Url) -> Result<Property> {
        let page = fetcher.fetch(&self.listing_request(url)).await?;
        self.extract(&page, url)
    }
}

/// Factory for creating scraper instances
pub struct ScraperFactory;

impl ScraperFactory {
    /// Create a new scraper instance for `source`, configured from `config`
    pub fn create_scraper(source: Source, config: &Config) -> Arc<dyn Scraper> {
        let source_config = config.sources.get(source).clone();
        match source {
            Source::AddLand => Arc::new(AddLandScraper::new(config.filter)),
            Source::Rightmove => Arc::new(RightmoveScraper::new(source_config)),
            Source::UkLandAndFarms => Arc::new(UkLandAndFarmsScraper::new(source_config)),
        }
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| LandError::Scraping(e.to_string()))
}

/// All text nodes of the document joined by single spaces.
pub(crate) fn page_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text content of an element with surrounding whitespace removed.
pub(crate) fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub(crate) fn dedupe(urls: impl IntoIterator<Item = Url>) -> Vec<Url> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}
