use landscout_core::{
    Config, FilterPipeline, LandError, Property, Rejection, Result, SearchRegion, Source, Verdict,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::fetch::{PageFetcher, ThrottlePolicy};
use crate::{Scraper, ScraperFactory};

/// What happens to a listing that passes every filter.
pub trait ListingViewer: Send + Sync {
    fn show(&self, property: &Property) -> Result<()>;
}

/// Opens accepted listings in the desktop's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowserViewer;

impl ListingViewer for SystemBrowserViewer {
    fn show(&self, property: &Property) -> Result<()> {
        open::that(property.url().as_str())?;
        Ok(())
    }
}

/// Only logs accepted listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogViewer;

impl ListingViewer for LogViewer {
    fn show(&self, property: &Property) -> Result<()> {
        info!(
            "Accepted {} ({} acres, {})",
            property.url(),
            property.acres().unwrap_or_default(),
            property.price()
        );
        Ok(())
    }
}

/// A region or listing that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFailure {
    pub source: Source,
    pub region: String,
    /// `None` when the whole region failed.
    pub url: Option<Url>,
    pub error: String,
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{} / {}: {}: {}", self.source, self.region, url, self.error),
            None => write!(f, "{} / {}: {}", self.source, self.region, self.error),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanReport {
    /// Listing pages fetched, whatever came of them.
    pub examined: usize,
    pub accepted: Vec<Property>,
    pub rejected: Vec<(Url, Rejection)>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    fn record_failure(&mut self, region: &SearchRegion, url: Option<&Url>, err: &LandError) {
        self.failures.push(ScanFailure {
            source: region.source,
            region: region.name.clone(),
            url: url.cloned(),
            error: err.to_string(),
        });
    }
}

/// Walks every configured region of every selected source, one page at a time.
pub struct Scanner {
    scrapers: Vec<(Arc<dyn Scraper>, Vec<SearchRegion>)>,
    pipeline: FilterPipeline,
    viewer: Arc<dyn ListingViewer>,
    throttle: ThrottlePolicy,
}

impl Scanner {
    pub fn new(
        config: &Config,
        sources: &[Source],
        viewer: Arc<dyn ListingViewer>,
        throttle: ThrottlePolicy,
    ) -> Result<Self> {
        let pipeline = FilterPipeline::new(config.filter, &config.sources)?;
        let scrapers = sources
            .iter()
            .map(|&source| {
                (
                    ScraperFactory::create_scraper(source, config),
                    config.sources.get(source).search_regions(source),
                )
            })
            .collect();

        Ok(Self {
            scrapers,
            pipeline,
            viewer,
            throttle,
        })
    }

    /// Whether a browser session has to be running before [`Scanner::run`].
    pub fn needs_browser(&self) -> bool {
        self.scrapers.iter().any(|(scraper, _)| scraper.needs_browser())
    }

    pub async fn run(&self, fetcher: &dyn PageFetcher) -> ScanReport {
        let mut report = ScanReport::default();
        // Regions of one site overlap, and a listing is only examined once per run.
        let mut seen = HashSet::new();

        for (scraper, regions) in &self.scrapers {
            for region in regions {
                info!("Examining {} region {}", region.source, region.name);
                if let Err(e) = self
                    .scan_region(scraper.as_ref(), fetcher, region, &mut seen, &mut report)
                    .await
                {
                    error!("Giving up on {} region {}: {}", region.source, region.name, e);
                    report.record_failure(region, None, &e);
                }
            }
        }

        info!(
            "Examined {} listings: {} accepted, {} rejected, {} failures",
            report.examined,
            report.accepted.len(),
            report.rejected.len(),
            report.failures.len()
        );
        report
    }

    async fn scan_region(
        &self,
        scraper: &dyn Scraper,
        fetcher: &dyn PageFetcher,
        region: &SearchRegion,
        seen: &mut HashSet<Url>,
        report: &mut ScanReport,
    ) -> Result<()> {
        let urls = scraper.list_urls(fetcher, region).await?;
        info!("Found {} candidate listings in {}", urls.len(), region.name);

        for url in urls {
            if !seen.insert(url.clone()) {
                debug!("Already examined {}, skipping", url);
                continue;
            }
            debug!("Fetching {}", url);
            let outcome = scraper.fetch_listing(fetcher, &url).await;
            report.examined += 1;
            self.throttle.pause().await;

            let property = match outcome {
                Ok(property) => property,
                Err(e) if e.is_listing_local() => {
                    warn!("Skipping {}: {}", url, e);
                    report.record_failure(region, Some(&url), &e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.pipeline.evaluate(&property) {
                Verdict::Accepted => {
                    info!("Accepted {}", url);
                    if let Err(e) = self.viewer.show(&property) {
                        warn!("Could not open {}: {}", url, e);
                    }
                    report.accepted.push(property);
                }
                Verdict::Rejected(reason) => {
                    info!("Rejected {}: {}", url, reason);
                    report.rejected.push((url, reason));
                }
            }
        }

        Ok(())
    }
}
