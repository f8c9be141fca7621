use async_trait::async_trait;
use landscout_core::units::{parse_gb_number, parse_gbp_amount};
use landscout_core::{
    ExtractionError, FilterConfig, LandError, PriceOutcome, Property, Result, SearchRegion, Source,
};
use regex::RegexBuilder;
use scraper::Html;
use std::collections::BTreeMap;
use tracing::{debug, info};
use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::fetch::{PageFetcher, PageRequest};
use crate::{dedupe, element_text, page_text, parse_selector, Scraper};

const BASE_URL: &str = "https://addland.com";

/// Land type codes the search is restricted to.
const LAND_TYPES: [u32; 9] = [2, 6, 9, 11, 1, 7, 13, 3, 300];

/// Drops listings with commoners' rights and keeps freehold ones.
const ADDITIONAL_FILTERS: &str = "dropdowns=720&filters=ls.3&filters=ls.4&filters=gpd.1&filters=gpd.2&filters=t.1&filters=t.3&showProListingsOnly=false";

const SEARCH_MARKER: &str = ".LandCards_link";
const LISTING_MARKER: &str = ".LandDetailSummary";

#[derive(Debug)]
pub struct AddLandScraper {
    filter: FilterConfig,
}

fn quote_plus(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// "south wales" -> "South Wales"
fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start {
            result.extend(c.to_uppercase());
        } else {
            result.extend(c.to_lowercase());
        }
        at_word_start = !c.is_alphabetic();
    }
    result
}

impl AddLandScraper {
    pub fn new(filter: FilterConfig) -> Self {
        Self { filter }
    }

    pub fn search_url(&self, county: &str) -> Result<Url> {
        let county = county.to_lowercase();
        let land_types = LAND_TYPES
            .iter()
            .map(|code| format!("landTypes={}", code))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!(
            "{}/land-search/{}/?placeType=County&query={}&radius=0&maxSize={}&minSize={}&{}&{}",
            BASE_URL,
            quote_plus(&county),
            quote_plus(&title_case(&county)),
            self.filter.max_acres,
            self.filter.min_acres,
            land_types,
            ADDITIONAL_FILTERS
        );
        Ok(Url::parse(&url)?)
    }

    /// Listing links on a rendered results page; empty when the site says nothing matched.
    pub fn parse_search_page(html: &str) -> Result<Vec<Url>> {
        let document = Html::parse_document(html);

        // The site shows "suggestions" under this marker; those are not matches.
        if document
            .select(&parse_selector("span.ResultsPanelList_noResults")?)
            .next()
            .is_some()
        {
            info!("No AddLand results for this region");
            return Ok(Vec::new());
        }

        let base = Url::parse(BASE_URL)?;
        let mut urls = Vec::new();
        for link in document.select(&parse_selector("a.LandCards_link")?) {
            let href = link.value().attr("href").ok_or_else(|| {
                LandError::Scraping("AddLand result card without href".to_string())
            })?;
            urls.push(base.join(href)?);
        }

        Ok(dedupe(urls))
    }

    fn extraction_error(url: &Url, field: &str, reason: &str) -> LandError {
        ExtractionError::new(Source::AddLand, url.as_str(), field, reason).into()
    }

    /// Label/value spans come in document order: label, value, label, value...
    fn summary_fields(document: &Html) -> Result<BTreeMap<String, String>> {
        let details: Vec<String> = document
            .select(&parse_selector("span.LandDetailSummary_detail")?)
            .map(element_text)
            .collect();

        Ok(details
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect())
    }

    /// "62.5 Acres" -> 62.5
    pub fn parse_size(size: &str) -> Result<Option<f64>> {
        let pattern = RegexBuilder::new(r"((?:[0-9][0-9,]*)?\.?[0-9]+)\s*acres")
            .case_insensitive(true)
            .build()
            .map_err(|e| LandError::Scraping(e.to_string()))?;

        Ok(pattern
            .captures(size)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_gb_number(m.as_str())))
    }

    pub fn parse_guide_price(text: &str) -> PriceOutcome {
        match text.trim() {
            "POA" => PriceOutcome::OnApplication,
            "Sold" => PriceOutcome::Unknown,
            other => PriceOutcome::from_amount(parse_gbp_amount(other)),
        }
    }
}

#[async_trait]
impl Scraper for AddLandScraper {
    fn source(&self) -> Source {
        Source::AddLand
    }

    fn needs_browser(&self) -> bool {
        true
    }

    async fn list_urls(&self, fetcher: &dyn PageFetcher, region: &SearchRegion) -> Result<Vec<Url>> {
        let url = self.search_url(&region.code)?;
        info!("Searching AddLand: {}", url);

        let html = fetcher.fetch(&PageRequest::browser(url, SEARCH_MARKER)).await?;
        Self::parse_search_page(&html)
    }

    fn listing_request(&self, url: &Url) -> PageRequest {
        PageRequest::browser(url.clone(), LISTING_MARKER)
    }

    fn extract(&self, page: &str, url: &Url) -> Result<Property> {
        let document = Html::parse_document(page);
        let raw_fields = Self::summary_fields(&document)?;

        let acres = match raw_fields.get("Size") {
            Some(size) => Self::parse_size(size)?,
            None => None,
        };

        let price_text = document
            .select(&parse_selector("span.LandDetailSummary_guidePrice")?)
            .next()
            .map(element_text)
            .ok_or_else(|| Self::extraction_error(url, "guide_price", "no guide price element"))?;
        let price = Self::parse_guide_price(&price_text);

        debug!(
            "AddLand {}: acres={:?} price={} fields={:?}",
            url, acres, price, raw_fields
        );

        Ok(Property::new(
            url.clone(),
            Source::AddLand,
            acres,
            price,
            raw_fields,
            page_text(&document),
        ))
    }
}
