use async_trait::async_trait;
use landscout_core::units::{parse_gbp_amount, square_feet_to_acres, square_metres_to_acres};
use landscout_core::{
    ExtractionError, LandError, PriceOutcome, Property, Result, SearchRegion, Source, SourceConfig,
};
use regex::Regex;
use scraper::Html;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};
use url::Url;

use crate::fetch::{PageFetcher, PageRequest};
use crate::{dedupe, page_text, parse_selector, Scraper};

const BASE_URL: &str = "https://www.rightmove.co.uk";
const SEARCH_PATH: &str = "/property-for-sale/find.html";
const PAGE_MODEL_MARKER: &str = "window.PAGE_MODEL";

/// The parts of `window.PAGE_MODEL` the extractor reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageModel {
    pub property_data: PropertyData,
    #[serde(default)]
    pub analytics_info: Option<AnalyticsInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    #[serde(default)]
    pub sizings: Vec<Sizing>,
    pub prices: Prices,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sizing {
    pub unit: String,
    pub maximum_size: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prices {
    pub primary_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsInfo {
    pub analytics_property: AnalyticsProperty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsProperty {
    pub property_type: Option<String>,
}

impl PageModel {
    fn sizing(&self, unit: &str) -> Option<f64> {
        self.property_data
            .sizings
            .iter()
            .find(|s| s.unit == unit)
            .and_then(|s| s.maximum_size)
    }

    /// Acres as listed, else converted from square metres, else from square feet.
    pub fn acres(&self) -> Option<f64> {
        if let Some(acres) = self.sizing("ac") {
            return Some(acres);
        }
        if let Some(sqm) = self.sizing("sqm").filter(|v| *v > 0.0) {
            return Some(square_metres_to_acres(sqm));
        }
        if let Some(sqft) = self.sizing("sqft").filter(|v| *v > 0.0) {
            return Some(square_feet_to_acres(sqft));
        }
        None
    }

    pub fn price(&self) -> PriceOutcome {
        match self.property_data.prices.primary_price.as_deref() {
            Some(price) if price.trim() == "POA" => PriceOutcome::OnApplication,
            Some(price) => PriceOutcome::from_amount(parse_gbp_amount(price)),
            None => PriceOutcome::Unknown,
        }
    }

    pub fn property_type(&self) -> Option<&str> {
        self.analytics_info
            .as_ref()
            .and_then(|info| info.analytics_property.property_type.as_deref())
    }
}

#[derive(Debug)]
pub struct RightmoveScraper {
    config: SourceConfig,
}

impl RightmoveScraper {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn search_url(&self, location_identifier: &str) -> Result<Url> {
        let mut url = Url::parse(BASE_URL)?.join(SEARCH_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("locationIdentifier", location_identifier);
            if let Some(max_price) = self.config.max_price {
                query.append_pair("maxPrice", &max_price.to_string());
            }
            query
                .append_pair("numberOfPropertiesPerPage", "499")
                .append_pair("propertyTypes", "land")
                .append_pair("mustHave", "")
                .append_pair("dontShow", "")
                .append_pair("furnishTypes", "");
            if let Some(days) = self.config.max_days_since_added {
                query.append_pair("maxDaysSinceAdded", &days.to_string());
            }
            query.append_pair("keywords", "");
        }
        Ok(url)
    }

    pub fn parse_search_page(html: &str, search_url: &Url) -> Result<Vec<Url>> {
        let document = Html::parse_document(html);
        let container = document
            .select(&parse_selector("#l-searchResults")?)
            .next()
            .ok_or_else(|| {
                LandError::from(ExtractionError::new(
                    Source::Rightmove,
                    search_url.as_str(),
                    "l-searchResults",
                    "search results container missing",
                ))
            })?;

        let base = Url::parse(BASE_URL)?;
        let mut urls = Vec::new();
        for link in container.select(&parse_selector("a.propertyCard-link")?) {
            // Featured cards repeat a listing with an empty href.
            let Some(href) = link.value().attr("href").filter(|h| !h.trim().is_empty()) else {
                continue;
            };
            let mut url = base.join(href)?;
            url.set_fragment(None);
            urls.push(url);
        }

        Ok(dedupe(urls))
    }

    /// Pulls the JSON assigned to `window.PAGE_MODEL` out of the page's scripts.
    pub fn page_model(document: &Html, url: &Url) -> Result<PageModel> {
        let missing = |reason: &str| -> LandError {
            ExtractionError::new(Source::Rightmove, url.as_str(), "PAGE_MODEL", reason).into()
        };

        let pattern = Regex::new(r"(?m)window\.PAGE_MODEL\s*=\s*(.*)$")
            .map_err(|e| LandError::Scraping(e.to_string()))?;

        let script = document
            .select(&parse_selector("script")?)
            .map(|s| s.text().collect::<String>())
            .find(|text| text.contains(PAGE_MODEL_MARKER))
            .ok_or_else(|| missing("no script assigns window.PAGE_MODEL"))?;

        let payload = pattern
            .captures(&script)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(';').trim_end())
            .ok_or_else(|| missing("window.PAGE_MODEL assignment not on one line"))?;

        serde_json::from_str(payload).map_err(|e| missing(&format!("invalid JSON: {}", e)))
    }
}

#[async_trait]
impl Scraper for RightmoveScraper {
    fn source(&self) -> Source {
        Source::Rightmove
    }

    async fn list_urls(&self, fetcher: &dyn PageFetcher, region: &SearchRegion) -> Result<Vec<Url>> {
        let url = self.search_url(&region.code)?;
        info!("Searching Rightmove: {}", url);

        let html = fetcher.fetch(&PageRequest::http(url.clone())).await?;
        Self::parse_search_page(&html, &url)
    }

    fn listing_request(&self, url: &Url) -> PageRequest {
        PageRequest::http(url.clone())
    }

    fn extract(&self, page: &str, url: &Url) -> Result<Property> {
        let document = Html::parse_document(page);
        let model = Self::page_model(&document, url)?;

        let mut raw_fields = BTreeMap::new();
        if let Some(property_type) = model.property_type() {
            raw_fields.insert("property_type".to_string(), property_type.to_string());
        }
        if let Some(price) = &model.property_data.prices.primary_price {
            raw_fields.insert("primary_price".to_string(), price.clone());
        }
        for sizing in &model.property_data.sizings {
            if let Some(size) = sizing.maximum_size {
                raw_fields.insert(format!("size_{}", sizing.unit), size.to_string());
            }
        }

        let acres = model.acres();
        let price = model.price();
        debug!("Rightmove {}: acres={:?} price={}", url, acres, price);

        Ok(Property::new(
            url.clone(),
            Source::Rightmove,
            acres,
            price,
            raw_fields,
            page_text(&document),
        ))
    }
}
