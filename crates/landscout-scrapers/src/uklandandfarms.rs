use async_trait::async_trait;
use landscout_core::units::parse_gb_number;
use landscout_core::{
    ExtractionError, LandError, PriceOutcome, Property, Result, SearchRegion, Source, SourceConfig,
};
use regex::{Regex, RegexBuilder};
use scraper::Html;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetch::{PageFetcher, PageRequest};
use crate::{dedupe, element_text, page_text, parse_selector, Scraper};

const BASE_URL: &str = "https://www.uklandandfarms.co.uk";
const SEARCH_PATH: &str = "/Search/SearchResult.aspx";
const DEFAULT_MAX_PAGES: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleType {
    ForSale,
    UnderOffer,
    Unknown,
}

impl fmt::Display for SaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleType::ForSale => write!(f, "For Sale"),
            SaleType::UnderOffer => write!(f, "Under Offer"),
            SaleType::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingType {
    GuidePrice,
    OffersInExcess,
    OffersOver,
    FixedPrice,
    Unknown,
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingType::GuidePrice => write!(f, "Guide Price"),
            PricingType::OffersInExcess => write!(f, "Offers In Excess"),
            PricingType::OffersOver => write!(f, "Offers Over"),
            PricingType::FixedPrice => write!(f, "Fixed Price"),
            PricingType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Everything the site puts in a listing heading, e.g.
/// `151.11 acres, Milton Damerel, Holsworthy, EX22, Devon<br /> Under Offer - Guide Price £2,000,000<br />`
#[derive(Debug, Clone, PartialEq)]
pub struct TitleDetails {
    pub acres: f64,
    pub sale_type: SaleType,
    pub pricing_type: PricingType,
    pub price: PriceOutcome,
}

fn title_regex(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| LandError::Scraping(e.to_string()))
}

fn first_match(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Mines a listing heading. Only the acreage is mandatory; a missing
/// amount means the price is on application.
pub fn parse_title(title: &str, url: &Url) -> Result<TitleDetails> {
    let acres = first_match(&title_regex(r"((?:[0-9][0-9,]*)?\.?[0-9]+)\s*acres")?, title)
        .and_then(|value| parse_gb_number(&value))
        .ok_or_else(|| {
            LandError::from(ExtractionError::new(
                Source::UkLandAndFarms,
                url.as_str(),
                "acres",
                format!("no acreage in title {:?}", title.trim()),
            ))
        })?;

    let sale_type = match first_match(&title_regex(r"(For Sale|Under Offer)")?, title).as_deref() {
        Some("for sale") => SaleType::ForSale,
        Some("under offer") => SaleType::UnderOffer,
        _ => SaleType::Unknown,
    };

    let pricing_type = match first_match(
        &title_regex(r"(Guide Price|Offers In Excess|Offers Over|Fixed Price)")?,
        title,
    )
    .as_deref()
    {
        Some("guide price") => PricingType::GuidePrice,
        Some("offers in excess") => PricingType::OffersInExcess,
        Some("offers over") => PricingType::OffersOver,
        Some("fixed price") => PricingType::FixedPrice,
        _ => PricingType::Unknown,
    };

    let price = match first_match(&title_regex(r"£([0-9][0-9,]*)")?, title) {
        Some(amount) => PriceOutcome::from_amount(parse_gb_number(&amount)),
        None => PriceOutcome::OnApplication,
    };

    Ok(TitleDetails {
        acres,
        sale_type,
        pricing_type,
        price,
    })
}

#[derive(Debug)]
pub struct UkLandAndFarmsScraper {
    config: SourceConfig,
}

impl UkLandAndFarmsScraper {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn search_url(&self, region: &str, county: &str, page: u32) -> Result<Url> {
        let mut url = Url::parse(BASE_URL)?.join(SEARCH_PATH)?;
        let max_price = self.config.max_price.map(|p| p.to_string()).unwrap_or_default();
        url.query_pairs_mut()
            .append_pair("keyword", "")
            .append_pair("Region", region)
            .append_pair("County", county)
            .append_pair("PageIndex", &page.to_string())
            .append_pair("kw", "")
            .append_pair("PropertyType", "land")
            .append_pair("Status", "sale")
            .append_pair("Maxprice", &max_price);
        Ok(url)
    }

    fn search_request(&self, url: Url) -> PageRequest {
        match &self.config.cookie {
            Some(cookie) => PageRequest::http(url).with_header("Cookie", cookie),
            None => PageRequest::http(url),
        }
    }

    /// Raw hrefs in the result list. A page without the list container is malformed.
    pub fn parse_search_page(html: &str, search_url: &Url) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let container = document
            .select(&parse_selector("div#propertyList")?)
            .next()
            .ok_or_else(|| {
                LandError::from(ExtractionError::new(
                    Source::UkLandAndFarms,
                    search_url.as_str(),
                    "propertyList",
                    "search results container missing",
                ))
            })?;

        Ok(container
            .select(&parse_selector("ul li h3 a")?)
            .filter_map(|link| link.value().attr("href"))
            .map(str::to_string)
            .collect())
    }

    /// The site's region parameter is unreliable, so results are checked
    /// against the whitelist of region names that must appear in the URL.
    pub fn is_whitelisted(&self, href: &str) -> bool {
        if self.config.url_whitelist.is_empty() {
            return true;
        }
        let href = href.to_lowercase();
        self.config
            .url_whitelist
            .iter()
            .any(|region| href.contains(&region.to_lowercase()))
    }
}

#[async_trait]
impl Scraper for UkLandAndFarmsScraper {
    fn source(&self) -> Source {
        Source::UkLandAndFarms
    }

    async fn list_urls(&self, fetcher: &dyn PageFetcher, region: &SearchRegion) -> Result<Vec<Url>> {
        let base = Url::parse(BASE_URL)?;
        let max_pages = self.config.max_pages.unwrap_or(DEFAULT_MAX_PAGES);
        let county = region.county.as_deref().unwrap_or_default();
        let mut urls = Vec::new();

        for page in 1..=max_pages {
            let search_url = self.search_url(&region.code, county, page)?;
            info!("Searching UK Land and Farms page {}: {}", page, search_url);

            let html = fetcher.fetch(&self.search_request(search_url.clone())).await?;
            let hrefs = Self::parse_search_page(&html, &search_url)?;
            if hrefs.is_empty() {
                debug!("Page {} is empty, stopping", page);
                break;
            }

            for href in hrefs {
                if self.is_whitelisted(&href) {
                    debug!("Adding {}", href);
                    urls.push(base.join(&href)?);
                } else {
                    debug!("Skipping {} based on region", href);
                }
            }

            if page == max_pages {
                warn!("Stopped after {} result pages", max_pages);
            }
        }

        Ok(dedupe(urls))
    }

    fn listing_request(&self, url: &Url) -> PageRequest {
        PageRequest::http(url.clone())
    }

    fn extract(&self, page: &str, url: &Url) -> Result<Property> {
        let document = Html::parse_document(page);
        let title = document
            .select(&parse_selector("div#maincontent h1")?)
            .next()
            .map(element_text)
            .ok_or_else(|| {
                LandError::from(ExtractionError::new(
                    Source::UkLandAndFarms,
                    url.as_str(),
                    "title",
                    "no div#maincontent h1 heading",
                ))
            })?;

        let details = parse_title(&title, url)?;
        debug!("UK Land and Farms {}: {:?}", url, details);

        let mut raw_fields = BTreeMap::new();
        raw_fields.insert("title".to_string(), title);
        raw_fields.insert("sale_type".to_string(), details.sale_type.to_string());
        raw_fields.insert("pricing_type".to_string(), details.pricing_type.to_string());

        let listing_flags = match details.sale_type {
            SaleType::UnderOffer => vec![SaleType::UnderOffer.to_string()],
            _ => Vec::new(),
        };

        Ok(Property::new(
            url.clone(),
            Source::UkLandAndFarms,
            Some(details.acres),
            details.price,
            raw_fields,
            page_text(&document),
        )
        .with_listing_flags(listing_flags))
    }
}
