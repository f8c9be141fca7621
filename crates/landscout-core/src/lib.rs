use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use url::Url;

mod config;
mod display;
mod error;
mod filter;
mod red_flags;
pub mod units;

pub use config::{
    Config, FetchConfig, FilterConfig, RegionConfig, SourceConfig, SourcesConfig, ThrottleConfig,
};
pub use display::{create_listing_table, write_listings_csv, ListingTableRow};
pub use error::{ExtractionError, LandError, Result};
pub use filter::{accept, FilterPipeline, Rejection, Verdict};
pub use red_flags::RedFlagDetector;

/// The listing sites landscout knows how to read.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// addland.com: client-rendered pages with label/value summary blocks
    #[value(name = "addland")]
    AddLand,
    /// rightmove.co.uk: listing data embedded as JSON in a script tag
    Rightmove,
    /// uklandandfarms.co.uk: everything lives in the listing heading
    #[value(name = "uklandandfarms")]
    UkLandAndFarms,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::AddLand, Source::Rightmove, Source::UkLandAndFarms];

    /// Key used for this source in configuration files and exports.
    pub fn key(&self) -> &'static str {
        match self {
            Source::AddLand => "addland",
            Source::Rightmove => "rightmove",
            Source::UkLandAndFarms => "uklandandfarms",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::AddLand => write!(f, "AddLand"),
            Source::Rightmove => write!(f, "Rightmove"),
            Source::UkLandAndFarms => write!(f, "UK Land and Farms"),
        }
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "addland" => Ok(Source::AddLand),
            "rightmove" => Ok(Source::Rightmove),
            "uklandandfarms" | "uklaf" => Ok(Source::UkLandAndFarms),
            _ => Err(format!(
                "Invalid source: {}. Valid options are: addland, rightmove, uklandandfarms",
                s
            )),
        }
    }
}

/// What a listing says about its asking price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum PriceOutcome {
    /// A positive GBP amount.
    Known(f64),
    /// "POA": the seller wants enquiries before naming a price.
    OnApplication,
    /// No usable price, e.g. the listing is sold or the text did not parse.
    Unknown,
}

impl PriceOutcome {
    /// Wraps a parsed amount, refusing zero, negative and non-finite values.
    pub fn from_amount(amount: Option<f64>) -> Self {
        match amount {
            Some(value) if value.is_finite() && value > 0.0 => PriceOutcome::Known(value),
            _ => PriceOutcome::Unknown,
        }
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            PriceOutcome::Known(value) => Some(*value),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceOutcome::Known(value) => write!(f, "£{:.0}", value),
            PriceOutcome::OnApplication => write!(f, "POA"),
            PriceOutcome::Unknown => write!(f, "unknown"),
        }
    }
}

/// A listing normalized into the shape every filter works on.
///
/// Built once per fetched page and never changed afterwards; the derived
/// price per acre is computed here so it cannot drift from acres and price.
#[derive(Debug, Clone, Serialize)]
pub struct Property {
    url: Url,
    source: Source,
    acres: Option<f64>,
    price: PriceOutcome,
    price_per_acre: Option<f64>,
    raw_fields: BTreeMap<String, String>,
    listing_flags: Vec<String>,
    #[serde(skip)]
    page_text: String,
    fetched_at: DateTime<Utc>,
}

impl Property {
    pub fn new(
        url: Url,
        source: Source,
        acres: Option<f64>,
        price: PriceOutcome,
        raw_fields: BTreeMap<String, String>,
        page_text: String,
    ) -> Self {
        let price_per_acre = match (acres, price) {
            (Some(acres), PriceOutcome::Known(price)) if acres > 0.0 && price > 0.0 => {
                Some(units::round_to(price / acres, 1))
            }
            _ => None,
        };

        Self {
            url,
            source,
            acres,
            price,
            price_per_acre,
            raw_fields,
            listing_flags: Vec::new(),
            page_text,
            fetched_at: Utc::now(),
        }
    }

    /// Attaches flags derived from extracted fields rather than from page text.
    pub fn with_listing_flags(mut self, flags: Vec<String>) -> Self {
        self.listing_flags = flags;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn acres(&self) -> Option<f64> {
        self.acres
    }

    pub fn price(&self) -> PriceOutcome {
        self.price
    }

    pub fn price_per_acre(&self) -> Option<f64> {
        self.price_per_acre
    }

    pub fn raw_fields(&self) -> &BTreeMap<String, String> {
        &self.raw_fields
    }

    pub fn raw_field(&self, key: &str) -> Option<&str> {
        self.raw_fields.get(key).map(String::as_str)
    }

    pub fn listing_flags(&self) -> &[String] {
        &self.listing_flags
    }

    pub fn page_text(&self) -> &str {
        &self.page_text
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// A statically configured search area on one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRegion {
    pub source: Source,
    /// Human readable name used in logs.
    pub name: String,
    /// Site specific identifier: a county, a `REGION^nnnn` code or a query value.
    pub code: String,
    /// Narrows sites that search by region and county separately.
    pub county: Option<String>,
}

impl SearchRegion {
    pub fn new(source: Source, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            code: code.into(),
            county: None,
        }
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }
}
