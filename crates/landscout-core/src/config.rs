//! Run configuration: filter thresholds, fetch settings and the per-source
//! region and red flag vocabularies. Everything has a compiled-in default so a
//! config file only needs the values it wants to change.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{LandError, RedFlagDetector, Result, SearchRegion, Source};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter: FilterConfig,
    pub throttle: ThrottleConfig,
    pub fetch: FetchConfig,
    pub sources: SourcesConfig,
}

impl Config {
    /// Reads a TOML config file, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        for source in Source::ALL {
            RedFlagDetector::new(&self.sources.get(source).red_flags)?;
        }
        Ok(())
    }
}

/// Thresholds applied to every normalized listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_acres: f64,
    pub max_acres: f64,
    pub max_price_per_acre: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_acres: 50.0,
            max_acres: 150.0,
            max_price_per_acre: 6000.0,
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_acres < 0.0 || self.min_acres > self.max_acres {
            return Err(LandError::Config(format!(
                "acreage range {}..={} is empty or negative",
                self.min_acres, self.max_acres
            )));
        }
        if self.max_price_per_acre <= 0.0 {
            return Err(LandError::Config(
                "max_price_per_acre must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Upper bound of the random pause after each listing fetch. Zero disables it.
    pub max_delay_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self { max_delay_secs: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    /// How long a browser fetch waits for its marker element.
    pub render_timeout_secs: u64,
    pub headless: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_executable: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            render_timeout_secs: 30,
            headless: true,
            chrome_executable: None,
        }
    }
}

impl FetchConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    /// Defaults to the name, which is what AddLand searches by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Only read by UK Land and Farms, which searches by region and county.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
}

impl RegionConfig {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            code: None,
            county: None,
        }
    }

    fn coded(name: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            code: Some(code.to_string()),
            county: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    /// Listing URLs must mention one of these (case-insensitive) to be kept.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url_whitelist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_days_since_added: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    pub fn search_regions(&self, source: Source) -> Vec<SearchRegion> {
        self.regions
            .iter()
            .map(|region| {
                let code = region.code.clone().unwrap_or_else(|| region.name.clone());
                let search = SearchRegion::new(source, region.name.clone(), code);
                match &region.county {
                    Some(county) => search.with_county(county.clone()),
                    None => search,
                }
            })
            .collect()
    }

    pub fn detector(&self) -> Result<RedFlagDetector> {
        RedFlagDetector::new(&self.red_flags)
    }
}

fn phrases(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const COMMON_FLAGS: &[&str] = &[
    "Peat bog",
    "Tenure not vacant",
    "Grade 1",
    "Grade 2",
    "SSSI",
];

const BUILDING_PLOT_FLAGS: &[&str] = &["Plot for sale", "Building Plot"];

const PLANNING_AND_COMMONS_FLAGS: &[&str] = &[
    "with planning permission",
    "Commoners Rights",
    "Common Land",
];

const PASTURE_FLAGS: &[&str] = &[
    "Productive Pasture",
    "pasture land",
    "arable land",
    "pasture/arable land",
];

fn addland_defaults() -> SourceConfig {
    let mut red_flags = vec!["Under Offer".to_string()];
    red_flags.extend(phrases(COMMON_FLAGS));
    red_flags.extend(phrases(PLANNING_AND_COMMONS_FLAGS));
    red_flags.extend(phrases(PASTURE_FLAGS));

    SourceConfig {
        enabled: true,
        regions: [
            "Devon",
            "Cornwall",
            "Herefordshire",
            "Wales",
            "Warwickshire",
            "Worcestershire",
        ]
        .iter()
        .map(|name| RegionConfig::named(name))
        .collect(),
        red_flags,
        url_whitelist: Vec::new(),
        max_price: None,
        max_days_since_added: None,
        cookie: None,
        max_pages: None,
    }
}

fn rightmove_defaults() -> SourceConfig {
    let mut red_flags = vec!["Under Offer".to_string()];
    red_flags.extend(phrases(&COMMON_FLAGS[..1]));
    red_flags.push("Blanket bog".to_string());
    red_flags.extend(phrases(&COMMON_FLAGS[1..]));
    red_flags.extend(phrases(BUILDING_PLOT_FLAGS));
    red_flags.extend(phrases(PLANNING_AND_COMMONS_FLAGS));
    red_flags.extend(phrases(PASTURE_FLAGS));

    SourceConfig {
        enabled: true,
        regions: vec![
            RegionConfig::coded("Devon", "REGION^61297"),
            RegionConfig::coded("Cornwall", "REGION^61294"),
            RegionConfig::coded("Herefordshire", "REGION^61304"),
            RegionConfig::coded("Worcestershire", "REGION^61329"),
            RegionConfig::coded("Warwickshire", "REGION^61327"),
            RegionConfig::coded("South Wales", "REGION^91990"),
        ],
        red_flags,
        url_whitelist: Vec::new(),
        max_price: Some(150_000),
        max_days_since_added: Some(14),
        cookie: None,
        max_pages: None,
    }
}

fn uklandandfarms_defaults() -> SourceConfig {
    let mut red_flags = phrases(&COMMON_FLAGS[..2]);
    red_flags.extend(phrases(&["Currently let", "Currently occupied"]));
    red_flags.extend(phrases(&COMMON_FLAGS[2..]));
    red_flags.extend(phrases(BUILDING_PLOT_FLAGS));
    red_flags.extend(phrases(PLANNING_AND_COMMONS_FLAGS));
    red_flags.extend(phrases(&[
        "Freehold woodland",
        "Commercial woodland",
        "woodland investment",
    ]));
    red_flags.extend(phrases(PASTURE_FLAGS));

    SourceConfig {
        enabled: true,
        // The site's region parameter is unreliable, so search everything and
        // rely on the whitelist instead.
        regions: vec![RegionConfig::coded("All regions", "")],
        red_flags,
        url_whitelist: phrases(&[
            "Devon",
            "Cornwall",
            "Herefordshire",
            "Worcestershire",
            "Warwickshire",
            "South-Wales",
        ]),
        max_price: Some(1_000_000),
        max_days_since_added: None,
        cookie: Some("ASP.NET_SessionId=hzxxhtfyslczsa55i1tdka45".to_string()),
        max_pages: Some(50),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "addland_defaults")]
    pub addland: SourceConfig,
    #[serde(default = "rightmove_defaults")]
    pub rightmove: SourceConfig,
    #[serde(default = "uklandandfarms_defaults")]
    pub uklandandfarms: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            addland: addland_defaults(),
            rightmove: rightmove_defaults(),
            uklandandfarms: uklandandfarms_defaults(),
        }
    }
}

impl SourcesConfig {
    pub fn get(&self, source: Source) -> &SourceConfig {
        match source {
            Source::AddLand => &self.addland,
            Source::Rightmove => &self.rightmove,
            Source::UkLandAndFarms => &self.uklandandfarms,
        }
    }

    pub fn enabled(&self) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|source| self.get(*source).enabled)
            .collect()
    }
}
