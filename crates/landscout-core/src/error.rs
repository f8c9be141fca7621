use std::io;
use thiserror::Error;

use crate::Source;

/// A listing page did not contain a field its extractor depends on.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{site} listing {url}: missing or malformed `{field}` ({reason})")]
pub struct ExtractionError {
    pub site: Source,
    pub url: String,
    pub field: String,
    pub reason: String,
}

impl ExtractionError {
    pub fn new(
        site: Source,
        url: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            site,
            url: url.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LandError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Scraping error: {0}")]
    Scraping(String),
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl LandError {
    /// Extraction failures only cost a single listing; everything else aborts the region.
    pub fn is_listing_local(&self) -> bool {
        matches!(self, LandError::Extraction(_))
    }
}

pub type Result<T> = std::result::Result<T, LandError>;
