use regex::{Regex, RegexBuilder};

use crate::{LandError, Property, Result};

/// Scans listing text for phrases that rule a property out.
///
/// Phrases are case-insensitive regular expressions; plain phrases such as
/// `"pasture/arable land"` simply match literally.
#[derive(Debug, Clone, Default)]
pub struct RedFlagDetector {
    flags: Vec<(String, Regex)>,
}

impl RedFlagDetector {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Result<Self> {
        let flags = phrases
            .iter()
            .map(|phrase| {
                let phrase = phrase.as_ref();
                RegexBuilder::new(phrase)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| (phrase.to_string(), regex))
                    .map_err(|e| LandError::Config(format!("invalid red flag `{}`: {}", phrase, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { flags })
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Returns the configured phrases found in `page_text`, in configured order.
    pub fn detect(&self, page_text: &str) -> Vec<String> {
        self.flags
            .iter()
            .filter(|(_, regex)| regex.is_match(page_text))
            .map(|(phrase, _)| phrase.clone())
            .collect()
    }

    /// Field-derived flags on the property come first, then text hits.
    pub fn detect_for(&self, property: &Property) -> Vec<String> {
        let mut found = property.listing_flags().to_vec();
        found.extend(self.detect(property.page_text()));
        found
    }
}
