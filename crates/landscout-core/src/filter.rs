use std::collections::HashMap;
use std::fmt;

use crate::{FilterConfig, PriceOutcome, Property, RedFlagDetector, Result, Source, SourcesConfig};

/// Why a listing was dropped. Each variant carries the value that tripped it.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    UnknownAcreage,
    AcreageOutOfRange { acres: f64, min: f64, max: f64 },
    PriceOnApplication,
    UnknownPrice,
    PricePerAcreUndefined,
    PricePerAcreTooHigh { price_per_acre: f64, max: f64 },
    RedFlags(Vec<String>),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownAcreage => write!(f, "size of property unknown"),
            Rejection::AcreageOutOfRange { acres, min, max } => write!(
                f,
                "size of property: {} acres (wanted {}-{})",
                acres, min, max
            ),
            Rejection::PriceOnApplication => write!(f, "price on application"),
            Rejection::UnknownPrice => write!(f, "price unknown"),
            Rejection::PricePerAcreUndefined => write!(f, "price per acre undefined"),
            Rejection::PricePerAcreTooHigh {
                price_per_acre,
                max,
            } => write!(
                f,
                "price per acre: £{:.1} (ceiling £{:.0})",
                price_per_acre, max
            ),
            Rejection::RedFlags(flags) => write!(f, "red flags: {}", flags.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(reason) => Some(reason),
        }
    }
}

/// Runs the acreage, price and red flag checks in that order; the first
/// failing check decides the verdict.
pub fn accept(property: &Property, config: &FilterConfig, flags: &RedFlagDetector) -> Verdict {
    let acres = match property.acres() {
        Some(acres) => acres,
        None => return Verdict::Rejected(Rejection::UnknownAcreage),
    };
    if acres < config.min_acres || acres > config.max_acres {
        return Verdict::Rejected(Rejection::AcreageOutOfRange {
            acres,
            min: config.min_acres,
            max: config.max_acres,
        });
    }

    match property.price() {
        PriceOutcome::OnApplication => return Verdict::Rejected(Rejection::PriceOnApplication),
        PriceOutcome::Unknown => return Verdict::Rejected(Rejection::UnknownPrice),
        PriceOutcome::Known(_) => {}
    }
    match property.price_per_acre() {
        None => return Verdict::Rejected(Rejection::PricePerAcreUndefined),
        Some(price_per_acre) if price_per_acre > config.max_price_per_acre => {
            return Verdict::Rejected(Rejection::PricePerAcreTooHigh {
                price_per_acre,
                max: config.max_price_per_acre,
            })
        }
        Some(_) => {}
    }

    let found = flags.detect_for(property);
    if !found.is_empty() {
        return Verdict::Rejected(Rejection::RedFlags(found));
    }

    Verdict::Accepted
}

/// The thresholds plus one compiled red flag detector per source.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    config: FilterConfig,
    detectors: HashMap<Source, RedFlagDetector>,
}

impl FilterPipeline {
    pub fn new(config: FilterConfig, sources: &SourcesConfig) -> Result<Self> {
        config.validate()?;
        let detectors = Source::ALL
            .into_iter()
            .map(|source| Ok((source, sources.get(source).detector()?)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self { config, detectors })
    }

    pub fn detector(&self, source: Source) -> Option<&RedFlagDetector> {
        self.detectors.get(&source)
    }

    pub fn evaluate(&self, property: &Property) -> Verdict {
        match self.detectors.get(&property.source()) {
            Some(detector) => accept(property, &self.config, detector),
            None => accept(property, &self.config, &RedFlagDetector::default()),
        }
    }
}
