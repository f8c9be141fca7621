//! Area conversions and GBP amount parsing shared by every extractor.

pub const SQUARE_METRES_PER_ACRE: f64 = 4046.85642;
pub const ACRES_PER_SQUARE_FOOT: f64 = 0.0026598201911744;

/// Rounds to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn square_metres_to_acres(sqm: f64) -> f64 {
    round_to(sqm / SQUARE_METRES_PER_ACRE, 2)
}

pub fn acres_to_square_metres(acres: f64) -> f64 {
    acres * SQUARE_METRES_PER_ACRE
}

pub fn square_feet_to_acres(sqft: f64) -> f64 {
    round_to(sqft * ACRES_PER_SQUARE_FOOT, 2)
}

/// Parses an en-GB formatted number ("1,950,000" or "12.5"), commas being thousands separators.
pub fn parse_gb_number(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Finds the first GBP amount in `text`.
///
/// Pages served with the wrong charset render the pound sign as `Â£`; both the
/// artifact and the symbol itself are ignored, only the first numeric run counts.
pub fn parse_gbp_amount(text: &str) -> Option<f64> {
    let cleaned = text.replace('Â', "").replace('£', " ");
    let start = cleaned.find(|c: char| c.is_ascii_digit())?;
    let amount: String = cleaned[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    parse_gb_number(amount.trim_end_matches('.'))
}
