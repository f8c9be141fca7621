use std::path::Path;
use tabled::settings::{object::Columns, Modify, Style, Width};
use tabled::{Table, Tabled};

use crate::{Property, Result};

#[derive(Tabled)]
pub struct ListingTableRow {
    #[tabled(rename = "Source")]
    pub source: String,
    #[tabled(rename = "Acres", display_with = "display_right_7")]
    pub acres: String,
    #[tabled(rename = "Price", display_with = "display_right_11")]
    pub price: String,
    #[tabled(rename = "£/acre", display_with = "display_right_8")]
    pub price_per_acre: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "URL")]
    pub url: String,
}

fn display_right_7(s: &str) -> String {
    format!("{:>7}", s)
}

fn display_right_8(s: &str) -> String {
    format!("{:>8}", s)
}

fn display_right_11(s: &str) -> String {
    format!("{:>11}", s)
}

/// Property type as each site names it, for the summary table.
fn listing_kind(property: &Property) -> String {
    ["Type", "property_type", "pricing_type"]
        .iter()
        .find_map(|key| property.raw_field(key))
        .unwrap_or("N/A")
        .to_string()
}

impl ListingTableRow {
    pub fn from_property(property: &Property) -> Self {
        let acres = property
            .acres()
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "N/A".to_string());

        let price_per_acre = property
            .price_per_acre()
            .map(|p| format!("{:.0}", p))
            .unwrap_or_else(|| "N/A".to_string());

        Self {
            source: property.source().to_string(),
            acres,
            price: property.price().to_string(),
            price_per_acre,
            kind: listing_kind(property),
            url: property.url().to_string(),
        }
    }
}

pub fn create_listing_table(properties: &[Property]) -> String {
    let rows: Vec<ListingTableRow> = properties.iter().map(ListingTableRow::from_property).collect();

    let mut table = Table::new(&rows);

    table
        .with(Style::modern())
        .with(Modify::new(Columns::single(0)).with(Width::truncate(18)))
        .with(Modify::new(Columns::single(4)).with(Width::truncate(16)))
        .with(Modify::new(Columns::single(5)).with(Width::wrap(80)));

    table.to_string()
}

/// Writes accepted listings to a CSV file for later inspection.
pub fn write_listings_csv(path: &Path, properties: &[Property]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "Source",
        "URL",
        "Acres",
        "Price",
        "Price per acre",
        "Fields",
        "Fetched at",
    ])?;
    for property in properties {
        let fields = property
            .raw_fields()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        writer.write_record([
            property.source().key().to_string(),
            property.url().to_string(),
            property.acres().map(|a| a.to_string()).unwrap_or_default(),
            property.price().to_string(),
            property
                .price_per_acre()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            fields,
            property.fetched_at().to_rfc3339(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
