use landscout_core::{write_listings_csv, PriceOutcome, Property, Source};
use std::collections::BTreeMap;
use tempfile::tempdir;
use url::Url;

fn listing(path: &str, acres: f64, price: f64) -> Property {
    let mut fields = BTreeMap::new();
    fields.insert("pricing_type".to_string(), "Guide Price".to_string());
    Property::new(
        Url::parse(&format!("https://www.uklandandfarms.co.uk{}", path)).unwrap(),
        Source::UkLandAndFarms,
        Some(acres),
        PriceOutcome::Known(price),
        fields,
        String::new(),
    )
}

#[test]
fn test_export_writes_one_row_per_listing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("accepted.csv");
    let listings = vec![
        listing("/land/devon/a", 80.0, 400_000.0),
        listing("/land/cornwall/b", 63.36, 300_000.0),
    ];

    write_listings_csv(&path, &listings).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Source");
    assert_eq!(&headers[1], "URL");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "uklandandfarms");
    assert_eq!(&rows[0][1], "https://www.uklandandfarms.co.uk/land/devon/a");
    assert!(rows[1][5].contains("pricing_type=Guide Price"));
}

#[test]
fn test_export_of_nothing_is_just_a_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    write_listings_csv(&path, &[]).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.headers().unwrap().len(), 7);
    assert_eq!(reader.records().count(), 0);
}
