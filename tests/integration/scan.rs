use landscout_core::{Config, PriceOutcome, RegionConfig, Rejection, Source};
use landscout_scrapers::{RightmoveScraper, Scanner, ThrottlePolicy, UkLandAndFarmsScraper};
use std::sync::Arc;

use crate::support::*;

const RIGHTMOVE: &str = "https://www.rightmove.co.uk";
const UKLF: &str = "https://www.uklandandfarms.co.uk";

fn rightmove_region(name: &str, code: &str) -> RegionConfig {
    RegionConfig {
        name: name.to_string(),
        code: Some(code.to_string()),
        county: None,
    }
}

fn devon_only(mut config: Config) -> Config {
    config.sources.rightmove.regions = vec![rightmove_region("Devon", "REGION^61297")];
    config
}

fn fixture_fetcher(config: &Config) -> FixtureFetcher {
    let rightmove = RightmoveScraper::new(config.sources.rightmove.clone());
    let uklf = UkLandAndFarmsScraper::new(config.sources.uklandandfarms.clone());

    FixtureFetcher::default()
        .with_page(rightmove.search_url("REGION^61297").unwrap(), RIGHTMOVE_SEARCH)
        .with_page(format!("{}/properties/131000001", RIGHTMOVE), RIGHTMOVE_ACRES)
        .with_page(format!("{}/properties/131000002", RIGHTMOVE), RIGHTMOVE_POA)
        .with_page(format!("{}/properties/131000003", RIGHTMOVE), RIGHTMOVE_PLOT)
        .with_page(uklf.search_url("", "", 1).unwrap(), UKLF_RESULTS)
        .with_page(uklf.search_url("", "", 2).unwrap(), UKLF_EMPTY)
        .with_page(
            format!("{}/land-for-sale/devon/holsworthy/straloch-farm-5501", UKLF),
            UKLF_LISTING,
        )
        .with_page(
            format!("{}/land-for-sale/South-Wales/carmarthen/bryn-5503", UKLF),
            UKLF_LET,
        )
}

#[tokio::test]
async fn test_scan_accepts_only_clean_affordable_listings() {
    let config = devon_only(Config::default());
    let fetcher = fixture_fetcher(&config);
    let viewer = Arc::new(RecordingViewer::default());

    let scanner = Scanner::new(
        &config,
        &[Source::Rightmove, Source::UkLandAndFarms],
        viewer.clone(),
        ThrottlePolicy::disabled(),
    )
    .unwrap();
    let report = scanner.run(&fetcher).await;

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.examined, 5);
    assert_eq!(
        *viewer.opened.lock().unwrap(),
        vec![
            format!("{}/properties/131000001", RIGHTMOVE),
            format!("{}/land-for-sale/devon/holsworthy/straloch-farm-5501", UKLF),
        ]
    );

    let rightmove = &report.accepted[0];
    assert_eq!(rightmove.acres(), Some(84.2));
    assert_eq!(rightmove.price(), PriceOutcome::Known(420_000.0));
    assert_eq!(rightmove.price_per_acre(), Some(4988.1));

    let uklf = &report.accepted[1];
    assert_eq!(uklf.acres(), Some(63.36));
    assert_eq!(uklf.price_per_acre(), Some(4734.8));
    assert_eq!(uklf.raw_field("pricing_type"), Some("Guide Price"));

    let rejections: Vec<(String, Rejection)> = report
        .rejected
        .iter()
        .map(|(url, reason)| (url.path().to_string(), reason.clone()))
        .collect();
    assert_eq!(
        rejections,
        vec![
            ("/properties/131000002".to_string(), Rejection::PriceOnApplication),
            (
                "/properties/131000003".to_string(),
                Rejection::RedFlags(vec!["Building Plot".to_string()])
            ),
            (
                "/land-for-sale/South-Wales/carmarthen/bryn-5503".to_string(),
                Rejection::RedFlags(vec!["Currently let".to_string()])
            ),
        ]
    );
}

#[tokio::test]
async fn test_scan_skips_regions_outside_whitelist_and_sends_cookie() {
    let config = devon_only(Config::default());
    let fetcher = fixture_fetcher(&config);

    let scanner = Scanner::new(
        &config,
        &[Source::UkLandAndFarms],
        Arc::new(RecordingViewer::default()),
        ThrottlePolicy::disabled(),
    )
    .unwrap();
    scanner.run(&fetcher).await;

    let requested = fetcher.requested();
    assert!(!requested.iter().any(|url| url.contains("aberdeenshire")));

    let first_search = UkLandAndFarmsScraper::new(config.sources.uklandandfarms.clone())
        .search_url("", "", 1)
        .unwrap();
    assert_eq!(requested[0], first_search.as_str());
    assert_eq!(
        fetcher.headers_for(first_search.as_str()),
        vec![(
            "Cookie".to_string(),
            "ASP.NET_SessionId=hzxxhtfyslczsa55i1tdka45".to_string()
        )]
    );
}

#[tokio::test]
async fn test_tighter_price_ceiling_rejects_everything() {
    let mut config = devon_only(Config::default());
    config.filter.max_price_per_acre = 4000.0;
    let fetcher = fixture_fetcher(&config);
    let viewer = Arc::new(RecordingViewer::default());

    let scanner = Scanner::new(
        &config,
        &[Source::Rightmove, Source::UkLandAndFarms],
        viewer.clone(),
        ThrottlePolicy::disabled(),
    )
    .unwrap();
    let report = scanner.run(&fetcher).await;

    assert!(report.accepted.is_empty());
    assert!(viewer.opened.lock().unwrap().is_empty());
    // The plot's 5000/acre now fails on price before its red flag is looked at.
    assert!(report.rejected.iter().any(|(url, reason)| {
        url.path() == "/properties/131000003"
            && matches!(reason, Rejection::PricePerAcreTooHigh { price_per_acre, .. } if *price_per_acre == 5000.0)
    }));
}

#[tokio::test]
async fn test_failed_search_does_not_stop_other_sources() {
    let mut config = devon_only(Config::default());
    config
        .sources
        .rightmove
        .regions
        .push(rightmove_region("Cornwall", "REGION^61294"));
    let fetcher = fixture_fetcher(&config);

    let scanner = Scanner::new(
        &config,
        &[Source::Rightmove, Source::UkLandAndFarms],
        Arc::new(RecordingViewer::default()),
        ThrottlePolicy::disabled(),
    )
    .unwrap();
    let report = scanner.run(&fetcher).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, Source::Rightmove);
    assert_eq!(report.failures[0].region, "Cornwall");
    assert_eq!(report.accepted.len(), 2);
}

#[tokio::test]
async fn test_listing_in_overlapping_regions_is_examined_once() {
    let mut config = devon_only(Config::default());
    config
        .sources
        .rightmove
        .regions
        .push(rightmove_region("Mid Devon", "REGION^61298"));
    let rightmove = RightmoveScraper::new(config.sources.rightmove.clone());
    let fetcher = fixture_fetcher(&config)
        .with_page(rightmove.search_url("REGION^61298").unwrap(), RIGHTMOVE_SEARCH);
    let viewer = Arc::new(RecordingViewer::default());

    let scanner = Scanner::new(
        &config,
        &[Source::Rightmove],
        viewer.clone(),
        ThrottlePolicy::disabled(),
    )
    .unwrap();
    let report = scanner.run(&fetcher).await;

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.examined, 3);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(
        *viewer.opened.lock().unwrap(),
        vec![format!("{}/properties/131000001", RIGHTMOVE)]
    );

    let requested = fetcher.requested();
    let listing_fetches = requested
        .iter()
        .filter(|url| url.ends_with("/properties/131000001"))
        .count();
    assert_eq!(listing_fetches, 1);
    assert!(requested.iter().any(|url| url.contains("REGION%5E61298")));
}
