use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use landscout_core::{Config, FilterPipeline, PriceOutcome, Property, Source};
use landscout_scrapers::uklandandfarms::parse_title;
use landscout_scrapers::{RightmoveScraper, Scraper, UkLandAndFarmsScraper};
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

const RIGHTMOVE_LISTING: &str = include_str!("../fixtures/rightmove_listing_acres.html");
const RIGHTMOVE_SEARCH: &str = include_str!("../fixtures/rightmove_search.html");
const UKLF_LISTING: &str = include_str!("../fixtures/uklandandfarms_listing.html");

const PAGE_WORDS: &[&str] = &[
    "grazing", "stream", "hedged", "boundaries", "access", "track", "woodland", "gate",
    "pasture", "peat", "bog", "south", "facing", "slope", "spring", "water",
];

// Random listings with a page of filler text, some of it red flag material
fn generate_properties(count: usize) -> Vec<Property> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let text: Vec<&str> = (0..400)
                .map(|_| PAGE_WORDS[rng.gen_range(0..PAGE_WORDS.len())])
                .collect();
            Property::new(
                Url::parse(&format!("https://www.rightmove.co.uk/properties/{}", i)).unwrap(),
                Source::Rightmove,
                Some(rng.gen_range(10.0..250.0)),
                PriceOutcome::Known(rng.gen_range(50_000.0..1_500_000.0)),
                BTreeMap::new(),
                text.join(" "),
            )
        })
        .collect()
}

fn bench_extraction(c: &mut Criterion) {
    let config = Config::default();
    let rightmove = RightmoveScraper::new(config.sources.rightmove.clone());
    let uklf = UkLandAndFarmsScraper::new(config.sources.uklandandfarms.clone());
    let rightmove_url = Url::parse("https://www.rightmove.co.uk/properties/131000001").unwrap();
    let uklf_url =
        Url::parse("https://www.uklandandfarms.co.uk/land-for-sale/devon/holsworthy/5501").unwrap();
    let search_url = rightmove.search_url("REGION^61297").unwrap();

    let mut group = c.benchmark_group("extraction");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("rightmove_listing", |b| {
        b.iter(|| black_box(rightmove.extract(black_box(RIGHTMOVE_LISTING), &rightmove_url).unwrap()))
    });
    group.bench_function("rightmove_search", |b| {
        b.iter(|| {
            black_box(RightmoveScraper::parse_search_page(black_box(RIGHTMOVE_SEARCH), &search_url).unwrap())
        })
    });
    group.bench_function("uklandandfarms_listing", |b| {
        b.iter(|| black_box(uklf.extract(black_box(UKLF_LISTING), &uklf_url).unwrap()))
    });
    group.bench_function("uklandandfarms_title", |b| {
        let title = "63.36 acres, Straloch House, Newmachar, Aberdeenshire, AB21, Highlands and Islands<br /> For Sale - Offers Over £1,950,000<br />";
        b.iter(|| black_box(parse_title(black_box(title), &uklf_url).unwrap()))
    });

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let config = Config::default();
    let pipeline = FilterPipeline::new(config.filter, &config.sources).unwrap();

    let mut group = c.benchmark_group("filter");
    group.sample_size(20);

    for size in [10, 100, 1000].iter() {
        let properties = generate_properties(*size);
        group.bench_with_input(BenchmarkId::new("evaluate", size), &properties, |b, properties| {
            b.iter(|| {
                properties
                    .iter()
                    .filter(|p| pipeline.evaluate(black_box(p)).is_accepted())
                    .count()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_extraction, bench_filter);
criterion_main!(benches);
