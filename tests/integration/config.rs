use landscout_core::{Config, LandError, Source};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_partial_config_keeps_other_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[filter]
max_price_per_acre = 8000.0

[sources.addland]
enabled = false

[sources.rightmove]
regions = [{{ name = "Devon", code = "REGION^61297" }}]
red_flags = ["Peat bog"]
"#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.filter.max_price_per_acre, 8000.0);
    assert_eq!(config.filter.min_acres, 50.0);
    assert_eq!(config.sources.enabled(), vec![Source::Rightmove, Source::UkLandAndFarms]);
    assert_eq!(config.sources.rightmove.regions.len(), 1);
    assert_eq!(config.sources.rightmove.red_flags, vec!["Peat bog".to_string()]);
    assert_eq!(config.sources.uklandandfarms.max_pages, Some(50));
}

#[test]
fn test_default_config_round_trips_through_toml() {
    let text = Config::default().to_toml().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.sources, Config::default().sources);
}

#[test]
fn test_invalid_red_flag_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[sources.uklandandfarms]\nred_flags = [\"(unclosed\"]").unwrap();

    let err = Config::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, LandError::Config(_)));
}
