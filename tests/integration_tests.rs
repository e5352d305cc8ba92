use covid_data_viewer::analyzers::types::Metric;
use covid_data_viewer::dataset::{CompareError, LookupError};
use covid_data_viewer::load_dataset;
use covid_data_viewer::parser::{RowError, parse_feed};

const SAMPLE_FEED: &str = include_str!("fixtures/sample_feed.csv");

#[test]
fn test_full_pipeline() {
    let dataset = load_dataset(SAMPLE_FEED, "USA").expect("Failed to load feed");

    assert_eq!(dataset.len(), 4);
    assert_eq!(
        dataset.column("USA", Metric::TotalCases).unwrap(),
        vec![8.0, 28.0, 328.0, 828.0, 2028.0]
    );
    assert_eq!(
        dataset.column("ITA", Metric::TotalDeaths).unwrap(),
        vec![8.0, 25.0, 53.0, 160.0, 209.0]
    );
}

#[test]
fn test_rejected_rows_are_reported() {
    let parsed = parse_feed(SAMPLE_FEED).unwrap();
    assert_eq!(parsed.rejected.len(), 1);
    assert_eq!(parsed.rejected[0].error, RowError::MissingCode);
}

#[test]
fn test_every_series_is_ascending_and_cumulative() {
    let dataset = load_dataset(SAMPLE_FEED, "USA").unwrap();

    for (_, code) in dataset.countries() {
        let series = dataset.series(code).unwrap();
        let first = &series.records[0];
        assert_eq!(first.total_cases, first.new_cases);
        assert_eq!(first.total_deaths, first.new_deaths);
        for pair in series.records.windows(2) {
            assert!(pair[0].date <= pair[1].date);
            assert_eq!(pair[1].total_cases, pair[0].total_cases + pair[1].new_cases);
            assert_eq!(pair[1].total_deaths, pair[0].total_deaths + pair[1].new_deaths);
        }
    }
}

#[test]
fn test_comparable_countries_follow_reference_dates() {
    let dataset = load_dataset(SAMPLE_FEED, "USA").unwrap();

    let comparable: Vec<&str> = dataset
        .comparable_countries()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(comparable, vec!["ITA", "USA"]);
    assert_eq!(
        dataset.ensure_comparable(&["USA", "SMR"]),
        Err(CompareError::NotComparable("SMR".to_string()))
    );
}

#[test]
fn test_missing_reference_leaves_nothing_comparable() {
    let dataset = load_dataset(SAMPLE_FEED, "DEU").unwrap();
    assert!(dataset.comparable_countries().is_empty());
}

#[test]
fn test_secondary_code_and_zero_population() {
    let dataset = load_dataset(SAMPLE_FEED, "USA").unwrap();

    let code = dataset
        .code_for_name("Cases_on_an_international_conveyance_Japan")
        .unwrap();
    assert_eq!(code, "JPG11668");
    assert_eq!(
        dataset.column(code, Metric::CasesPerMillion).unwrap(),
        vec![0.0, 0.0]
    );
    assert_eq!(
        dataset.column(code, Metric::InfectionRate).unwrap(),
        vec![0.0, 0.0]
    );
}

#[test]
fn test_lookups() {
    let dataset = load_dataset(SAMPLE_FEED, "USA").unwrap();

    assert_eq!(dataset.name_for_code("SMR").unwrap(), "SAN MARINO");
    assert_eq!(dataset.code_for_name("san marino").unwrap(), "SMR");
    assert_eq!(
        dataset.series("XXX").unwrap_err(),
        LookupError::NotFound("XXX".to_string())
    );
    assert_eq!(dataset.dates("SMR").unwrap().len(), 3);
}
