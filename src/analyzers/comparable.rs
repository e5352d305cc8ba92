use crate::analyzers::types::CountrySeries;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Country code whose reporting dates define comparability by default.
pub const REFERENCE_CODE: &str = "USA";

/// Returns the codes of every series whose set of report dates equals the
/// reference country's. An absent reference yields an empty set.
pub fn comparable_countries(series: &[CountrySeries], reference: &str) -> BTreeSet<String> {
    let Some(reference_series) = series.iter().find(|s| s.code == reference) else {
        warn!(
            reference,
            "Reference country missing from feed, no countries are comparable"
        );
        return BTreeSet::new();
    };
    let reference_dates = reference_series.distinct_dates();

    let comparable: BTreeSet<String> = series
        .iter()
        .filter(|s| s.distinct_dates() == reference_dates)
        .map(|s| s.code.clone())
        .collect();

    debug!(
        reference,
        reference_days = reference_dates.len(),
        comparable = comparable.len(),
        "Comparable countries determined"
    );
    comparable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::build_series;
    use crate::parser::RawRecord;
    use chrono::NaiveDate;

    fn series(code: &str, days: &[u32]) -> CountrySeries {
        let rows = days
            .iter()
            .map(|&d| RawRecord {
                country_name: code.to_string(),
                primary_code: code.to_string(),
                secondary_code: String::new(),
                date: NaiveDate::from_ymd_opt(2020, 1, d).unwrap(),
                new_cases: 1,
                new_deaths: 0,
                population: 100,
            })
            .collect();
        build_series(code, rows)
    }

    #[test]
    fn test_only_matching_date_sets_are_comparable() {
        let all = vec![series("USA", &[1, 2]), series("BBB", &[1]), series("CCC", &[2, 1])];
        let comparable = comparable_countries(&all, REFERENCE_CODE);

        assert!(comparable.contains("USA"));
        assert!(!comparable.contains("BBB"));
        assert!(comparable.contains("CCC"));
    }

    #[test]
    fn test_duplicate_dates_use_set_semantics() {
        let all = vec![series("USA", &[1, 2]), series("DDD", &[1, 2, 2])];
        let comparable = comparable_countries(&all, REFERENCE_CODE);
        assert!(comparable.contains("DDD"));
    }

    #[test]
    fn test_superset_is_not_comparable() {
        let all = vec![series("USA", &[1, 2]), series("EEE", &[1, 2, 3])];
        let comparable = comparable_countries(&all, REFERENCE_CODE);
        assert_eq!(comparable.len(), 1);
    }

    #[test]
    fn test_missing_reference_yields_empty_set() {
        let all = vec![series("ITA", &[1, 2]), series("FRA", &[1, 2])];
        assert!(comparable_countries(&all, REFERENCE_CODE).is_empty());
    }

    #[test]
    fn test_custom_reference() {
        let all = vec![series("USA", &[1]), series("ITA", &[1, 2]), series("FRA", &[1, 2])];
        let comparable = comparable_countries(&all, "ITA");
        assert_eq!(
            comparable.into_iter().collect::<Vec<_>>(),
            vec!["FRA".to_string(), "ITA".to_string()]
        );
    }
}
