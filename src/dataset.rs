//! The aggregated, read-only view of the whole feed and its lookups.

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::comparable::comparable_countries;
use crate::analyzers::types::{CountrySeries, Metric};
use crate::parser::{RawRecord, normalize_name};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("country {0:?} not found")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("{0} is not in the 'Comparable Countries' list")]
    NotComparable(String),
}

/// Every country's series plus the name/code lookups and the comparable set.
///
/// Built once from the feed and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct WorldDataset {
    series: BTreeMap<String, CountrySeries>,
    codes_by_name: BTreeMap<String, String>,
    names_by_code: BTreeMap<String, String>,
    comparable: BTreeSet<String>,
    reference: String,
}

impl WorldDataset {
    pub fn from_records(records: Vec<RawRecord>, reference: &str) -> Self {
        Self::from_series(aggregate(records), reference)
    }

    /// When two codes share a name, the name resolves to the code that sorts
    /// last.
    pub fn from_series(series: Vec<CountrySeries>, reference: &str) -> Self {
        let comparable = comparable_countries(&series, reference);

        let names_by_code: BTreeMap<String, String> = series
            .iter()
            .map(|s| (s.code.clone(), s.name.clone()))
            .collect();
        let codes_by_name: BTreeMap<String, String> = series
            .iter()
            .map(|s| (s.name.clone(), s.code.clone()))
            .collect();
        let series: BTreeMap<String, CountrySeries> =
            series.into_iter().map(|s| (s.code.clone(), s)).collect();

        info!(
            countries = series.len(),
            comparable = comparable.len(),
            reference,
            "World dataset built"
        );

        Self {
            series,
            codes_by_name,
            names_by_code,
            comparable,
            reference: reference.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.series.contains_key(code)
    }

    pub fn reference_code(&self) -> &str {
        &self.reference
    }

    /// Accepts feed spelling or display spelling (`United_Kingdom`,
    /// `united kingdom`).
    pub fn code_for_name(&self, name: &str) -> Result<&str, LookupError> {
        self.codes_by_name
            .get(&normalize_name(name))
            .map(String::as_str)
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }

    pub fn name_for_code(&self, code: &str) -> Result<&str, LookupError> {
        self.names_by_code
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| LookupError::NotFound(code.to_string()))
    }

    pub fn series(&self, code: &str) -> Result<&CountrySeries, LookupError> {
        self.series
            .get(code)
            .ok_or_else(|| LookupError::NotFound(code.to_string()))
    }

    pub fn dates(&self, code: &str) -> Result<Vec<NaiveDate>, LookupError> {
        Ok(self.series(code)?.dates())
    }

    /// One column of a country's series, aligned by index with
    /// [`WorldDataset::dates`].
    pub fn column(&self, code: &str, metric: Metric) -> Result<Vec<f64>, LookupError> {
        Ok(self.series(code)?.column(metric))
    }

    pub fn comparable_countries(&self) -> &BTreeSet<String> {
        &self.comparable
    }

    pub fn is_comparable(&self, code: &str) -> bool {
        self.comparable.contains(code)
    }

    /// Checks that every code may take part in a comparison chart.
    pub fn ensure_comparable(&self, codes: &[&str]) -> Result<(), CompareError> {
        match codes.iter().find(|c| !self.is_comparable(c)) {
            Some(code) => Err(CompareError::NotComparable(code.to_string())),
            None => Ok(()),
        }
    }

    /// Every `(name, code)` pair, sorted by name then code. Codes sharing a
    /// name are all listed.
    pub fn countries(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .names_by_code
            .iter()
            .map(|(code, name)| (name.as_str(), code.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, code: &str, day: u32, cases: u64) -> RawRecord {
        RawRecord {
            country_name: name.to_string(),
            primary_code: code.to_string(),
            secondary_code: String::new(),
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            new_cases: cases,
            new_deaths: 0,
            population: 1_000_000,
        }
    }

    fn dataset() -> WorldDataset {
        WorldDataset::from_records(
            vec![
                record("UNITED STATES OF AMERICA", "USA", 2, 5),
                record("UNITED STATES OF AMERICA", "USA", 1, 3),
                record("ITALY", "ITA", 1, 1),
                record("ITALY", "ITA", 2, 1),
                record("SAN MARINO", "SMR", 2, 1),
            ],
            "USA",
        )
    }

    #[test]
    fn test_name_code_round_trip() {
        let ds = dataset();
        assert_eq!(ds.code_for_name("Italy").unwrap(), "ITA");
        assert_eq!(ds.code_for_name("United_States_of_America").unwrap(), "USA");
        assert_eq!(ds.name_for_code("SMR").unwrap(), "SAN MARINO");
    }

    #[test]
    fn test_unknown_keys_are_not_found() {
        let ds = dataset();
        assert_eq!(
            ds.name_for_code("XXX"),
            Err(LookupError::NotFound("XXX".to_string()))
        );
        assert!(ds.code_for_name("Atlantis").is_err());
        assert!(ds.series("XXX").is_err());
        assert!(ds.column("XXX", Metric::TotalCases).is_err());
    }

    #[test]
    fn test_column_is_aligned_with_dates() {
        let ds = dataset();
        let dates = ds.dates("USA").unwrap();
        let totals = ds.column("USA", Metric::TotalCases).unwrap();
        assert_eq!(dates.len(), totals.len());
        assert_eq!(totals, vec![3.0, 8.0]);
        assert!(dates[0] < dates[1]);
    }

    #[test]
    fn test_comparable_set_contains_reference() {
        let ds = dataset();
        assert!(ds.is_comparable("USA"));
        assert!(ds.is_comparable("ITA"));
        assert!(!ds.is_comparable("SMR"));
        assert_eq!(ds.comparable_countries().len(), 2);
    }

    #[test]
    fn test_ensure_comparable_names_the_offender() {
        let ds = dataset();
        assert!(ds.ensure_comparable(&["USA", "ITA"]).is_ok());
        assert_eq!(
            ds.ensure_comparable(&["USA", "SMR"]),
            Err(CompareError::NotComparable("SMR".to_string()))
        );
    }

    #[test]
    fn test_countries_sorted_by_name() {
        let ds = dataset();
        let names: Vec<&str> = ds.countries().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ITALY", "SAN MARINO", "UNITED STATES OF AMERICA"]);
        assert_eq!(ds.len(), 3);
        assert!(ds.contains("SMR"));
        assert_eq!(ds.reference_code(), "USA");
    }

    #[test]
    fn test_countries_lists_every_code_sharing_a_name() {
        let ds = WorldDataset::from_records(
            vec![
                record("KOSOVO", "XKX", 1, 1),
                record("KOSOVO", "XK", 1, 1),
                record("ITALY", "ITA", 1, 1),
            ],
            "ITA",
        );
        let pairs: Vec<(&str, &str)> = ds.countries().collect();
        assert_eq!(
            pairs,
            vec![("ITALY", "ITA"), ("KOSOVO", "XK"), ("KOSOVO", "XKX")]
        );
        assert_eq!(ds.code_for_name("Kosovo").unwrap(), "XKX");
    }

    #[test]
    fn test_negative_correction_keeps_reference_dates() {
        let text = "dateRep,day,month,year,cases,deaths,countriesAndTerritories,geoId,countryterritoryCode,popData2019\n\
            01/03/2020,1,3,2020,10,0,United_States_of_America,US,USA,329064917\n\
            02/03/2020,2,3,2020,-4,0,United_States_of_America,US,USA,329064917\n\
            03/03/2020,3,3,2020,10,0,United_States_of_America,US,USA,329064917\n\
            01/03/2020,1,3,2020,1,0,Italy,IT,ITA,60359546\n\
            02/03/2020,2,3,2020,1,0,Italy,IT,ITA,60359546\n\
            03/03/2020,3,3,2020,1,0,Italy,IT,ITA,60359546\n";
        let parsed = crate::parser::parse_feed(text).unwrap();
        let ds = WorldDataset::from_records(parsed.records, "USA");

        assert_eq!(ds.dates("USA").unwrap().len(), 3);
        assert_eq!(
            ds.column("USA", Metric::TotalCases).unwrap(),
            vec![10.0, 10.0, 20.0]
        );
        assert!(ds.is_comparable("ITA"));
    }
}
