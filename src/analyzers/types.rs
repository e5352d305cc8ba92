//! Data types produced by the aggregation pipeline.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Projectable columns of a [`DailyRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    NewCases,
    NewDeaths,
    Population,
    TotalCases,
    TotalDeaths,
    DeathRate,
    InfectionRate,
    CasesPerMillion,
    DeathsPerMillion,
}

impl Metric {
    /// Metrics that can be charted, in menu order (`1`..`6`).
    pub const GRAPHABLE: [Metric; 6] = [
        Metric::TotalCases,
        Metric::TotalDeaths,
        Metric::DeathRate,
        Metric::InfectionRate,
        Metric::CasesPerMillion,
        Metric::DeathsPerMillion,
    ];

    /// Maps a graph-type selector (`"1"`..`"6"`) to its metric.
    pub fn from_selector(selector: &str) -> Option<Metric> {
        let index: usize = selector.trim().parse().ok()?;
        index
            .checked_sub(1)
            .and_then(|i| Self::GRAPHABLE.get(i))
            .copied()
    }

    /// Menu selector for graphable metrics.
    pub fn selector(self) -> Option<usize> {
        Self::GRAPHABLE
            .iter()
            .position(|m| *m == self)
            .map(|i| i + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::NewCases => "New Cases",
            Metric::NewDeaths => "New Deaths",
            Metric::Population => "Population",
            Metric::TotalCases => "Total Cases",
            Metric::TotalDeaths => "Total Deaths",
            Metric::DeathRate => "Percent of Cases Resulting in Death",
            Metric::InfectionRate => "Percent of Population Infected",
            Metric::CasesPerMillion => "Number of Cases Per 1 Million Population",
            Metric::DeathsPerMillion => "Number of Deaths Per 1 Million Population",
        }
    }

    /// Short identifier used in chart file names.
    pub fn slug(self) -> &'static str {
        match self {
            Metric::NewCases => "new_cases",
            Metric::NewDeaths => "new_deaths",
            Metric::Population => "population",
            Metric::TotalCases => "total_cases",
            Metric::TotalDeaths => "total_deaths",
            Metric::DeathRate => "death_rate",
            Metric::InfectionRate => "infection_rate",
            Metric::CasesPerMillion => "cases_per_million",
            Metric::DeathsPerMillion => "deaths_per_million",
        }
    }
}

/// One day of a country's aggregated series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub new_cases: u64,
    pub new_deaths: u64,
    pub population: u64,
    pub total_cases: u64,
    pub total_deaths: u64,
    pub death_rate: f64,
    pub infection_rate: f64,
    pub cases_per_million: f64,
    pub deaths_per_million: f64,
}

impl DailyRecord {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::NewCases => self.new_cases as f64,
            Metric::NewDeaths => self.new_deaths as f64,
            Metric::Population => self.population as f64,
            Metric::TotalCases => self.total_cases as f64,
            Metric::TotalDeaths => self.total_deaths as f64,
            Metric::DeathRate => self.death_rate,
            Metric::InfectionRate => self.infection_rate,
            Metric::CasesPerMillion => self.cases_per_million,
            Metric::DeathsPerMillion => self.deaths_per_million,
        }
    }
}

/// A country's records in ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySeries {
    pub code: String,
    pub name: String,
    pub records: Vec<DailyRecord>,
}

impl CountrySeries {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// Values of `metric`, aligned by index with [`CountrySeries::dates`].
    pub fn column(&self, metric: Metric) -> Vec<f64> {
        self.records.iter().map(|r| r.value(metric)).collect()
    }

    pub fn distinct_dates(&self) -> BTreeSet<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trip_for_graphable_metrics() {
        assert_eq!(Metric::from_selector("1"), Some(Metric::TotalCases));
        assert_eq!(Metric::from_selector("3"), Some(Metric::DeathRate));
        assert_eq!(Metric::from_selector(" 6 "), Some(Metric::DeathsPerMillion));
        assert_eq!(Metric::DeathsPerMillion.selector(), Some(6));
        assert_eq!(Metric::NewCases.selector(), None);
    }

    #[test]
    fn test_selector_rejects_out_of_range() {
        assert_eq!(Metric::from_selector("0"), None);
        assert_eq!(Metric::from_selector("7"), None);
        assert_eq!(Metric::from_selector("b"), None);
        assert_eq!(Metric::from_selector(""), None);
    }
}
