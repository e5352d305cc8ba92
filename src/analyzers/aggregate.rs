use crate::analyzers::types::{CountrySeries, DailyRecord};
use crate::analyzers::utility::safe_divide;
use crate::parser::RawRecord;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const PER_MILLION: f64 = 1_000_000.0;

/// Partitions records by resolved country code. Records without a code are
/// dropped; the parser never produces them.
pub fn group_by_country(records: Vec<RawRecord>) -> BTreeMap<String, Vec<RawRecord>> {
    let mut groups: BTreeMap<String, Vec<RawRecord>> = BTreeMap::new();
    for record in records {
        if let Some(code) = record.country_code().map(str::to_string) {
            groups.entry(code).or_default().push(record);
        }
    }
    groups
}

/// Builds a [`CountrySeries`] from one country's rows in any order.
///
/// Rows are sorted by date (stable, so same-day rows keep feed order) and
/// folded into running totals. The first row's totals are its own daily
/// counts.
pub fn build_series(code: &str, mut rows: Vec<RawRecord>) -> CountrySeries {
    rows.sort_by_key(|r| r.date);

    let name = rows
        .last()
        .map(|r| r.country_name.clone())
        .unwrap_or_default();

    let records = rows
        .iter()
        .scan((0u64, 0u64), |(cases, deaths), row| {
            *cases = accumulate(code, row, "cases", *cases, row.new_cases);
            *deaths = accumulate(code, row, "deaths", *deaths, row.new_deaths);
            Some(daily_record(row, *cases, *deaths))
        })
        .collect();

    CountrySeries {
        code: code.to_string(),
        name,
        records,
    }
}

/// Adds one day's count to a running total, saturating at `u64::MAX`.
fn accumulate(code: &str, row: &RawRecord, field: &'static str, total: u64, count: u64) -> u64 {
    total.checked_add(count).unwrap_or_else(|| {
        warn!(country = code, date = %row.date, field, "Running total overflowed, saturating");
        u64::MAX
    })
}

/// Computes the derived rates for one day given its cumulative totals.
pub fn daily_record(row: &RawRecord, total_cases: u64, total_deaths: u64) -> DailyRecord {
    let cases = total_cases as f64;
    let deaths = total_deaths as f64;
    let population = row.population as f64;

    DailyRecord {
        date: row.date,
        new_cases: row.new_cases,
        new_deaths: row.new_deaths,
        population: row.population,
        total_cases,
        total_deaths,
        death_rate: safe_divide(deaths, cases) * 100.0,
        infection_rate: safe_divide(cases, population) * 100.0,
        cases_per_million: safe_divide(cases, population / PER_MILLION),
        deaths_per_million: safe_divide(deaths, population / PER_MILLION),
    }
}

/// Groups and scans every record, one series per country code.
pub fn aggregate(records: Vec<RawRecord>) -> Vec<CountrySeries> {
    let series: Vec<CountrySeries> = group_by_country(records)
        .into_iter()
        .map(|(code, rows)| build_series(&code, rows))
        .collect();
    debug!(countries = series.len(), "Aggregated country series");
    series
}
