//! CSV parser for the ECDC case-distribution feed.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

/// Format of the `dateRep` column.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Column offsets in the feed, counted from zero.
pub mod columns {
    pub const DATE: usize = 0;
    pub const NEW_CASES: usize = 4;
    pub const NEW_DEATHS: usize = 5;
    pub const COUNTRY_NAME: usize = 6;
    pub const SECONDARY_CODE: usize = 7;
    pub const PRIMARY_CODE: usize = 8;
    pub const POPULATION: usize = 9;

    /// Rows shorter than this cannot carry every column above.
    pub const MIN_FIELDS: usize = POPULATION + 1;
}

/// One row of the feed, as published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub country_name: String,
    pub primary_code: String,
    pub secondary_code: String,
    pub date: NaiveDate,
    pub new_cases: u64,
    pub new_deaths: u64,
    pub population: u64,
}

impl RawRecord {
    /// Primary code when present, otherwise the secondary one.
    pub fn country_code(&self) -> Option<&str> {
        resolve_code(&self.primary_code, &self.secondary_code)
    }
}

/// Why a feed row was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("country name is empty")]
    MissingName,
    #[error("both country code fields are empty")]
    MissingCode,
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    #[error("invalid {field} count {value:?}")]
    InvalidCount { field: &'static str, value: String },
}

/// A row that was skipped during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub error: RowError,
}

/// Result of parsing a whole feed: accepted records plus the rows that failed
/// validation.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub records: Vec<RawRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// Parses the feed text, skipping the header row.
///
/// Rows with data-quality problems are collected in [`ParsedFeed::rejected`]
/// and logged rather than aborting the load.
///
/// # Errors
///
/// Returns an error if the header is missing or too short, if the CSV itself
/// is malformed, or if no row at all could be accepted.
pub fn parse_feed(text: &str) -> Result<ParsedFeed> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let header_len = rdr.headers().context("failed to read feed header")?.len();
    if header_len < columns::MIN_FIELDS {
        bail!(
            "feed header has {} columns, expected at least {}",
            header_len,
            columns::MIN_FIELDS
        );
    }

    let mut parsed = ParsedFeed::default();
    for result in rdr.records() {
        let record = result.context("malformed CSV row")?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        match parse_record(&record) {
            Ok(raw) => parsed.records.push(raw),
            Err(error) => {
                warn!(line, error = %error, "Rejected feed row");
                parsed.rejected.push(RejectedRow { line, error });
            }
        }
    }

    debug!(
        accepted = parsed.records.len(),
        rejected = parsed.rejected.len(),
        "Feed parsed"
    );

    if parsed.records.is_empty() {
        bail!("feed contains no usable rows");
    }
    Ok(parsed)
}

fn parse_record(record: &csv::StringRecord) -> Result<RawRecord, RowError> {
    if record.len() < columns::MIN_FIELDS {
        return Err(RowError::TooFewFields {
            expected: columns::MIN_FIELDS,
            found: record.len(),
        });
    }
    let field = |i: usize| record.get(i).unwrap_or_default();

    let country_name = normalize_name(field(columns::COUNTRY_NAME));
    if country_name.is_empty() {
        return Err(RowError::MissingName);
    }

    let primary_code = field(columns::PRIMARY_CODE).to_string();
    let secondary_code = field(columns::SECONDARY_CODE).to_string();
    if resolve_code(&primary_code, &secondary_code).is_none() {
        return Err(RowError::MissingCode);
    }

    let date_str = field(columns::DATE);
    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
        .map_err(|_| RowError::InvalidDate(date_str.to_string()))?;

    Ok(RawRecord {
        country_name,
        primary_code,
        secondary_code,
        date,
        new_cases: parse_count("cases", field(columns::NEW_CASES))?,
        new_deaths: parse_count("deaths", field(columns::NEW_DEATHS))?,
        population: parse_count("population", field(columns::POPULATION))?,
    })
}

/// `United_States_of_America` -> `UNITED STATES OF AMERICA`
pub fn normalize_name(raw: &str) -> String {
    raw.replace('_', " ").trim().to_uppercase()
}

/// Primary code wins whenever it is non-empty; disagreement with the
/// secondary code is not checked.
pub fn resolve_code<'a>(primary: &'a str, secondary: &'a str) -> Option<&'a str> {
    match (primary.is_empty(), secondary.is_empty()) {
        (false, _) => Some(primary),
        (true, false) => Some(secondary),
        (true, true) => None,
    }
}

/// Empty fields count as zero. Negative values are published corrections;
/// they are clamped to zero so the row and its date are kept.
fn parse_count(field: &'static str, value: &str) -> Result<u64, RowError> {
    if value.is_empty() {
        return Ok(0);
    }
    if let Ok(count) = value.parse::<u64>() {
        return Ok(count);
    }
    match value.parse::<i64>() {
        Ok(count) if count < 0 => {
            warn!(field, count, "Negative count clamped to zero");
            Ok(0)
        }
        _ => Err(RowError::InvalidCount {
            field,
            value: value.to_string(),
        }),
    }
}
