//! Plain-text and JSON views of the dataset for the terminal.

use anyhow::Result;
use std::io::Write;

use crate::analyzers::types::CountrySeries;
use crate::dataset::WorldDataset;
use crate::render::thousands;

/// Writes every known country as `name: code`, sorted by name.
pub fn print_countries(dataset: &WorldDataset, out: &mut impl Write) -> Result<()> {
    writeln!(out, "\n\n\tAll Countries:\n")?;
    for (name, code) in dataset.countries() {
        writeln!(out, "\t{name}:\t{code}")?;
    }
    Ok(())
}

/// Writes the countries whose report dates match the reference country's.
pub fn print_comparable(dataset: &WorldDataset, out: &mut impl Write) -> Result<()> {
    writeln!(out, "\n\n\tComparable Countries:\n")?;
    if dataset.comparable_countries().is_empty() {
        writeln!(
            out,
            "\t(none: reference country {} is not in the feed)",
            dataset.reference_code()
        )?;
    }
    for code in dataset.comparable_countries() {
        let name = dataset.name_for_code(code)?;
        writeln!(out, "\t{name}:\t{code}")?;
    }
    Ok(())
}

/// Writes one country's aggregated rows as an aligned table.
pub fn print_series(series: &CountrySeries, out: &mut impl Write) -> Result<()> {
    writeln!(out, "\n\t{} ({})\n", series.name, series.code)?;
    writeln!(
        out,
        "\t{:<10} {:>9} {:>7} {:>12} {:>10} {:>8} {:>9} {:>12} {:>10}",
        "date", "cases", "deaths", "total cases", "total dead", "death %", "infect %", "cases/1M", "deaths/1M"
    )?;
    for r in &series.records {
        writeln!(
            out,
            "\t{:<10} {:>9} {:>7} {:>12} {:>10} {:>8.3} {:>9.4} {:>12.2} {:>10.2}",
            r.date.format("%Y-%m-%d"),
            thousands(r.new_cases as f64),
            thousands(r.new_deaths as f64),
            thousands(r.total_cases as f64),
            thousands(r.total_deaths as f64),
            r.death_rate,
            r.infection_rate,
            r.cases_per_million,
            r.deaths_per_million,
        )?;
    }
    Ok(())
}

/// Writes one country's aggregated series as pretty-printed JSON.
pub fn print_json(series: &CountrySeries, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(series)?)?;
    Ok(())
}
