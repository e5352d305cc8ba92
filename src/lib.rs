pub mod analyzers;
pub mod dataset;
pub mod fetch;
pub mod menu;
pub mod output;
pub mod parser;
pub mod render;

use anyhow::Result;
use tracing::{info, warn};

use crate::dataset::WorldDataset;

/// Parses feed text and aggregates it into a [`WorldDataset`] whose
/// comparable countries are measured against `reference`.
pub fn load_dataset(text: &str, reference: &str) -> Result<WorldDataset> {
    let parsed = parser::parse_feed(text)?;
    if !parsed.rejected.is_empty() {
        warn!(
            rejected = parsed.rejected.len(),
            accepted = parsed.records.len(),
            "Some feed rows were rejected"
        );
    }
    info!(rows = parsed.records.len(), "Organizing data");
    Ok(WorldDataset::from_records(parsed.records, reference))
}
