//! Retrieval of the raw case-distribution feed.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Where the ECDC publishes the daily case distribution as CSV.
pub const FEED_URL: &str = "https://opendata.ecdc.europa.eu/covid19/casedistribution/csv";

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads the feed from a local file path or fetches it over HTTP, then
/// decodes it as UTF-8.
#[tracing::instrument(fields(source = %source))]
pub async fn fetch_feed_text(source: &str) -> Result<String> {
    let bytes = if source.starts_with("http") {
        info!("Fetching feed over HTTP");
        let client = BasicClient::new();
        fetch_bytes(&client, source)
            .await
            .with_context(|| format!("failed to fetch {source}"))?
    } else {
        info!("Reading feed from disk");
        std::fs::read(source).with_context(|| format!("failed to read {source}"))?
    };
    debug!(bytes = bytes.len(), "Feed bytes received");

    String::from_utf8(bytes).context("feed is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}_{}", env::temp_dir().display(), std::process::id(), name)
    }

    #[tokio::test]
    async fn test_fetch_feed_text_reads_local_file() {
        let path = temp_path("covid_data_viewer_fetch_local.csv");
        fs::write(&path, "dateRep,day\n01/01/2020,1\n").unwrap();

        let text = fetch_feed_text(&path).await.unwrap();
        assert!(text.starts_with("dateRep"));

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_feed_text_missing_file_errors() {
        let path = temp_path("covid_data_viewer_does_not_exist.csv");
        let _ = fs::remove_file(&path);

        let err = fetch_feed_text(&path).await.unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[tokio::test]
    async fn test_fetch_feed_text_rejects_invalid_utf8() {
        let path = temp_path("covid_data_viewer_fetch_binary.csv");
        fs::write(&path, [0xFF, 0xFE, 0x00, 0x01]).unwrap();

        let err = fetch_feed_text(&path).await.unwrap_err();
        assert!(err.to_string().contains("UTF-8"));

        fs::remove_file(&path).unwrap();
    }
}
