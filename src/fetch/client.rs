use async_trait::async_trait;

/// Seam between the feed download and the HTTP stack, so the transport can be
/// swapped (proxies, mirrors) without touching the loader.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response>;
}
