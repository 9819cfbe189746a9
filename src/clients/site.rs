use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::config::SiteConfig;

/// Fetches one sheet page as raw HTML. Parsing happens at the call site so
/// the parsed tree never has to cross an await point.
#[async_trait::async_trait]
pub trait SheetFetcher: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<String>;
}

/// Default fetcher for the catalog site.
#[derive(Clone)]
pub struct SiteClient {
    client: Client,
    base_url: Url,
}

impl SiteClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid site base URL: {base_url}"))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(site: &SiteConfig) -> Result<Self> {
        Self::new(
            &site.base_url,
            &site.user_agent,
            Duration::from_secs(u64::from(site.request_timeout_seconds)),
        )
    }

    /// Absolute sheet URL from either a full URL or a path relative to the
    /// configured site.
    pub fn sheet_url(&self, reference: &str) -> Result<Url> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            Url::parse(reference).with_context(|| format!("Invalid sheet URL: {reference}"))
        } else {
            self.base_url
                .join(reference)
                .with_context(|| format!("Invalid sheet path: {reference}"))
        }
    }
}

#[async_trait::async_trait]
impl SheetFetcher for SiteClient {
    async fn fetch_page(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?
            .error_for_status()
            .with_context(|| format!("Sheet page rejected: {url}"))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SiteClient {
        SiteClient::new(
            "https://catalog.example",
            "anisheet/test",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn sheet_url_joins_relative_paths() {
        let url = client().sheet_url("/animes/5934-exemple.html").unwrap();
        assert_eq!(url.as_str(), "https://catalog.example/animes/5934-exemple.html");
    }

    #[test]
    fn sheet_url_keeps_absolute_urls() {
        let url = client()
            .sheet_url("https://elsewhere.example/animes/1.html")
            .unwrap();
        assert_eq!(url.host_str(), Some("elsewhere.example"));
    }
}
