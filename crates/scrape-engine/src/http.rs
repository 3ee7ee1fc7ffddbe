//! Live scraper: fetches result pages over HTTP and parses them.

use crate::parse::extract_products;
use async_trait::async_trait;
use scrape_types::{ProductRecord, ScrapeError, Scraper};
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
);

#[derive(Debug, Clone)]
pub struct HttpScraperConfig {
    /// Site root; searches go to `{base_url}/s`.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Pause between consecutive page fetches.
    pub page_delay: Duration,
}

impl Default for HttpScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.in".to_string(),
            request_timeout: Duration::from_secs(10),
            page_delay: Duration::ZERO,
        }
    }
}

/// Scraper that walks `max_pages` search result pages with reqwest.
pub struct HttpScraper {
    client: reqwest::Client,
    base_url: Url,
    page_delay: Duration,
}

impl HttpScraper {
    pub fn new(config: HttpScraperConfig) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ScrapeError::Other(format!("invalid base url {}: {e}", config.base_url)))?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ScrapeError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            page_delay: config.page_delay,
        })
    }

    fn search_url(&self) -> Result<Url, ScrapeError> {
        self.base_url
            .join("/s")
            .map_err(|e| ScrapeError::Other(e.to_string()))
    }

    async fn fetch_page(&self, query: &str, page: u32) -> Result<String, ScrapeError> {
        let url = self.search_url()?;
        let res = self
            .client
            .get(url.clone())
            .query(&[("k", query.to_string()), ("page", page.to_string())])
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = res.status();
        if !status.is_success() {
            return Err(ScrapeError::Http {
                status: status.as_u16(),
                url: res.url().to_string(),
            });
        }
        res.text().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ScrapeError {
    if e.is_timeout() {
        ScrapeError::Timeout(e.to_string())
    } else {
        ScrapeError::Network(e.to_string())
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn scrape(
        &self,
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<ProductRecord>, ScrapeError> {
        let mut results = Vec::new();
        for page in 1..=max_pages {
            if page > 1 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
            let body = self.fetch_page(query, page).await?;
            let products = extract_products(&body, &self.base_url)?;
            tracing::debug!(query, page, found = products.len(), "result page parsed");
            results.extend(products);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        let config = HttpScraperConfig {
            base_url: "not a url".to_string(),
            ..HttpScraperConfig::default()
        };
        assert!(matches!(HttpScraper::new(config), Err(ScrapeError::Other(_))));
    }

    #[test]
    fn search_url_is_rooted_at_base() {
        let config = HttpScraperConfig {
            base_url: "http://127.0.0.1:9/shop/".to_string(),
            ..HttpScraperConfig::default()
        };
        let scraper = HttpScraper::new(config).unwrap();
        assert_eq!(scraper.search_url().unwrap().as_str(), "http://127.0.0.1:9/s");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_scrape_error() {
        let config = HttpScraperConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(2),
            page_delay: Duration::ZERO,
        };
        let scraper = HttpScraper::new(config).unwrap();
        let err = scraper.scrape("laptop", 1).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::Network(_) | ScrapeError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn zero_pages_fetches_nothing() {
        let config = HttpScraperConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..HttpScraperConfig::default()
        };
        let scraper = HttpScraper::new(config).unwrap();
        assert!(scraper.scrape("laptop", 0).await.unwrap().is_empty());
    }
}
