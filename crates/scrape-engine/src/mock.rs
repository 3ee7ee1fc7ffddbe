//! Stub scraper for tests: canned outcome, optional delay, no network.

use async_trait::async_trait;
use scrape_types::{ProductRecord, ScrapeError, Scraper};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum StubBehavior {
    Records(Vec<ProductRecord>),
    Fail(String),
    Panic,
}

pub struct StubScraper {
    behavior: StubBehavior,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubScraper {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeeds with `n` generated records named after the query.
    pub fn with_products(n: usize) -> Self {
        Self::new(StubBehavior::Records(
            (0..n)
                .map(|i| ProductRecord {
                    name: format!("Product {}", i + 1),
                    price: format!("{}", 1000 + i),
                    rating: Some("4.0 out of 5 stars".to_string()),
                    link: Some(format!("https://example.test/dp/{}", i + 1)),
                    image: None,
                })
                .collect(),
        ))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(StubBehavior::Fail(message.into()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for StubScraper {
    async fn scrape(
        &self,
        query: &str,
        max_pages: u32,
    ) -> Result<Vec<ProductRecord>, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behavior {
            StubBehavior::Records(records) => Ok(records.clone()),
            StubBehavior::Fail(msg) => Err(ScrapeError::Other(format!(
                "{msg} (query={query}, pages={max_pages})"
            ))),
            StubBehavior::Panic => panic!("stub scraper panic"),
        }
    }
}
