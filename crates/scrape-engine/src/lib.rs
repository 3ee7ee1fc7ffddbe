//! Scraper implementations: live HTTP fetch plus the search results parser.

mod http;
#[cfg(feature = "test-util")]
pub mod mock;
pub mod parse;

pub use http::{HttpScraper, HttpScraperConfig};
pub use scrape_types::{ProductRecord, ScrapeError, Scraper};

#[cfg(feature = "test-util")]
pub use mock::{StubBehavior, StubScraper};
