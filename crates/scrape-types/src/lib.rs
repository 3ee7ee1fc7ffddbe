//! Core types and traits for the scrape job service.
//!
//! Job state, product records, HTTP DTOs, and the Scraper / ArtifactStore seams.

mod dto;
mod job;
mod traits;

pub use dto::*;
pub use job::*;
pub use traits::*;
