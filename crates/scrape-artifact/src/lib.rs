//! Artifact stores: one CSV file per completed scrape.

mod csv_store;
#[cfg(feature = "test-util")]
mod memory;

pub use csv_store::{artifact_file_name, encode_csv, CsvArtifactStore, CSV_HEADER};
pub use scrape_types::{ArtifactError, ArtifactHandle, ArtifactStore};

#[cfg(feature = "test-util")]
pub use memory::InMemoryArtifactStore;
