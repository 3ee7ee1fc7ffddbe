//! Filesystem-backed CSV artifact store.

use async_trait::async_trait;
use scrape_types::{ArtifactError, ArtifactHandle, ArtifactStore, ProductRecord};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Fresh names tried before a save gives up; each collision draws a new suffix.
pub(crate) const MAX_NAME_ATTEMPTS: usize = 8;

pub(crate) fn names_exhausted() -> ArtifactError {
    ArtifactError::Io(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no unused artifact name after {} attempts", MAX_NAME_ATTEMPTS),
    ))
}

pub const CSV_HEADER: [&str; 5] = [
    "Product Name",
    "Price (INR)",
    "Rating",
    "Product Link",
    "Image",
];

const MISSING: &str = "N/A";

/// Encode records as CSV with [`CSV_HEADER`]. No records gives a header-only file.
pub fn encode_csv(records: &[ProductRecord]) -> Result<Vec<u8>, ArtifactError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| ArtifactError::Encode(e.to_string()))?;
    for r in records {
        writer
            .write_record([
                r.name.as_str(),
                r.price.as_str(),
                r.rating.as_deref().unwrap_or(MISSING),
                r.link.as_deref().unwrap_or(MISSING),
                r.image.as_deref().unwrap_or(MISSING),
            ])
            .map_err(|e| ArtifactError::Encode(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ArtifactError::Encode(e.to_string()))
}

/// `"dell laptop"` -> `"dell_laptop_<6 hex>.csv"`.
pub fn artifact_file_name(query: &str) -> String {
    let stem: String = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let stem = if stem.is_empty() { "results" } else { &stem };
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}.csv", stem, &suffix[..6])
}

/// Writes each artifact to its own file under a results directory.
pub struct CsvArtifactStore {
    dir: PathBuf,
}

impl CsvArtifactStore {
    /// Creates `dir` (and parents) if missing.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to the first name from `next_name` that does not exist yet.
    /// Existing files are never opened for writing.
    async fn write_new(
        &self,
        bytes: &[u8],
        mut next_name: impl FnMut() -> String,
    ) -> Result<ArtifactHandle, ArtifactError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let file_name = next_name();
            let path = self.dir.join(&file_name);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match opened {
                Ok(f) => f,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(file = %file_name, "artifact name taken, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            file.write_all(bytes).await?;
            file.flush().await?;
            return Ok(ArtifactHandle {
                location: path.to_string_lossy().into_owned(),
                file_name,
            });
        }
        Err(names_exhausted())
    }
}

#[async_trait]
impl ArtifactStore for CsvArtifactStore {
    async fn save(
        &self,
        query: &str,
        records: &[ProductRecord],
    ) -> Result<ArtifactHandle, ArtifactError> {
        let bytes = encode_csv(records)?;
        let handle = self.write_new(&bytes, || artifact_file_name(query)).await?;
        tracing::debug!(path = %handle.location, rows = records.len(), "artifact written");
        Ok(handle)
    }

    async fn load(&self, handle: &ArtifactHandle) -> Result<Vec<u8>, ArtifactError> {
        match tokio::fs::read(&handle.location).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ArtifactError::NotFound(handle.location.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
