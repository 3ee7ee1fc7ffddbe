//! Request and response DTOs for the HTTP surface.

use crate::{Job, JobId, JobStatus};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /start_scrape`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartScrapeRequest {
    /// `null` and a missing field both count as empty.
    #[serde(default)]
    pub search_query: Option<String>,
    /// Signed so that non-positive values reach validation instead of failing to decode.
    /// Numeric strings such as `"2"` are accepted; `null` means the default.
    #[serde(
        default = "default_max_pages",
        deserialize_with = "deserialize_max_pages"
    )]
    pub max_pages: i64,
}

impl StartScrapeRequest {
    pub fn query(&self) -> &str {
        self.search_query.as_deref().unwrap_or_default()
    }
}

fn default_max_pages() -> i64 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageCount {
    Number(i64),
    Text(String),
}

fn deserialize_max_pages<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Option::<PageCount>::deserialize(d)? {
        None => Ok(default_max_pages()),
        Some(PageCount::Number(n)) => Ok(n),
        Some(PageCount::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("max_pages must be an integer, got {:?}", s))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartScrapeResponse {
    pub job_id: JobId,
    pub status_url: String,
    pub download_url: String,
}

impl StartScrapeResponse {
    pub fn for_job(job_id: JobId) -> Self {
        Self {
            job_id,
            status_url: format!("/status/{}", job_id),
            download_url: format!("/download/{}", job_id),
        }
    }
}

/// Body of `GET /status/:job_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            status: job.status,
            message: job.message.clone(),
            file: job.artifact.as_ref().map(|a| a.file_name.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Form body of the synchronous `POST /scrape`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeForm {
    #[serde(default)]
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArtifactHandle;

    #[test]
    fn start_request_defaults_max_pages() {
        let req: StartScrapeRequest =
            serde_json::from_str(r#"{"search_query":"dell laptop"}"#).unwrap();
        assert_eq!(req.query(), "dell laptop");
        assert_eq!(req.max_pages, 1);

        let req: StartScrapeRequest = serde_json::from_str(r#"{"max_pages":-3}"#).unwrap();
        assert!(req.query().is_empty());
        assert_eq!(req.max_pages, -3);
    }

    #[test]
    fn start_request_tolerates_null_and_numeric_strings() {
        let req: StartScrapeRequest =
            serde_json::from_str(r#"{"search_query":null,"max_pages":null}"#).unwrap();
        assert!(req.query().is_empty());
        assert_eq!(req.max_pages, 1);

        let req: StartScrapeRequest =
            serde_json::from_str(r#"{"search_query":"hp","max_pages":" 2 "}"#).unwrap();
        assert_eq!(req.max_pages, 2);

        assert!(serde_json::from_str::<StartScrapeRequest>(r#"{"max_pages":"two"}"#).is_err());
    }

    #[test]
    fn status_response_omits_absent_fields() {
        let mut job = Job::pending(JobId::new(), "hp".into(), 1, "t0".into());
        let v = serde_json::to_value(JobStatusResponse::from(&job)).unwrap();
        assert_eq!(v, serde_json::json!({ "status": "pending" }));

        job.status = JobStatus::Done;
        job.message = Some("Scraped 3 products".into());
        job.artifact = Some(ArtifactHandle {
            location: "out/hp_abc123.csv".into(),
            file_name: "hp_abc123.csv".into(),
        });
        let v = serde_json::to_value(JobStatusResponse::from(&job)).unwrap();
        assert_eq!(v["status"], "done");
        assert_eq!(v["message"], "Scraped 3 products");
        assert_eq!(v["file"], "hp_abc123.csv");
    }

    #[test]
    fn start_response_links_point_at_job() {
        let id = JobId::new();
        let res = StartScrapeResponse::for_job(id);
        assert_eq!(res.status_url, format!("/status/{}", id));
        assert_eq!(res.download_url, format!("/download/{}", id));
    }
}
