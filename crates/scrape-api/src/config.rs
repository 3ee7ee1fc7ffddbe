//! Environment configuration for the API binary.

use scrape_engine::HttpScraperConfig;
use scrape_scheduler::SchedulerConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}={value}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen: SocketAddr,
    pub output_dir: PathBuf,
    pub scheduler: SchedulerConfig,
    pub scraper: HttpScraperConfig,
}

impl ApiConfig {
    /// Read `SCRAPE_*` variables; unset ones take their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let scraper_defaults = HttpScraperConfig::default();
        let scheduler_defaults = SchedulerConfig::default();

        let listen = parse_or::<SocketAddr>(&lookup, "SCRAPE_LISTEN", None)?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));
        let output_dir = lookup("SCRAPE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("scrape_outputs"));

        let max_concurrent: usize =
            parse_or(&lookup, "SCRAPE_MAX_CONCURRENT", Some(scheduler_defaults.max_concurrent))?
                .unwrap_or(scheduler_defaults.max_concurrent);
        if max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                key: "SCRAPE_MAX_CONCURRENT",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let registry_capacity: Option<usize> = parse_or(&lookup, "SCRAPE_REGISTRY_CAPACITY", None)?;
        let job_timeout = parse_or::<u64>(&lookup, "SCRAPE_JOB_TIMEOUT_SECS", None)?
            .map(Duration::from_secs);

        let base_url = lookup("SCRAPE_BASE_URL").unwrap_or(scraper_defaults.base_url);
        let request_timeout = parse_or::<u64>(&lookup, "SCRAPE_TIMEOUT_SECS", None)?
            .map(Duration::from_secs)
            .unwrap_or(scraper_defaults.request_timeout);
        let page_delay = parse_or::<u64>(&lookup, "SCRAPE_PAGE_DELAY_MS", None)?
            .map(Duration::from_millis)
            .unwrap_or(scraper_defaults.page_delay);

        Ok(Self {
            listen,
            output_dir,
            scheduler: SchedulerConfig {
                max_concurrent,
                registry_capacity,
                job_timeout,
            },
            scraper: HttpScraperConfig {
                base_url,
                request_timeout,
                page_delay,
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Option<T>,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = from_map(&[]).unwrap();
        assert_eq!(cfg.listen, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.output_dir, PathBuf::from("scrape_outputs"));
        assert_eq!(cfg.scheduler.max_concurrent, 4);
        assert_eq!(cfg.scheduler.registry_capacity, None);
        assert_eq!(cfg.scheduler.job_timeout, None);
        assert_eq!(cfg.scraper.base_url, "https://www.amazon.in");
        assert_eq!(cfg.scraper.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.scraper.page_delay, Duration::ZERO);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = from_map(&[
            ("SCRAPE_LISTEN", "127.0.0.1:8080"),
            ("SCRAPE_OUTPUT_DIR", "/tmp/out"),
            ("SCRAPE_MAX_CONCURRENT", "2"),
            ("SCRAPE_REGISTRY_CAPACITY", "500"),
            ("SCRAPE_JOB_TIMEOUT_SECS", "120"),
            ("SCRAPE_BASE_URL", "http://localhost:9000"),
            ("SCRAPE_TIMEOUT_SECS", "3"),
            ("SCRAPE_PAGE_DELAY_MS", "6000"),
        ])
        .unwrap();
        assert_eq!(cfg.listen.port(), 8080);
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.scheduler.max_concurrent, 2);
        assert_eq!(cfg.scheduler.registry_capacity, Some(500));
        assert_eq!(cfg.scheduler.job_timeout, Some(Duration::from_secs(120)));
        assert_eq!(cfg.scraper.base_url, "http://localhost:9000");
        assert_eq!(cfg.scraper.request_timeout, Duration::from_secs(3));
        assert_eq!(cfg.scraper.page_delay, Duration::from_millis(6000));
    }

    #[test]
    fn unparseable_values_are_errors() {
        let err = from_map(&[("SCRAPE_MAX_CONCURRENT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("SCRAPE_MAX_CONCURRENT"));
        assert!(from_map(&[("SCRAPE_MAX_CONCURRENT", "0")]).is_err());
        assert!(from_map(&[("SCRAPE_LISTEN", "nowhere")]).is_err());
    }
}
