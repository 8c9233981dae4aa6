//! Configuration resolution for the fwreport CLI.
//!
//! Settings come from three layers: built-in defaults, an optional YAML
//! file, and explicit command-line flags, with later layers winning. The
//! result is one immutable [`RunConfig`] threaded into every component;
//! nothing reads process-wide mutable state after startup.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Cli;

const DEFAULT_LOG_FILE: &str = "/var/log/firewall.log";
const DEFAULT_CACHE_FILE: &str = "/var/log/firewall_ipcache.json";
const DEFAULT_CACHE_TTL_SECS: i64 = 7 * 24 * 3600;
const DEFAULT_MAX_WORKERS: usize = 10;
const DEFAULT_TOP_N: usize = 50;
const DEFAULT_ENRICH_LIMIT: usize = 200;
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Environment fallback for the primary geo provider's token.
const GEO_TOKEN_ENV: &str = "FWREPORT_GEO_TOKEN";

/// Optional YAML configuration file; every field may be omitted.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub log_file: Option<PathBuf>,
    pub output_json: Option<PathBuf>,
    pub cache_file: Option<PathBuf>,
    pub cache_ttl: Option<i64>,
    pub max_workers: Option<usize>,
    pub top_n: Option<usize>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub log_level: Option<String>,
    pub enrich_limit: Option<usize>,
    pub whois: Option<bool>,
    pub geo: Option<bool>,
    pub request_delay: Option<f64>,
    pub whois_timeout: Option<u64>,
    pub provider_timeout: Option<u64>,
    pub geo_token: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}

/// The fully resolved, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub log_file: PathBuf,
    pub output_json: Option<PathBuf>,
    pub cache_file: PathBuf,
    /// Seconds; zero or negative disables cache expiry.
    pub cache_ttl: i64,
    pub max_workers: usize,
    /// Rows shown per report table; zero shows everything.
    pub top_n: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub log_level: String,
    /// How many of the most frequent sources get live lookups; zero = all.
    pub enrich_limit: usize,
    pub whois: bool,
    pub geo: bool,
    pub request_delay: Duration,
    pub whois_timeout: Duration,
    pub provider_timeout: Duration,
    pub geo_token: Option<String>,
}

impl RunConfig {
    /// Merges CLI flags over the file layer over the defaults and
    /// validates the result. Invalid dates and an inverted range are
    /// fatal here, before any processing begins.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let start = parse_date(cli.start.as_deref().or(file.start.as_deref()))?;
        let end = parse_date(cli.end.as_deref().or(file.end.as_deref()))?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                bail!("end date {end} is before start date {start}");
            }
        }

        let request_delay = cli
            .request_delay
            .or(file.request_delay)
            .unwrap_or(0.0)
            .max(0.0);

        Ok(Self {
            log_file: cli
                .log_file
                .clone()
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            output_json: cli.output_json.clone().or(file.output_json),
            cache_file: cli
                .cache_file
                .clone()
                .or(file.cache_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE)),
            cache_ttl: cli.cache_ttl.or(file.cache_ttl).unwrap_or(DEFAULT_CACHE_TTL_SECS),
            max_workers: cli
                .max_workers
                .or(file.max_workers)
                .unwrap_or(DEFAULT_MAX_WORKERS)
                .max(1),
            top_n: cli.top_n.or(file.top_n).unwrap_or(DEFAULT_TOP_N),
            start,
            end,
            log_level: cli
                .log_level
                .clone()
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
            enrich_limit: cli
                .enrich_limit
                .or(file.enrich_limit)
                .unwrap_or(DEFAULT_ENRICH_LIMIT),
            whois: !cli.no_whois && file.whois.unwrap_or(true),
            geo: !cli.no_geo && file.geo.unwrap_or(true),
            request_delay: Duration::from_secs_f64(request_delay),
            whois_timeout: Duration::from_secs(
                cli.whois_timeout
                    .or(file.whois_timeout)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            provider_timeout: Duration::from_secs(
                cli.provider_timeout
                    .or(file.provider_timeout)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            geo_token: cli
                .geo_token
                .clone()
                .or(file.geo_token)
                .or_else(|| std::env::var(GEO_TOKEN_ENV).ok())
                .filter(|t| !t.is_empty()),
        })
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS`, and
/// `YYYY-MM-DD HH:MM:SS`; anything else is a configuration error.
fn parse_date(value: Option<&str>) -> Result<Option<NaiveDateTime>> {
    let Some(value) = value else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(ts));
        }
    }
    bail!("unsupported date format: {value}")
}
