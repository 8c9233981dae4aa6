//! fwreport
//!
//! Command-line pipeline: aggregate a firewall log into per-field
//! frequency counts, enrich the top source addresses with country/owner
//! metadata, and emit a console summary plus an optional JSON report.

use anyhow::{Context, Result};
use clap::Parser;
use fw_core::{
    aggregate, AggregateOptions, Enricher, EnrichmentScheduler, IpCache, RunMeta, RunReport,
    ServiceNameResolver,
};
use fw_lookup::{default_chain, GeoConfig, RetryPolicy, WhoisLookup, WhoisResolver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod config;
mod logging;
mod output;

use config::{FileConfig, RunConfig};

#[derive(Parser)]
#[command(name = "fwreport")]
#[command(version)]
#[command(about = "Firewall log analysis with GeoIP/whois enrichment", long_about = None)]
pub struct Cli {
    /// YAML configuration file; explicit flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Input log file (gzip-compressed when the path ends in .gz)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Write the structured JSON report to this path
    #[arg(long, value_name = "PATH")]
    pub output_json: Option<PathBuf>,

    /// IP enrichment cache file
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Cache TTL in seconds; 0 or less disables expiry
    #[arg(long)]
    pub cache_ttl: Option<i64>,

    /// Enrichment worker pool size
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Rows shown per report table; 0 shows everything
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Inclusive start date (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    pub start: Option<String>,

    /// Inclusive end date (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    pub end: Option<String>,

    /// Log verbosity (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// How many of the most frequent sources get live lookups; 0 = all
    #[arg(long)]
    pub enrich_limit: Option<usize>,

    /// Disable whois lookups
    #[arg(long)]
    pub no_whois: bool,

    /// Disable geo provider lookups
    #[arg(long)]
    pub no_geo: bool,

    /// Delay before each outbound request, in seconds
    #[arg(long, allow_negative_numbers = true)]
    pub request_delay: Option<f64>,

    /// Whois timeout in seconds
    #[arg(long)]
    pub whois_timeout: Option<u64>,

    /// Geo provider timeout in seconds
    #[arg(long)]
    pub provider_timeout: Option<u64>,

    /// Access token for the primary geo provider (env: FWREPORT_GEO_TOKEN)
    #[arg(long)]
    pub geo_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = RunConfig::resolve(&cli, file_config)?;

    logging::init(&config.log_level);

    let options = AggregateOptions {
        start: config.start,
        end: config.end,
        decode: Default::default(),
    };
    let counts = aggregate(&config.log_file, &options)
        .with_context(|| format!("failed to process {}", config.log_file.display()))?;

    let cache = Arc::new(IpCache::load(&config.cache_file, config.cache_ttl));

    let chain = if config.geo {
        Some(default_chain(&GeoConfig {
            timeout: config.provider_timeout,
            token: config.geo_token.clone(),
            retry: RetryPolicy::default(),
        })?)
    } else {
        None
    };
    let whois = config
        .whois
        .then(|| Arc::new(WhoisResolver::new(config.whois_timeout)) as Arc<dyn WhoisLookup>);

    let enricher = Arc::new(Enricher::new(
        Arc::clone(&cache),
        chain,
        whois,
        config.request_delay,
    ));
    let scheduler = EnrichmentScheduler::new(
        enricher,
        Arc::clone(&cache),
        config.enrich_limit,
        config.max_workers,
    );

    info!("enriching source addresses");
    let outcome = scheduler.run(&counts.sources).await;

    cache.save(&config.cache_file).await;

    let services = ServiceNameResolver::new();
    let meta = RunMeta::now(
        config.log_file.display().to_string(),
        config.start.map(|ts| ts.to_string()),
        config.end.map(|ts| ts.to_string()),
    );
    let report = RunReport::assemble(meta, &counts, outcome, &services, config.top_n);

    if let Some(path) = &config.output_json {
        output::write_json(path, &report)?;
        info!(path = %path.display(), "JSON report written");
    }

    output::print_summary(&report);
    Ok(())
}
