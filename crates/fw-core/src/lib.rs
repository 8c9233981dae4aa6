//! # fw-core
//!
//! Core pipeline for firewall log analysis: the line grammar and
//! timestamp parsing, the streaming aggregator and its frequency
//! counters, the persistent IP cache, the per-address enricher, the
//! bounded enrichment scheduler, and the report model handed to
//! renderers.

pub mod aggregate;
pub mod cache;
pub mod counter;
pub mod enrich;
pub mod parse;
pub mod report;
pub mod schedule;
pub mod service;

pub use aggregate::{aggregate, AggregateError, AggregateOptions, DecodeMode, LogCounts};
pub use cache::{CacheRecord, IpCache};
pub use counter::FrequencyCounter;
pub use enrich::{Enricher, EnrichmentRecord};
pub use parse::{extract_timestamp, LineMatcher, LogEvent};
pub use report::{CountRow, PortRow, RunMeta, RunReport};
pub use schedule::{EnrichedSource, EnrichmentScheduler, ScheduleOutcome};
pub use service::ServiceNameResolver;
