//! Report model handed to renderers and serialized as the JSON export.

use crate::aggregate::LogCounts;
use crate::counter::FrequencyCounter;
use crate::schedule::ScheduleOutcome;
use crate::service::ServiceNameResolver;
use chrono::Local;
use serde::Serialize;

/// One key/count table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub key: String,
    pub count: u64,
}

/// One port row, with its resolved service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortRow {
    pub port: String,
    pub service: String,
    pub count: u64,
}

/// Run metadata recorded alongside the tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMeta {
    pub generated_at: String,
    pub log_file: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// The assembled report: every aggregate the pipeline produced, sorted
/// for display. Renderers (the console summary, the external HTML
/// dashboard) consume this; they never reach back into the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub total_events: u64,
    pub prefixes: Vec<CountRow>,
    pub protocols: Vec<CountRow>,
    pub ports: Vec<PortRow>,
    pub destinations: Vec<CountRow>,
    pub countries: Vec<CountRow>,
    pub sources: Vec<crate::schedule::EnrichedSource>,
}

impl RunReport {
    /// Builds the report from one run's aggregates.
    ///
    /// Tables are sorted descending by count (re-sorting here because the
    /// scheduler's output arrives in completion order) and capped at
    /// `top_n` rows when `top_n > 0`. Empty aggregates produce a valid,
    /// sparse report.
    pub fn assemble(
        meta: RunMeta,
        counts: &LogCounts,
        outcome: ScheduleOutcome,
        services: &ServiceNameResolver,
        top_n: usize,
    ) -> Self {
        let mut sources = outcome.sources;
        sources.sort_by(|a, b| b.count.cmp(&a.count).then(a.address.cmp(&b.address)));
        if top_n > 0 {
            sources.truncate(top_n);
        }

        let ports = counts
            .ports
            .top(top_n)
            .into_iter()
            .map(|(port, count)| {
                let service = port
                    .parse::<u16>()
                    .map(|p| services.resolve(p, "tcp"))
                    .unwrap_or_else(|_| "Unknown".to_string());
                PortRow {
                    port,
                    service,
                    count,
                }
            })
            .collect();

        Self {
            meta,
            total_events: counts.prefixes.total(),
            prefixes: rows(&counts.prefixes, top_n),
            protocols: rows(&counts.protocols, top_n),
            ports,
            destinations: rows(&counts.destinations, top_n),
            countries: rows(&outcome.country_totals, top_n),
            sources,
        }
    }
}

impl RunMeta {
    pub fn now(log_file: String, start: Option<String>, end: Option<String>) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            log_file,
            start,
            end,
        }
    }
}

fn rows(counter: &FrequencyCounter<String>, top_n: usize) -> Vec<CountRow> {
    counter
        .top(top_n)
        .into_iter()
        .map(|(key, count)| CountRow { key, count })
        .collect()
}
