//! Bounded-concurrency enrichment dispatch.

use crate::cache::IpCache;
use crate::counter::FrequencyCounter;
use crate::enrich::Enricher;
use fw_lookup::{Resolution, UNKNOWN};
use futures::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// One source address with its frequency and enrichment metadata.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EnrichedSource {
    pub address: String,
    pub count: u64,
    pub country: String,
    pub owner: String,
}

/// Result of one scheduling pass.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOutcome {
    /// All observed sources with enrichment attached. Collected in
    /// completion order, which is nondeterministic under concurrency;
    /// consumers must re-sort by count before display.
    pub sources: Vec<EnrichedSource>,
    /// Total occurrences per resolved country.
    pub country_totals: FrequencyCounter<String>,
}

/// Dispatches enrichment for the hottest source addresses across a
/// bounded worker pool and back-fills the rest from the cache.
pub struct EnrichmentScheduler {
    enricher: Arc<Enricher>,
    cache: Arc<IpCache>,
    /// How many top addresses get live lookups; `0` means all of them.
    limit: usize,
    max_workers: usize,
}

impl EnrichmentScheduler {
    pub fn new(
        enricher: Arc<Enricher>,
        cache: Arc<IpCache>,
        limit: usize,
        max_workers: usize,
    ) -> Self {
        Self {
            enricher,
            cache,
            limit,
            max_workers,
        }
    }

    /// Enriches the top `limit` addresses by count (stable selection:
    /// ties keep encounter order), then attaches whatever the cache holds
    /// for every remaining address at zero network cost.
    pub async fn run(&self, sources: &FrequencyCounter<String>) -> ScheduleOutcome {
        let hot = sources.top(self.limit);
        info!(
            total = sources.len(),
            enriching = hot.len(),
            workers = self.max_workers,
            "dispatching enrichment"
        );

        let hot_set: HashSet<String> = hot.iter().map(|(addr, _)| addr.clone()).collect();

        let mut enriched: Vec<EnrichedSource> = stream::iter(hot)
            .map(|(address, count)| {
                let enricher = Arc::clone(&self.enricher);
                async move {
                    let record = enricher.enrich(&address).await;
                    EnrichedSource {
                        address,
                        count,
                        country: record.country,
                        owner: record.owner,
                    }
                }
            })
            .buffer_unordered(self.max_workers.max(1))
            .collect()
            .await;

        // Cold addresses: cache only, never a lookup.
        for (address, count) in sources.iter() {
            if hot_set.contains(address) {
                continue;
            }
            let (country, owner) = match self.cache.get(address).await {
                Some(record) => (
                    Resolution::from_raw(Some(&record.country)).into_text(),
                    Resolution::from_raw(Some(&record.owner)).into_text(),
                ),
                None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
            };
            enriched.push(EnrichedSource {
                address: address.clone(),
                count,
                country,
                owner,
            });
        }

        let mut country_totals = FrequencyCounter::new();
        for source in &enriched {
            country_totals.add(source.country.clone(), source.count);
        }

        ScheduleOutcome {
            sources: enriched,
            country_totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheRecord;
    use fw_lookup::geo::mock::MockGeoProvider;
    use fw_lookup::{ProviderChain, RetryPolicy};
    use std::time::Duration;

    fn enricher_with(
        cache: Arc<IpCache>,
        provider: Arc<MockGeoProvider>,
    ) -> Arc<Enricher> {
        let mut chain = ProviderChain::new(RetryPolicy {
            attempts: 1,
            backoff_base: Duration::ZERO,
        });
        chain.push(provider);
        Arc::new(Enricher::new(cache, Some(chain), None, Duration::ZERO))
    }

    fn counts(pairs: &[(&str, u64)]) -> FrequencyCounter<String> {
        let mut counter = FrequencyCounter::new();
        for (addr, n) in pairs {
            counter.add(addr.to_string(), *n);
        }
        counter
    }

    #[tokio::test]
    async fn only_top_addresses_are_dispatched() {
        let provider = Arc::new(MockGeoProvider::returning("geo", Some("US")));
        let cache = Arc::new(IpCache::empty());
        let scheduler = EnrichmentScheduler::new(
            enricher_with(cache.clone(), provider.clone()),
            cache,
            2,
            4,
        );

        let sources = counts(&[("1.1.1.1", 10), ("2.2.2.2", 5), ("3.3.3.3", 1)]);
        let outcome = scheduler.run(&sources).await;

        assert_eq!(outcome.sources.len(), 3);
        assert_eq!(provider.calls(), 2, "cold addresses cost no lookups");

        let cold = outcome
            .sources
            .iter()
            .find(|s| s.address == "3.3.3.3")
            .unwrap();
        assert_eq!(cold.country, "Unknown");
        assert_eq!(cold.owner, "Unknown");
    }

    #[tokio::test]
    async fn cold_addresses_use_cached_records() {
        let provider = Arc::new(MockGeoProvider::returning("geo", Some("US")));
        let cache = Arc::new(IpCache::empty());
        cache
            .insert(
                "3.3.3.3".into(),
                CacheRecord {
                    country: "SE".into(),
                    owner: "Telia".into(),
                    ts: 1,
                },
            )
            .await;

        let scheduler = EnrichmentScheduler::new(
            enricher_with(cache.clone(), provider.clone()),
            cache,
            1,
            4,
        );
        let sources = counts(&[("1.1.1.1", 10), ("3.3.3.3", 2)]);
        let outcome = scheduler.run(&sources).await;

        let cold = outcome
            .sources
            .iter()
            .find(|s| s.address == "3.3.3.3")
            .unwrap();
        assert_eq!(cold.country, "SE");
        assert_eq!(cold.owner, "Telia");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn zero_limit_enriches_everything() {
        let provider = Arc::new(MockGeoProvider::returning("geo", Some("US")));
        let cache = Arc::new(IpCache::empty());
        let scheduler = EnrichmentScheduler::new(
            enricher_with(cache.clone(), provider.clone()),
            cache,
            0,
            4,
        );

        let sources = counts(&[("1.1.1.1", 3), ("2.2.2.2", 2), ("3.3.3.3", 1)]);
        scheduler.run(&sources).await;
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn country_totals_sum_source_counts() {
        let provider = Arc::new(MockGeoProvider::returning("geo", Some("US")));
        let cache = Arc::new(IpCache::empty());
        let scheduler = EnrichmentScheduler::new(
            enricher_with(cache.clone(), provider.clone()),
            cache,
            0,
            4,
        );

        let sources = counts(&[("1.1.1.1", 10), ("2.2.2.2", 5), ("192.168.0.7", 3)]);
        let outcome = scheduler.run(&sources).await;

        assert_eq!(outcome.country_totals.get(&"US".to_string()), 15);
        assert_eq!(outcome.country_totals.get(&"Local".to_string()), 3);
    }

    // Second pass over the same addresses with usable cached results must
    // be served entirely from cache.
    #[tokio::test]
    async fn second_run_is_idempotent_and_cache_only() {
        let provider = Arc::new(MockGeoProvider::returning("geo", Some("US")));

        // Seed the cache the way a prior complete run would have.
        let cache = Arc::new(IpCache::empty());
        cache
            .insert(
                "1.1.1.1".into(),
                CacheRecord {
                    country: "AU".into(),
                    owner: "Cloudflare".into(),
                    ts: 100,
                },
            )
            .await;
        cache
            .insert(
                "2.2.2.2".into(),
                CacheRecord {
                    country: "FR".into(),
                    owner: "Orange".into(),
                    ts: 100,
                },
            )
            .await;

        let scheduler = EnrichmentScheduler::new(
            enricher_with(cache.clone(), provider.clone()),
            cache,
            0,
            4,
        );
        let sources = counts(&[("1.1.1.1", 4), ("2.2.2.2", 2)]);

        let first = scheduler.run(&sources).await;
        let second = scheduler.run(&sources).await;

        assert_eq!(provider.calls(), 0, "both passes are pure cache hits");

        let sort = |mut v: Vec<EnrichedSource>| {
            v.sort_by(|a, b| a.address.cmp(&b.address));
            v
        };
        assert_eq!(sort(first.sources), sort(second.sources));
    }
}
