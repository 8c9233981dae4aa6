//! Per-address enrichment.

use crate::cache::{CacheRecord, IpCache};
use chrono::Utc;
use fw_lookup::{
    is_non_routable, is_unknown_text, ProviderChain, Resolution, WhoisLookup, LOCAL_COUNTRY,
    LOCAL_OWNER,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Country/owner metadata attached to one source address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRecord {
    pub address: String,
    pub country: String,
    pub owner: String,
    /// Epoch seconds at which the record was produced or cached.
    pub ts: i64,
}

impl EnrichmentRecord {
    fn from_cache(address: &str, record: CacheRecord) -> Self {
        Self {
            address: address.to_string(),
            country: record.country,
            owner: record.owner,
            ts: record.ts,
        }
    }
}

/// Resolves one address to an [`EnrichmentRecord`], consulting the cache,
/// the geo provider chain, and whois in that order.
///
/// Geo and whois are optional collaborators: an absent chain means country
/// resolution is disabled and yields `Unknown` directly, likewise for
/// whois. The enricher is infallible (every failure mode below it degrades
/// to a sentinel) and safe to call concurrently for different addresses;
/// the cache serializes its own writes.
pub struct Enricher {
    cache: Arc<IpCache>,
    chain: Option<ProviderChain>,
    whois: Option<Arc<dyn WhoisLookup>>,
    request_delay: Duration,
}

impl Enricher {
    pub fn new(
        cache: Arc<IpCache>,
        chain: Option<ProviderChain>,
        whois: Option<Arc<dyn WhoisLookup>>,
        request_delay: Duration,
    ) -> Self {
        Self {
            cache,
            chain,
            whois,
            request_delay,
        }
    }

    /// The per-address decision procedure.
    ///
    /// 1. Non-routable addresses short-circuit to `Local`/`Private/Reserved`
    ///    with no lookup of any kind and are cached immediately.
    /// 2. A cached record with a usable country and a non-empty owner is
    ///    returned unchanged. A cached `Unknown` country stays eligible
    ///    for retry on a later run; so does a cached record with an empty
    ///    owner (see `reenriches_when_cached_owner_is_empty`).
    /// 3. Otherwise the chain resolves the country and whois resolves
    ///    owner/country; a usable whois country overrides the chain's.
    /// 4. The fresh record is written to the cache and returned.
    pub async fn enrich(&self, address: &str) -> EnrichmentRecord {
        // Values that do not parse as IPs skip classification and flow
        // through the normal lookup path unchanged.
        if let Ok(ip) = address.parse::<IpAddr>() {
            if is_non_routable(&ip) {
                let record = CacheRecord {
                    country: LOCAL_COUNTRY.to_string(),
                    owner: LOCAL_OWNER.to_string(),
                    ts: Utc::now().timestamp(),
                };
                self.cache.insert(address.to_string(), record.clone()).await;
                return EnrichmentRecord::from_cache(address, record);
            }
        }

        if let Some(cached) = self.cache.get(address).await {
            if !is_unknown_text(&cached.country) && !cached.owner.is_empty() {
                return EnrichmentRecord::from_cache(address, cached);
            }
            debug!(address, "cached record incomplete, re-enriching");
        }

        let mut country = match &self.chain {
            Some(chain) => {
                self.pace().await;
                chain.resolve_country(address).await
            }
            None => Resolution::Unknown,
        };

        let mut owner = Resolution::Unknown;
        if let Some(whois) = &self.whois {
            self.pace().await;
            let fields = whois.resolve(address).await;
            if fields.owner.is_usable() {
                owner = fields.owner;
            }
            // Whois is authoritative for the country when it has one.
            if fields.country.is_usable() {
                country = fields.country;
            }
        }

        let record = CacheRecord {
            country: country.into_text(),
            owner: owner.into_text(),
            ts: Utc::now().timestamp(),
        };
        self.cache.insert(address.to_string(), record.clone()).await;
        EnrichmentRecord::from_cache(address, record)
    }

    /// Fixed pre-request delay; with `n` workers the aggregate request
    /// rate approaches `n / delay`.
    async fn pace(&self) {
        if !self.request_delay.is_zero() {
            sleep(self.request_delay).await;
        }
    }
}
