//! Ordered provider fallback chain.

use crate::geo::GeoProvider;
use crate::resolution::Resolution;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Per-provider retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per provider, including the first.
    pub attempts: u32,
    /// Base backoff; the wait grows linearly with the attempt number.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_base: Duration::from_millis(700),
        }
    }
}

/// An ordered list of country providers tried until one answers.
///
/// Order is significant: the first provider is the primary source of
/// truth and later entries are degraded fallbacks. Providers are queried
/// strictly one at a time; fanning out in parallel would spend quota on
/// low-priority endpoints for every address the primary can answer.
pub struct ProviderChain {
    providers: Vec<Arc<dyn GeoProvider>>,
    retry: RetryPolicy,
}

impl ProviderChain {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            providers: Vec::new(),
            retry,
        }
    }

    /// Appends a provider at the end of the priority order.
    pub fn push(&mut self, provider: Arc<dyn GeoProvider>) {
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolves the country for `address`, best-effort.
    ///
    /// Short-circuits on the first usable value. Exhausting every provider
    /// yields [`Resolution::Unknown`]; this never errors.
    pub async fn resolve_country(&self, address: &str) -> Resolution {
        for provider in &self.providers {
            match self.attempt(provider.as_ref(), address).await {
                Resolution::Value(code) => {
                    debug!(provider = provider.name(), address, country = %code, "country resolved");
                    return Resolution::Value(code);
                }
                _ => continue,
            }
        }
        Resolution::Unknown
    }

    /// One provider with bounded retry and linear backoff.
    ///
    /// Transport errors are retried; a response without a usable field is
    /// final for this provider, since retrying would return the same body.
    async fn attempt(&self, provider: &dyn GeoProvider, address: &str) -> Resolution {
        let attempts = self.retry.attempts.max(1);
        for attempt in 0..attempts {
            if attempt > 0 {
                sleep(self.retry.backoff_base * attempt).await;
            }
            match provider.lookup_country(address).await {
                Ok(raw) => return Resolution::from_raw(raw.as_deref()),
                Err(err) => {
                    debug!(
                        provider = provider.name(),
                        address,
                        attempt,
                        error = %err,
                        "country lookup attempt failed"
                    );
                }
            }
        }
        Resolution::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::mock::MockGeoProvider;

    fn no_backoff() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            backoff_base: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn short_circuits_on_first_usable_result() {
        let a = Arc::new(MockGeoProvider::returning("a", Some("Unknown")));
        let b = Arc::new(MockGeoProvider::returning("b", Some("TR")));
        let c = Arc::new(MockGeoProvider::returning("c", Some("XX")));

        let mut chain = ProviderChain::new(no_backoff());
        chain.push(a.clone());
        chain.push(b.clone());
        chain.push(c.clone());

        let resolved = chain.resolve_country("5.5.5.5").await;
        assert_eq!(resolved, Resolution::Value("TR".to_string()));
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        assert_eq!(c.calls(), 0, "later providers must not be consulted");
    }

    #[tokio::test]
    async fn sentinel_value_falls_through_to_next_provider() {
        let a = Arc::new(MockGeoProvider::returning("a", Some("Unknown")));
        let b = Arc::new(MockGeoProvider::returning("b", Some("DE")));

        let mut chain = ProviderChain::new(no_backoff());
        chain.push(a);
        chain.push(b);

        assert_eq!(
            chain.resolve_country("5.5.5.5").await,
            Resolution::Value("DE".to_string())
        );
    }

    #[tokio::test]
    async fn transport_errors_are_retried_up_to_the_attempt_limit() {
        let flaky = Arc::new(MockGeoProvider::failing_then("flaky", 2, Some("FR")));
        let mut chain = ProviderChain::new(no_backoff());
        chain.push(flaky.clone());

        assert_eq!(
            chain.resolve_country("5.5.5.5").await,
            Resolution::Value("FR".to_string())
        );
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn missing_field_is_not_retried() {
        let empty = Arc::new(MockGeoProvider::returning("empty", None));
        let mut chain = ProviderChain::new(no_backoff());
        chain.push(empty.clone());

        assert_eq!(chain.resolve_country("5.5.5.5").await, Resolution::Unknown);
        assert_eq!(empty.calls(), 1);
    }

    #[tokio::test]
    async fn exhausted_chain_yields_unknown() {
        let a = Arc::new(MockGeoProvider::always_failing("a"));
        let b = Arc::new(MockGeoProvider::returning("b", None));

        let mut chain = ProviderChain::new(no_backoff());
        chain.push(a.clone());
        chain.push(b);

        assert_eq!(chain.resolve_country("5.5.5.5").await, Resolution::Unknown);
        assert_eq!(a.calls(), 3);
    }

    #[tokio::test]
    async fn empty_chain_yields_unknown() {
        let chain = ProviderChain::new(no_backoff());
        assert_eq!(chain.resolve_country("5.5.5.5").await, Resolution::Unknown);
    }
}
