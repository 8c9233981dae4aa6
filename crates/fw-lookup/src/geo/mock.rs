//! Scripted provider for tests.

use crate::error::{LookupError, LookupResult};
use crate::geo::GeoProvider;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A provider with a fixed script and a call counter, for asserting which
/// providers the chain and enricher actually consult.
pub struct MockGeoProvider {
    name: String,
    value: Option<String>,
    failures_before_success: usize,
    always_fail: bool,
    calls: AtomicUsize,
}

impl MockGeoProvider {
    /// Succeeds immediately with `value` (`None` = no usable field).
    pub fn returning(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            value: value.map(str::to_string),
            failures_before_success: 0,
            always_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails `failures` times with a transport error, then succeeds.
    pub fn failing_then(name: &str, failures: usize, value: Option<&str>) -> Self {
        Self {
            failures_before_success: failures,
            ..Self::returning(name, value)
        }
    }

    /// Fails every call.
    pub fn always_failing(name: &str) -> Self {
        Self {
            always_fail: true,
            ..Self::returning(name, None)
        }
    }

    /// Number of lookups issued against this provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoProvider for MockGeoProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup_country(&self, _address: &str) -> LookupResult<Option<String>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail || call < self.failures_before_success {
            return Err(LookupError::ConnectionFailed("scripted failure".into()));
        }
        Ok(self.value.clone())
    }
}
