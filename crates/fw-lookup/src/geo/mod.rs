//! Country resolution providers.
//!
//! Each provider is one free geolocation endpoint with its own URL
//! template and response shape. Providers return the raw field value (or
//! `None` when the response carries nothing usable); all sentinel logic
//! lives in the chain, at the normalization boundary.

mod chain;
mod ip_api_com;
mod ipapi_co;
mod ipinfo;
mod ipwhois_app;

pub mod mock;

pub use chain::{ProviderChain, RetryPolicy};
pub use ip_api_com::IpApiCom;
pub use ipapi_co::IpapiCo;
pub use ipinfo::Ipinfo;
pub use ipwhois_app::IpwhoisApp;

use crate::error::LookupResult;
use crate::http;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// One country-resolution data source.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Short provider name, used in logs.
    fn name(&self) -> &str;

    /// Looks up the country for `address`.
    ///
    /// Returns the raw country field from the response, `Ok(None)` when
    /// the response has no usable field, and `Err` only for transport
    /// failures (which the chain may retry).
    async fn lookup_country(&self, address: &str) -> LookupResult<Option<String>>;
}

/// Configuration for the standard provider chain.
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Auth token for the primary provider, if any.
    pub token: Option<String>,
    /// Retry behavior applied to each provider independently.
    pub retry: RetryPolicy,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            token: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Assembles the standard chain in its fixed priority order.
///
/// ipinfo is the primary source of truth; the rest are degraded fallbacks
/// consulted only when everything before them yielded nothing. The order
/// is part of the contract and must not be changed casually.
pub fn default_chain(config: &GeoConfig) -> LookupResult<ProviderChain> {
    let client = http::build_client(config.timeout)?;

    let mut chain = ProviderChain::new(config.retry.clone());
    chain.push(Arc::new(Ipinfo::new(client.clone(), config.token.clone())));
    chain.push(Arc::new(IpapiCo::new(client.clone())));
    chain.push(Arc::new(IpwhoisApp::new(client.clone())));
    chain.push(Arc::new(IpApiCom::new(client)));
    Ok(chain)
}
