//! # fw-lookup
//!
//! External data sources for source-address enrichment: the geolocation
//! provider chain and the whois resolver, plus the normalization boundary
//! that turns raw third-party values into typed results.
//!
//! Everything in this crate is best-effort by contract: a provider that
//! times out, rate-limits, or returns garbage degrades to the `Unknown`
//! sentinel at the smallest possible scope and never fails a run.

pub mod error;
pub mod geo;
pub mod http;
pub mod resolution;
pub mod whois;

pub use error::{LookupError, LookupResult};
pub use geo::{default_chain, GeoConfig, GeoProvider, ProviderChain, RetryPolicy};
pub use resolution::{
    is_non_routable, is_unknown_text, Resolution, LOCAL_COUNTRY, LOCAL_OWNER, UNKNOWN,
};
pub use whois::{WhoisFields, WhoisLookup, WhoisResolver};
