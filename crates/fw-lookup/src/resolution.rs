//! Normalization of raw third-party values and address classification.
//!
//! Provider responses, whois output, and cache files all carry free-text
//! values with several spellings of "we don't know". [`Resolution`] is the
//! single boundary where that text enters the system as a typed three-way
//! result; nothing downstream string-compares against sentinel spellings.

use std::net::IpAddr;

/// Canonical placeholder for "no usable value obtained".
pub const UNKNOWN: &str = "Unknown";

/// Country assigned to non-routable source addresses.
pub const LOCAL_COUNTRY: &str = "Local";

/// Owner assigned to non-routable source addresses.
pub const LOCAL_OWNER: &str = "Private/Reserved";

/// A normalized lookup value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A usable, trimmed, non-sentinel value.
    Value(String),
    /// Nothing usable was obtained.
    Unknown,
    /// The address is private/loopback/reserved/link-local; no lookup applies.
    Local,
}

impl Resolution {
    /// Normalizes a raw value as it crosses into the system.
    ///
    /// Empty, whitespace-only, `none`, `null`, and `unknown` (any casing)
    /// all collapse to [`Resolution::Unknown`]; anything else is trimmed
    /// and kept.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => Resolution::Unknown,
            Some(v) => {
                let trimmed = v.trim();
                if is_unknown_text(trimmed) {
                    Resolution::Unknown
                } else {
                    Resolution::Value(trimmed.to_string())
                }
            }
        }
    }

    /// True for [`Resolution::Value`].
    pub fn is_usable(&self) -> bool {
        matches!(self, Resolution::Value(_))
    }

    /// Renders the resolution as display/cache text, applying the sentinels.
    pub fn into_text(self) -> String {
        match self {
            Resolution::Value(v) => v,
            Resolution::Unknown => UNKNOWN.to_string(),
            Resolution::Local => LOCAL_COUNTRY.to_string(),
        }
    }
}

/// True when `text` is one of the sentinel spellings of "no value".
pub fn is_unknown_text(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "" | "none" | "null" | "unknown"
    )
}

/// Classifies addresses that must never be sent to external lookups.
///
/// Covers private, loopback, link-local, reserved, documentation,
/// unspecified, and broadcast ranges for IPv4, and loopback, unspecified,
/// unique-local, and link-local ranges for IPv6. Documentation nets
/// (e.g. 203.0.113.0/24) count as local: they are unrouted address space
/// and querying providers for them only burns quota.
pub fn is_non_routable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                // 240.0.0.0/4, reserved by IANA
                || v4.octets()[0] >= 240
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}
