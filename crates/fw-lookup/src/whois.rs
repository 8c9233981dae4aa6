//! Whois-based owner/country resolution.
//!
//! Whois output is free text with no stable schema across registries, so
//! extraction is a tolerant key:value scan over a fixed set of field names
//! rather than a grammar. Any failure (the command missing, a timeout,
//! empty output) degrades to `Unknown` for both fields.

use crate::resolution::Resolution;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Keys whose value names the owning organization, matched case-insensitively
/// against the text before the first colon. Line order wins.
const OWNER_KEYS: &[&str] = &["orgname", "org-name", "owner", "netname", "descr"];

/// Keys whose value names the country, as a two-letter code or a full name.
const COUNTRY_KEYS: &[&str] = &[
    "country",
    "country-code",
    "countrycode",
    "country code",
    "c",
    "registrant country",
    "orgcountry",
    "org-country",
];

/// Owner and country extracted from one whois response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoisFields {
    pub owner: Resolution,
    pub country: Resolution,
}

impl WhoisFields {
    pub fn unknown() -> Self {
        Self {
            owner: Resolution::Unknown,
            country: Resolution::Unknown,
        }
    }
}

/// Owner/country lookup seam; the production implementation shells out to
/// the system whois client.
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn resolve(&self, address: &str) -> WhoisFields;
}

/// Resolves owner/country by invoking the external `whois` command.
pub struct WhoisResolver {
    command: String,
    timeout: Duration,
}

impl WhoisResolver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            command: "whois".to_string(),
            timeout,
        }
    }

    /// Overrides the executable, for tests.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

#[async_trait]
impl WhoisLookup for WhoisResolver {
    async fn resolve(&self, address: &str) -> WhoisFields {
        let run = Command::new(&self.command)
            .arg(address)
            .kill_on_drop(true)
            .output();

        match timeout(self.timeout, run).await {
            Ok(Ok(output)) => {
                let text = String::from_utf8_lossy(&output.stdout);
                if text.trim().is_empty() {
                    WhoisFields::unknown()
                } else {
                    parse_fields(&text)
                }
            }
            Ok(Err(err)) => {
                debug!(address, error = %err, "whois command failed");
                WhoisFields::unknown()
            }
            Err(_) => {
                debug!(address, timeout = ?self.timeout, "whois timed out");
                WhoisFields::unknown()
            }
        }
    }
}

/// Scans whois text for the first owner-indicating and the first
/// country-indicating line; stops once both are found.
pub fn parse_fields(text: &str) -> WhoisFields {
    let mut owner = Resolution::Unknown;
    let mut country = Resolution::Unknown;

    for raw in text.lines() {
        let line = raw.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();

        if !owner.is_usable() && OWNER_KEYS.contains(&key.as_str()) {
            owner = Resolution::from_raw(Some(value));
        }
        if !country.is_usable() && COUNTRY_KEYS.contains(&key.as_str()) {
            country = match Resolution::from_raw(Some(value)) {
                Resolution::Value(v) => Resolution::Value(normalize_country(v)),
                other => other,
            };
        }
        if owner.is_usable() && country.is_usable() {
            break;
        }
    }

    WhoisFields { owner, country }
}

/// Short values are codes ("tr", "us") and are upper-cased; longer values
/// are full country names and pass through unchanged.
fn normalize_country(value: String) -> String {
    if value.len() <= 3 {
        value.to_uppercase()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
% RIPE whois response
inetnum:        94.23.0.0 - 94.23.255.255
netname:        OVH-NET
descr:          OVH SAS
country:        fr
admin-c:        OK217-RIPE
";

    #[test]
    fn extracts_first_owner_and_country() {
        let fields = parse_fields(SAMPLE);
        assert_eq!(fields.owner, Resolution::Value("OVH-NET".to_string()));
        assert_eq!(fields.country, Resolution::Value("FR".to_string()));
    }

    #[test]
    fn short_country_codes_are_uppercased() {
        let fields = parse_fields("country: tr\n");
        assert_eq!(fields.country, Resolution::Value("TR".to_string()));
    }

    #[test]
    fn full_country_names_pass_through() {
        let fields = parse_fields("Registrant Country: Turkey\n");
        assert_eq!(fields.country, Resolution::Value("Turkey".to_string()));
    }

    #[test]
    fn first_match_wins_per_field() {
        let text = "netname: FIRST-NET\nOrgName: Second Org\ncountry: DE\ncountry: US\n";
        let fields = parse_fields(text);
        assert_eq!(fields.owner, Resolution::Value("FIRST-NET".to_string()));
        assert_eq!(fields.country, Resolution::Value("DE".to_string()));
    }

    #[test]
    fn lines_without_colon_or_known_keys_are_skipped() {
        let text = "no separators here\nremarks: nothing useful\n";
        assert_eq!(parse_fields(text), WhoisFields::unknown());
    }

    #[test]
    fn sentinel_country_values_stay_unknown() {
        let fields = parse_fields("country: none\nnetname: X-NET\n");
        assert_eq!(fields.country, Resolution::Unknown);
        assert_eq!(fields.owner, Resolution::Value("X-NET".to_string()));
    }

    #[tokio::test]
    async fn missing_command_degrades_to_unknown() {
        let resolver = WhoisResolver::new(Duration::from_secs(1))
            .with_command("/nonexistent/whois-binary");
        assert_eq!(resolver.resolve("8.8.8.8").await, WhoisFields::unknown());
    }

    #[tokio::test]
    async fn output_without_fields_degrades_to_unknown() {
        // `echo` prints the address back, which contains no key:value lines.
        let resolver = WhoisResolver::new(Duration::from_secs(5)).with_command("echo");
        assert_eq!(resolver.resolve("8.8.8.8").await, WhoisFields::unknown());
    }
}
