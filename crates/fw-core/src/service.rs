//! Port to service-name resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::debug;

/// Well-known fallbacks consulted when the registry file has no entry.
/// Same data the platform resolver would return for the common ports.
const WELL_KNOWN: &[(u16, &str, &str)] = &[
    (20, "tcp", "ftp-data"),
    (21, "tcp", "ftp"),
    (22, "tcp", "ssh"),
    (23, "tcp", "telnet"),
    (25, "tcp", "smtp"),
    (53, "tcp", "domain"),
    (53, "udp", "domain"),
    (67, "udp", "bootps"),
    (68, "udp", "bootpc"),
    (80, "tcp", "http"),
    (110, "tcp", "pop3"),
    (123, "udp", "ntp"),
    (143, "tcp", "imap"),
    (161, "udp", "snmp"),
    (443, "tcp", "https"),
    (445, "tcp", "microsoft-ds"),
    (587, "tcp", "submission"),
    (993, "tcp", "imaps"),
    (995, "tcp", "pop3s"),
    (3306, "tcp", "mysql"),
    (3389, "tcp", "ms-wbt-server"),
    (5432, "tcp", "postgresql"),
    (8080, "tcp", "http-alt"),
];

/// Resolves `(port, protocol)` pairs to service names.
///
/// Read-mostly: the registry file is parsed once on first use, and every
/// resolved name, including `"Unknown"`, is memoized so repeated misses
/// never re-scan anything.
pub struct ServiceNameResolver {
    registry_path: PathBuf,
    table: OnceLock<HashMap<(u16, String), String>>,
    memo: Mutex<HashMap<(u16, String), String>>,
}

impl Default for ServiceNameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceNameResolver {
    pub fn new() -> Self {
        Self::with_registry_path("/etc/services")
    }

    /// Uses an alternate registry file, for tests.
    pub fn with_registry_path(path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: path.into(),
            table: OnceLock::new(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a service name; any failure yields `"Unknown"`.
    pub fn resolve(&self, port: u16, protocol: &str) -> String {
        let key = (port, protocol.to_ascii_lowercase());

        if let Some(name) = self.memo.lock().expect("memo lock poisoned").get(&key) {
            return name.clone();
        }

        let name = self
            .table
            .get_or_init(|| load_registry(&self.registry_path))
            .get(&key)
            .cloned()
            .or_else(|| {
                WELL_KNOWN
                    .iter()
                    .find(|(p, proto, _)| *p == key.0 && *proto == key.1)
                    .map(|(_, _, name)| name.to_string())
            })
            .unwrap_or_else(|| "Unknown".to_string());

        self.memo
            .lock()
            .expect("memo lock poisoned")
            .insert(key, name.clone());
        name
    }
}

/// Parses a services registry file (`name port/proto [aliases] # comment`).
/// Malformed and comment lines are skipped; an unreadable file yields an
/// empty table and the built-in fallbacks carry the load.
fn load_registry(path: &Path) -> HashMap<(u16, String), String> {
    let mut mapping = HashMap::new();
    let Ok(contents) = std::fs::read_to_string(path) else {
        debug!(path = %path.display(), "service registry unavailable");
        return mapping;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(name), Some(port_proto)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some((port, proto)) = port_proto.split_once('/') else {
            continue;
        };
        let Ok(port) = port.parse::<u16>() else {
            continue;
        };
        mapping
            .entry((port, proto.to_ascii_lowercase()))
            .or_insert_with(|| name.to_string());
    }

    debug!(path = %path.display(), entries = mapping.len(), "service registry loaded");
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn registry(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn resolves_from_the_registry_file() {
        let file = registry("# comment line\nssh 22/tcp\ndomain 53/udp\nmalformed-line\n");
        let resolver = ServiceNameResolver::with_registry_path(file.path());

        assert_eq!(resolver.resolve(22, "tcp"), "ssh");
        assert_eq!(resolver.resolve(53, "udp"), "domain");
    }

    #[test]
    fn protocol_comparison_is_case_insensitive() {
        let file = registry("ssh 22/tcp\n");
        let resolver = ServiceNameResolver::with_registry_path(file.path());
        assert_eq!(resolver.resolve(22, "TCP"), "ssh");
    }

    #[test]
    fn falls_back_to_well_known_table() {
        let file = registry("obscure 60000/tcp\n");
        let resolver = ServiceNameResolver::with_registry_path(file.path());
        assert_eq!(resolver.resolve(443, "tcp"), "https");
    }

    #[test]
    fn unknown_everywhere_yields_unknown() {
        let file = registry("");
        let resolver = ServiceNameResolver::with_registry_path(file.path());
        assert_eq!(resolver.resolve(60001, "tcp"), "Unknown");
        // Memoized misses stay stable on repeat lookups.
        assert_eq!(resolver.resolve(60001, "tcp"), "Unknown");
    }

    #[test]
    fn missing_registry_file_is_tolerated() {
        let resolver = ServiceNameResolver::with_registry_path("/nonexistent/services");
        assert_eq!(resolver.resolve(80, "tcp"), "http");
        assert_eq!(resolver.resolve(60002, "udp"), "Unknown");
    }

    #[test]
    fn first_registry_entry_wins_for_duplicate_keys() {
        let file = registry("www 80/tcp\nhttp 80/tcp\n");
        let resolver = ServiceNameResolver::with_registry_path(file.path());
        assert_eq!(resolver.resolve(80, "tcp"), "www");
    }
}
