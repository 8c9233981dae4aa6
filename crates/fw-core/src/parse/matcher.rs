//! Firewall log line grammar.

use once_cell::sync::Lazy;
use regex::Regex;

static PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"FW-([A-Z-]+):").unwrap());
static SRC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"SRC=(\S+)").unwrap());
static DST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"DST=(\S+)").unwrap());
static PROTO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"PROTO=(\S+)").unwrap());
static DPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"DPT=(\d+)").unwrap());

/// One parsed firewall event. Ephemeral: produced per line and folded
/// into the counters immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Category tag from the `FW-<TAG>:` token, e.g. `DROP`.
    pub prefix: String,
    pub src: String,
    pub dst: String,
    pub proto: String,
    pub dport: Option<u16>,
}

/// Parses firewall log lines. Stateless; the patterns are compiled once
/// for the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineMatcher;

impl LineMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Cheap rejection filter, run before any regex work.
    ///
    /// The dominant cost of a pass is scanning millions of lines that do
    /// not match at all; substring checks on the three required markers
    /// discard those without touching the pattern engine.
    pub fn quick_check(&self, line: &str) -> bool {
        line.contains("FW-") && line.contains("SRC=") && line.contains("PROTO=")
    }

    /// Extracts a [`LogEvent`] from `line`, or `None` if any required
    /// field is absent. Fields may appear in any order among surrounding
    /// tokens; a mismatch is a silent skip, never an error.
    pub fn parse(&self, line: &str) -> Option<LogEvent> {
        if !self.quick_check(line) {
            return None;
        }

        let prefix = capture(&PREFIX_RE, line)?;
        let src = capture(&SRC_RE, line)?;
        let dst = capture(&DST_RE, line)?;
        let proto = capture(&PROTO_RE, line)?;
        let dport = capture(&DPT_RE, line).and_then(|p| p.parse::<u16>().ok());

        Some(LogEvent {
            prefix,
            src,
            dst,
            proto,
            dport,
        })
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line).map(|c| c[1].to_string())
}
