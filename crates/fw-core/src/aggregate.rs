//! Streaming log aggregation.

use crate::counter::FrequencyCounter;
use crate::parse::{extract_timestamp, LineMatcher};
use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// How undecodable bytes in the input are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Substitute U+FFFD for malformed sequences; never fails. Firewall
    /// logs routinely contain stray binary from logged payloads.
    #[default]
    Lossy,
    /// Fail the pass on the first malformed sequence.
    Strict,
}

/// Options for one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Inclusive lower bound on line timestamps.
    pub start: Option<NaiveDateTime>,
    /// Inclusive upper bound on line timestamps.
    pub end: Option<NaiveDateTime>,
    pub decode: DecodeMode,
}

/// Per-field frequency counters produced by one pass.
#[derive(Debug, Clone, Default)]
pub struct LogCounts {
    pub prefixes: FrequencyCounter<String>,
    pub sources: FrequencyCounter<String>,
    pub destinations: FrequencyCounter<String>,
    pub protocols: FrequencyCounter<String>,
    pub ports: FrequencyCounter<String>,
}

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("cannot read log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed byte sequence at line {line}")]
    Decode { line: usize },
}

/// Streams the log at `path` and accumulates per-field counts.
///
/// Reads line by line in bounded memory; `.gz` paths are decompressed on
/// the fly. A line is counted only when the full grammar matches; every
/// mismatch is skipped silently (per-line logging would flood at scale).
/// When a date window is set, lines with an extractable timestamp outside
/// it are skipped before pattern matching; lines without a timestamp are
/// never filtered out. Zero matches is a valid, silent outcome.
pub fn aggregate(path: &Path, options: &AggregateOptions) -> Result<LogCounts, AggregateError> {
    info!(path = %path.display(), "processing log file");

    let mut reader = open_log(path)?;
    let matcher = LineMatcher::new();
    let filtering = options.start.is_some() || options.end.is_some();

    let mut counts = LogCounts::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    let mut matched = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line: Cow<'_, str> = match options.decode {
            DecodeMode::Lossy => String::from_utf8_lossy(&buf),
            DecodeMode::Strict => match std::str::from_utf8(&buf) {
                Ok(s) => Cow::Borrowed(s),
                Err(_) => return Err(AggregateError::Decode { line: line_no }),
            },
        };

        if !matcher.quick_check(&line) {
            continue;
        }

        if filtering {
            if let Some(ts) = extract_timestamp(&line) {
                if options.start.is_some_and(|start| ts < start) {
                    continue;
                }
                if options.end.is_some_and(|end| ts > end) {
                    continue;
                }
            }
        }

        let Some(event) = matcher.parse(&line) else {
            continue;
        };
        matched += 1;

        counts.prefixes.increment(event.prefix);
        counts.sources.increment(event.src);
        counts.destinations.increment(event.dst);
        counts.protocols.increment(event.proto);
        if let Some(port) = event.dport {
            counts.ports.increment(port.to_string());
        }
    }

    info!(
        lines = line_no,
        matched,
        sources = counts.sources.len(),
        destinations = counts.destinations.len(),
        ports = counts.ports.len(),
        "aggregation pass complete"
    );
    Ok(counts)
}

fn open_log(path: &Path) -> Result<Box<dyn BufRead>, std::io::Error> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        debug!(path = %path.display(), "opening as gzip stream");
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Local, NaiveDate};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str =
        "Jan 12 09:23:45 host kernel: FW-DROP: SRC=203.0.113.5 DST=10.0.0.1 PROTO=TCP DPT=22";

    fn write_log(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn canonical_line_populates_all_counters() {
        let file = write_log(&[SAMPLE]);
        let counts = aggregate(file.path(), &AggregateOptions::default()).unwrap();

        assert_eq!(counts.prefixes.get(&"DROP".to_string()), 1);
        assert_eq!(counts.sources.get(&"203.0.113.5".to_string()), 1);
        assert_eq!(counts.destinations.get(&"10.0.0.1".to_string()), 1);
        assert_eq!(counts.protocols.get(&"TCP".to_string()), 1);
        assert_eq!(counts.ports.get(&"22".to_string()), 1);
    }

    #[test]
    fn non_matching_lines_touch_no_counter() {
        let file = write_log(&[
            "Jan 12 09:00:00 host sshd[12]: accepted password",
            "FW-DROP: DST=10.0.0.1 PROTO=TCP",
            "SRC=1.1.1.1 PROTO=TCP missing prefix",
            "",
        ]);
        let counts = aggregate(file.path(), &AggregateOptions::default()).unwrap();
        assert!(counts.prefixes.is_empty());
        assert!(counts.sources.is_empty());
        assert!(counts.ports.is_empty());
    }

    #[test]
    fn line_without_port_skips_only_the_port_counter() {
        let file = write_log(&["FW-REJECT: SRC=5.5.5.5 DST=6.6.6.6 PROTO=ICMP"]);
        let counts = aggregate(file.path(), &AggregateOptions::default()).unwrap();
        assert_eq!(counts.protocols.get(&"ICMP".to_string()), 1);
        assert!(counts.ports.is_empty());
    }

    #[test]
    fn gzip_input_aggregates_identically() {
        let mut file = tempfile::Builder::new().suffix(".gz").tempfile().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        writeln!(encoder, "{SAMPLE}").unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let counts = aggregate(file.path(), &AggregateOptions::default()).unwrap();
        assert_eq!(counts.sources.get(&"203.0.113.5".to_string()), 1);
    }

    #[test]
    fn date_filter_excludes_lines_before_start() {
        // The syslog grammar pins the year to the current one, so build the
        // window relative to that.
        let year = Local::now().year();
        let start = NaiveDate::from_ymd_opt(year, 1, 13)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let file = write_log(&[SAMPLE]);
        let options = AggregateOptions {
            start: Some(start),
            ..Default::default()
        };
        let counts = aggregate(file.path(), &options).unwrap();
        assert!(counts.sources.is_empty(), "Jan 12 is before the window");
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let year = Local::now().year();
        let exact = NaiveDate::from_ymd_opt(year, 1, 12)
            .unwrap()
            .and_hms_opt(9, 23, 45)
            .unwrap();

        let file = write_log(&[SAMPLE]);
        let options = AggregateOptions {
            start: Some(exact),
            end: Some(exact),
            ..Default::default()
        };
        let counts = aggregate(file.path(), &options).unwrap();
        assert_eq!(counts.sources.len(), 1);
    }

    #[test]
    fn lines_without_timestamps_pass_any_date_filter() {
        let file = write_log(&["FW-DROP: SRC=9.9.9.9 DST=8.8.8.8 PROTO=TCP DPT=443"]);
        let options = AggregateOptions {
            start: Some(
                NaiveDate::from_ymd_opt(2030, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            ),
            ..Default::default()
        };
        let counts = aggregate(file.path(), &options).unwrap();
        assert_eq!(counts.sources.get(&"9.9.9.9".to_string()), 1);
    }

    #[test]
    fn lossy_decode_tolerates_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"FW-DROP: SRC=7.7.7.7 DST=8.8.8.8 PROTO=TCP \xff\xfe garbage\n")
            .unwrap();
        file.flush().unwrap();

        let counts = aggregate(file.path(), &AggregateOptions::default()).unwrap();
        assert_eq!(counts.sources.get(&"7.7.7.7".to_string()), 1);
    }

    #[test]
    fn strict_decode_surfaces_malformed_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"FW-DROP: SRC=7.7.7.7 DST=8.8.8.8 PROTO=TCP \xff\n")
            .unwrap();
        file.flush().unwrap();

        let options = AggregateOptions {
            decode: DecodeMode::Strict,
            ..Default::default()
        };
        assert!(matches!(
            aggregate(file.path(), &options),
            Err(AggregateError::Decode { line: 1 })
        ));
    }

    #[test]
    fn unreadable_path_is_fatal() {
        let result = aggregate(Path::new("/nonexistent/firewall.log"), &Default::default());
        assert!(matches!(result, Err(AggregateError::Io(_))));
    }

    #[test]
    fn zero_matches_is_a_valid_outcome() {
        let file = write_log(&["nothing relevant at all"]);
        let counts = aggregate(file.path(), &AggregateOptions::default()).unwrap();
        assert!(counts.prefixes.is_empty());
    }
}
