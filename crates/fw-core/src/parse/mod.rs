//! Line and timestamp grammars for the firewall log format.

mod matcher;
mod timestamp;

pub use matcher::{LineMatcher, LogEvent};
pub use timestamp::extract_timestamp;
