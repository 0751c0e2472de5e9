//! Classification of benchmark process output lines.
//!
//! The monitored benchmark process emits marker lines on stdout that signal
//! machine-parseable events: a discovery marker once per run announcing how
//! many benchmarks were found, and a progress marker after each completed
//! benchmark. Everything else on stdout is noise. Classification is
//! line-oriented and stateless; callers keep whatever cross-line state they
//! need (such as the discovered total).

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::protocol::WIRE_TIME_FORMAT;

/// Stdout prefix announcing how many benchmarks the run will execute.
pub const DISCOVERY_MARKER: &str = "// ***** Found ";

/// Stdout prefix emitted after each completed benchmark.
pub const PROGRESS_MARKER: &str = "// ** Remained ";

static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("integer regex is valid"));

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}").expect("timestamp regex is valid")
});

/// A classified output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// The run announced its total benchmark count. Fires once per run.
    RunStarted {
        /// Number of benchmarks the run will execute.
        total: u32,
    },
    /// The run completed a benchmark.
    Progress {
        /// Benchmarks still to run.
        remaining: u32,
        /// Estimated finish time, when the process has one yet.
        estimated_finish: Option<NaiveDateTime>,
    },
    /// A line from the error stream.
    Failure {
        /// The raw stderr line, possibly empty.
        message: String,
    },
    /// A stdout line matching no marker. Never forwarded.
    Ignored,
}

/// Classifies one line from the benchmark process's standard output.
///
/// `None` is treated as an empty string and still classified. Lines matching
/// neither marker are [`OutputEvent::Ignored`]; a marker line whose embedded
/// integer is missing or out of range is ignored as well.
#[must_use]
pub fn classify_stdout(line: Option<&str>) -> OutputEvent {
    let line = line.unwrap_or_default();

    if let Some(rest) = line.strip_prefix(DISCOVERY_MARKER) {
        return match first_integer(rest) {
            Some((total, _)) => OutputEvent::RunStarted { total },
            None => OutputEvent::Ignored,
        };
    }

    if let Some(rest) = line.strip_prefix(PROGRESS_MARKER) {
        return match first_integer(rest) {
            Some((remaining, after)) => OutputEvent::Progress {
                remaining,
                estimated_finish: embedded_timestamp(after),
            },
            None => OutputEvent::Ignored,
        };
    }

    OutputEvent::Ignored
}

/// Classifies one line from the benchmark process's standard error.
///
/// Every stderr line becomes a [`OutputEvent::Failure`], with no pattern
/// matching. This includes the empty line the process emits when its error
/// stream closes: downstream consumers may rely on receiving that terminal
/// empty-line signal, so it is forwarded rather than filtered out.
#[must_use]
pub fn classify_stderr(line: Option<&str>) -> OutputEvent {
    OutputEvent::Failure {
        message: line.unwrap_or_default().to_string(),
    }
}

/// Finds the first embedded integer in `text`, returning it together with
/// the remainder of the text after the match.
fn first_integer(text: &str) -> Option<(u32, &str)> {
    let m = INT_RE.find(text)?;
    let value = m.as_str().parse().ok()?;
    Some((value, &text[m.end()..]))
}

/// Finds an embedded `yyyy-MM-dd HH:mm` timestamp in `text`, if any.
fn embedded_timestamp(text: &str) -> Option<NaiveDateTime> {
    let m = TIMESTAMP_RE.find(text)?;
    NaiveDateTime::parse_from_str(m.as_str(), WIRE_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_discovery_line_extracts_total() {
        let event = classify_stdout(Some("// ***** Found 42 benchmarks"));
        assert_eq!(event, OutputEvent::RunStarted { total: 42 });
    }

    #[test]
    fn test_discovery_extracts_first_integer_regardless_of_surrounding_text() {
        let event = classify_stdout(Some("// ***** Found 7 benchmarks in 3 types"));
        assert_eq!(event, OutputEvent::RunStarted { total: 7 });
    }

    #[test]
    fn test_discovery_without_integer_is_ignored() {
        let event = classify_stdout(Some("// ***** Found nothing"));
        assert_eq!(event, OutputEvent::Ignored);
    }

    #[test]
    fn test_progress_line_with_eta() {
        let event = classify_stdout(Some("// ** Remained 10 2024-05-01 10:00"));
        let expected_eta = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("valid timestamp");
        assert_eq!(
            event,
            OutputEvent::Progress {
                remaining: 10,
                estimated_finish: Some(expected_eta),
            }
        );
    }

    #[test]
    fn test_progress_line_without_eta() {
        let event = classify_stdout(Some("// ** Remained 41 benchmarks"));
        assert_eq!(
            event,
            OutputEvent::Progress {
                remaining: 41,
                estimated_finish: None,
            }
        );
    }

    #[test]
    fn test_unmarked_stdout_is_ignored() {
        assert_eq!(classify_stdout(Some("MeanRunTime: 13ms")), OutputEvent::Ignored);
        assert_eq!(classify_stdout(Some("")), OutputEvent::Ignored);
        assert_eq!(classify_stdout(None), OutputEvent::Ignored);
    }

    #[test]
    fn test_marker_must_be_a_prefix() {
        let event = classify_stdout(Some("prefix // ***** Found 42 benchmarks"));
        assert_eq!(event, OutputEvent::Ignored);
    }

    #[test]
    fn test_stderr_is_always_a_failure() {
        assert_eq!(
            classify_stderr(Some("Unhandled exception")),
            OutputEvent::Failure {
                message: "Unhandled exception".to_string()
            }
        );
    }

    #[test]
    fn test_empty_stderr_line_is_still_a_failure() {
        assert_eq!(
            classify_stderr(None),
            OutputEvent::Failure {
                message: String::new()
            }
        );
        assert_eq!(
            classify_stderr(Some("")),
            OutputEvent::Failure {
                message: String::new()
            }
        );
    }

    #[test]
    fn test_malformed_timestamp_means_no_eta() {
        let event = classify_stdout(Some("// ** Remained 10 2024-13-01 10:00"));
        assert_eq!(
            event,
            OutputEvent::Progress {
                remaining: 10,
                estimated_finish: None,
            }
        );
    }
}
