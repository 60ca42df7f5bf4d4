//! # Tuning Parameters
//!
//! Typed parses for the two namespace entries that feed back into the
//! maintainer's own behavior: the verbosity threshold and the poll interval.
//! Validation happens here, at the parse boundary; callers only ever see a
//! valid [`Verbosity`] or a positive [`Duration`], never a raw string.

use std::time::Duration;

use tracing::level_filters::LevelFilter;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A tuning value that failed validation. The previous in-memory value is
/// retained by the caller; the message carries the acceptable range so the
/// operator can correct the stored parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TuneError {
    #[error(
        "invalid verbosity '{raw}': expected one of 0 (unset), 10 (debug), \
         20 (info), 30 (warning), 40 (error) or 50 (critical)"
    )]
    Verbosity { raw: String },

    #[error("invalid poll interval '{raw}': expected a positive integer number of seconds")]
    Interval { raw: String },
}

// ---------------------------------------------------------------------------
// Verbosity
// ---------------------------------------------------------------------------

/// Log verbosity threshold, ordered highest-to-lowest suppression.
///
/// The numeric codes follow the severity table the parameters store uses:
/// `0` unset, `10` debug, `20` info, `30` warning, `40` error, `50` critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Unset,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Verbosity {
    /// Parse a stored verbosity value.
    ///
    /// # Errors
    /// Returns [`TuneError::Verbosity`] for non-numeric input or a number
    /// outside the recognized level codes.
    pub fn from_value(raw: &str) -> Result<Self, TuneError> {
        match raw.trim().parse::<i64>() {
            Ok(0) => Ok(Verbosity::Unset),
            Ok(10) => Ok(Verbosity::Debug),
            Ok(20) => Ok(Verbosity::Info),
            Ok(30) => Ok(Verbosity::Warning),
            Ok(40) => Ok(Verbosity::Error),
            Ok(50) => Ok(Verbosity::Critical),
            _ => Err(TuneError::Verbosity { raw: raw.to_string() }),
        }
    }

    /// The numeric code for this level.
    pub fn code(self) -> u8 {
        match self {
            Verbosity::Unset => 0,
            Verbosity::Debug => 10,
            Verbosity::Info => 20,
            Verbosity::Warning => 30,
            Verbosity::Error => 40,
            Verbosity::Critical => 50,
        }
    }

    /// The tracing filter this threshold maps onto.
    ///
    /// `Unset` suppresses nothing. `Critical` maps to `ERROR`, the highest
    /// rung tracing has.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Unset => LevelFilter::TRACE,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Warning => LevelFilter::WARN,
            Verbosity::Error | Verbosity::Critical => LevelFilter::ERROR,
        }
    }

    /// The filter directive string for this threshold, as understood by
    /// `tracing_subscriber::EnvFilter`.
    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Unset => "trace",
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::Warning => "warn",
            Verbosity::Error | Verbosity::Critical => "error",
        }
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verbosity::Unset => "unset",
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::Warning => "warning",
            Verbosity::Error => "error",
            Verbosity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Poll interval
// ---------------------------------------------------------------------------

/// Parse a stored poll interval.
///
/// Zero and negative values are rejected; a zero-second sleep would turn the
/// maintainer into a busy loop against the store.
///
/// # Errors
/// Returns [`TuneError::Interval`] for non-numeric or non-positive input.
pub fn parse_poll_interval(raw: &str) -> Result<Duration, TuneError> {
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs as u64)),
        _ => Err(TuneError::Interval { raw: raw.to_string() }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", Verbosity::Unset)]
    #[case("10", Verbosity::Debug)]
    #[case("20", Verbosity::Info)]
    #[case("30", Verbosity::Warning)]
    #[case("40", Verbosity::Error)]
    #[case("50", Verbosity::Critical)]
    #[case(" 10 ", Verbosity::Debug)]
    fn test_verbosity_from_value_valid(#[case] raw: &str, #[case] expected: Verbosity) {
        assert_eq!(Verbosity::from_value(raw), Ok(expected));
    }

    #[rstest]
    #[case("high")]
    #[case("15")]
    #[case("-10")]
    #[case("")]
    #[case("debug")]
    fn test_verbosity_from_value_invalid(#[case] raw: &str) {
        let err = Verbosity::from_value(raw).unwrap_err();
        assert_eq!(err, TuneError::Verbosity { raw: raw.to_string() });
        // The message must guide the operator toward the accepted codes.
        let msg = err.to_string();
        assert!(msg.contains("10 (debug)"), "guidance missing from: {msg}");
        assert!(msg.contains("50 (critical)"), "guidance missing from: {msg}");
    }

    #[test]
    fn test_verbosity_codes_round_trip() {
        for v in [
            Verbosity::Unset,
            Verbosity::Debug,
            Verbosity::Info,
            Verbosity::Warning,
            Verbosity::Error,
            Verbosity::Critical,
        ] {
            assert_eq!(Verbosity::from_value(&v.code().to_string()), Ok(v));
        }
    }

    #[test]
    fn test_verbosity_ordering_tracks_suppression() {
        assert!(Verbosity::Critical > Verbosity::Error);
        assert!(Verbosity::Error > Verbosity::Warning);
        assert!(Verbosity::Warning > Verbosity::Info);
        assert!(Verbosity::Info > Verbosity::Debug);
        assert!(Verbosity::Debug > Verbosity::Unset);
    }

    #[test]
    fn test_verbosity_level_filter_mapping() {
        assert_eq!(Verbosity::Unset.level_filter(), LevelFilter::TRACE);
        assert_eq!(Verbosity::Debug.level_filter(), LevelFilter::DEBUG);
        assert_eq!(Verbosity::Info.level_filter(), LevelFilter::INFO);
        assert_eq!(Verbosity::Warning.level_filter(), LevelFilter::WARN);
        assert_eq!(Verbosity::Error.level_filter(), LevelFilter::ERROR);
        assert_eq!(Verbosity::Critical.level_filter(), LevelFilter::ERROR);
    }

    #[test]
    fn test_verbosity_display() {
        assert_eq!(Verbosity::Debug.to_string(), "debug");
        assert_eq!(Verbosity::Warning.to_string(), "warning");
    }

    #[rstest]
    #[case("5", 5)]
    #[case("60", 60)]
    #[case("  10 ", 10)]
    #[case("86400", 86_400)]
    fn test_parse_poll_interval_valid(#[case] raw: &str, #[case] secs: u64) {
        assert_eq!(parse_poll_interval(raw), Ok(Duration::from_secs(secs)));
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("soon")]
    #[case("")]
    #[case("1.5")]
    fn test_parse_poll_interval_invalid(#[case] raw: &str) {
        let err = parse_poll_interval(raw).unwrap_err();
        assert_eq!(err, TuneError::Interval { raw: raw.to_string() });
        assert!(err.to_string().contains("positive integer"));
    }
}
