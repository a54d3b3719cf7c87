//! # Quota error recognition
//!
//! The remote API reports rate/usage exhaustion only through its error text. This module is
//! the one place that knows that text, so a change in the vendor format touches nothing else.
//!
//! ## Contract (version [`QUOTA_CONTRACT_VERSION`])
//!
//! - A message is a **quota error** iff it contains `quota`, compared case-insensitively.
//! - The suggested delay is the first match of, in order:
//!   1. `retry_delay { seconds: N }`, the protobuf text form printed by Google client
//!      libraries (whitespace around `{`, `:` and `}` is optional; the closing brace is not
//!      required),
//!   2. `"retryDelay": "Ns"`, the JSON form found in REST error bodies. A non-zero fractional
//!      part rounds up to the next whole second (`"0.5s"` waits 1 s, `"7.5s"` waits 8 s).
//! - `N` is a non-negative integer number of seconds. Values that do not fit a `u64` are
//!   treated as "no delay"; larger delays than [`MAX_RETRY_DELAY`] are capped to it.
//!
//! ```rust
//! use pdf_chat::quota::detect;
//! use std::time::Duration;
//!
//! let q = detect("429 Quota exceeded. retry_delay { seconds: 7 }").unwrap();
//! assert_eq!(q.retry_after, Some(Duration::from_secs(7)));
//! assert!(detect("connection reset by peer").is_none());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

/// Bumped whenever the recognised formats change.
pub const QUOTA_CONTRACT_VERSION: u32 = 1;

/// Longest wait ever taken on a server's suggestion.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);

static PROTO_RETRY_DELAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"retry_delay\s*\{\s*seconds:\s*(\d+)").expect("valid regex"));

static JSON_RETRY_DELAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""retryDelay"\s*:\s*"(\d+)(?:\.(\d+))?s""#).expect("valid regex"));

/// A quota-exceeded failure, the sub-case of [`ApiError`](crate::error::ApiError) that may
/// be waited out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaExceeded {
    /// How long the API asked us to wait, when it said so.
    pub retry_after: Option<Duration>,
}

/// Returns `true` if `message` marks a quota error.
pub fn is_quota_error(message: &str) -> bool {
    message.to_lowercase().contains("quota")
}

/// Extracts the suggested retry delay from `message`, independent of the quota marker.
pub fn parse_retry_delay(message: &str) -> Option<Duration> {
    let caps = [&*PROTO_RETRY_DELAY, &*JSON_RETRY_DELAY]
        .into_iter()
        .find_map(|re| re.captures(message))?;
    let whole = caps[1].parse::<u64>().ok()?;
    let fraction = caps
        .get(2)
        .is_some_and(|m| m.as_str().bytes().any(|b| b != b'0'));
    let secs = if fraction { whole.saturating_add(1) } else { whole };
    Some(Duration::from_secs(secs).min(MAX_RETRY_DELAY))
}

/// Classifies `message`. `None` means it is not a quota error at all.
pub fn detect(message: &str) -> Option<QuotaExceeded> {
    if !is_quota_error(message) {
        return None;
    }
    Some(QuotaExceeded {
        retry_after: parse_retry_delay(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_marker_is_case_insensitive() {
        assert!(is_quota_error("You exceeded your current QUOTA"));
        assert!(is_quota_error("Quota exceeded for metric"));
        assert!(!is_quota_error("internal server error"));
    }

    #[test]
    fn parses_protobuf_text_delay() {
        let msg = "429 Resource has been exhausted (e.g. check quota). \
                   [violations { } , links { }, retry_delay {\n  seconds: 42\n}\n]";
        assert_eq!(parse_retry_delay(msg), Some(Duration::from_secs(42)));
    }

    #[test]
    fn parses_compact_protobuf_delay() {
        assert_eq!(
            parse_retry_delay("retry_delay{seconds:3}"),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn parses_json_delay() {
        let body = r#"{"error":{"code":429,"message":"You exceeded your current quota",
            "details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay": "19s"}]}}"#;
        let quota = detect(body).unwrap();
        assert_eq!(quota.retry_after, Some(Duration::from_secs(19)));
    }

    #[test]
    fn rounds_fractional_json_delay_up() {
        assert_eq!(
            parse_retry_delay(r#""retryDelay":"7.831s""#),
            Some(Duration::from_secs(8))
        );
        assert_eq!(
            parse_retry_delay(r#""retryDelay": "0.5s""#),
            Some(Duration::from_secs(1))
        );
        assert_eq!(
            parse_retry_delay(r#""retryDelay": "3.000s""#),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn huge_delay_is_capped() {
        let msg = "quota retry_delay { seconds: 18446744073709551615 }";
        assert_eq!(parse_retry_delay(msg), Some(MAX_RETRY_DELAY));
    }

    #[test]
    fn quota_without_delay() {
        let quota = detect("quota exceeded, try later").unwrap();
        assert_eq!(quota.retry_after, None);
    }

    #[test]
    fn delay_without_quota_marker_is_not_quota() {
        assert!(detect("retry_delay { seconds: 7 }").is_none());
    }

    #[test]
    fn overflowing_delay_is_ignored() {
        let msg = "quota retry_delay { seconds: 99999999999999999999999 }";
        assert_eq!(detect(msg).unwrap().retry_after, None);
    }
}
