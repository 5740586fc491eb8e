//! Retry decisions for the blocking GitHub client.
//!
//! Every wait is bounded by [`MAX_RETRY_DELAY`]: the scan is sequential, so a
//! long server hint would stall every remaining issue.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
const MAX_BACKOFF_DOUBLINGS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first.
    pub max_attempts: usize,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base_delay_ms.max(1),
        }
    }

    /// `attempt` is 1-based and counts the attempt that just failed.
    pub fn allows_retry_after(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    /// Wait before the next attempt. A server hint replaces the exponential
    /// backoff but never drops below the base delay or exceeds the cap.
    pub fn delay(&self, attempt: usize, server_hint: Option<Duration>) -> Duration {
        let base = Duration::from_millis(self.base_delay_ms);
        let wait = match server_hint {
            Some(hint) => hint.max(base),
            None => {
                let doublings = (attempt.saturating_sub(1) as u32).min(MAX_BACKOFF_DOUBLINGS);
                Duration::from_millis(self.base_delay_ms.saturating_mul(1_u64 << doublings))
            }
        };
        wait.min(MAX_RETRY_DELAY)
    }
}

/// GitHub signals throttling with 429, or with 403 once the primary rate
/// limit is exhausted.
pub fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && header_text(headers, "x-ratelimit-remaining") == Some("0"))
}

pub fn is_transient_status(status: StatusCode, headers: &HeaderMap) -> bool {
    status.is_server_error() || is_rate_limited(status, headers)
}

pub fn is_transient_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Server-requested wait: `Retry-After` seconds first, then the
/// `x-ratelimit-reset` epoch when the quota is exhausted.
pub fn server_retry_hint(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    if let Some(seconds) = header_text(headers, "retry-after").and_then(|raw| raw.parse::<u64>().ok())
    {
        return Some(Duration::from_secs(seconds));
    }
    if header_text(headers, "x-ratelimit-remaining") != Some("0") {
        return None;
    }
    let reset_at = header_text(headers, "x-ratelimit-reset")?
        .parse::<i64>()
        .ok()
        .and_then(|epoch| DateTime::<Utc>::from_timestamp(epoch, 0))?;
    (reset_at - now).to_std().ok()
}

/// First `max_chars` characters of an error body, marked when cut.
pub fn error_body_excerpt(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
}
