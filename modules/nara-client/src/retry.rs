//! Bounded retry for upstream GETs.
//!
//! Server errors (status >= 500) and transport failures are retried with
//! exponential backoff: `base * 2^(attempt-1)`, i.e. 1s, 2s, 4s with the
//! default one-second base. Anything below 500 is handed back untouched.

use std::time::Duration;

use tracing::warn;

use crate::error::{NaraError, Result};
use crate::transport::{RawResponse, Transport};

/// Bodies quoted in logs and errors are cut to this many characters.
pub const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Sleep before the attempt following `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

pub(crate) fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

/// Issue a GET, retrying server errors and transport failures until the
/// policy's attempt budget is spent.
pub async fn get_with_retry(
    transport: &dyn Transport,
    url: &str,
    query: &[(String, String)],
    policy: &RetryPolicy,
    label: &str,
) -> Result<RawResponse> {
    let mut last_status = None;
    let mut last_body = None;
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match transport.get(url, query).await {
            Ok(resp) if resp.is_server_error() => {
                let body = preview(&resp.body);
                warn!(
                    label,
                    status = resp.status,
                    attempt,
                    max_attempts = policy.max_attempts,
                    body = %body,
                    "Upstream server error"
                );
                last_status = Some(resp.status);
                last_body = Some(body);
            }
            Ok(resp) => return Ok(resp),
            Err(e) => {
                warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Upstream request failed"
                );
                last_error = Some(e.to_string());
                // A status from an earlier attempt no longer describes the outcome.
                last_status = None;
                last_body = None;
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
        }
    }

    Err(NaraError::RetriesExhausted {
        label: label.to_string(),
        attempts: policy.max_attempts,
        status: last_status,
        body: last_body,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use tokio::time::Instant;

    const URL: &str = "https://example.test/bids";

    #[test]
    fn delays_double_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_server_errors() {
        let transport = ScriptedTransport::new()
            .respond(503, "busy")
            .respond(503, "busy")
            .respond(200, "ok");
        let started = Instant::now();

        let resp = get_with_retry(&transport, URL, &[], &RetryPolicy::default(), "test")
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(transport.request_count(), 3);
        // 1s after the first failure, 2s after the second.
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(3), "waited {waited:?}");
        assert!(waited < Duration::from_secs(4), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let transport = ScriptedTransport::new().respond(404, "nope");

        let resp = get_with_retry(&transport, URL, &[], &RetryPolicy::default(), "test")
            .await
            .unwrap();

        assert_eq!(resp.status, 404);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_are_retried() {
        let transport = ScriptedTransport::new()
            .fail("connection reset")
            .respond(200, "ok");

        let resp = get_with_retry(&transport, URL, &[], &RetryPolicy::default(), "test")
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_carries_last_observation() {
        let long_body = "x".repeat(500);
        let transport = ScriptedTransport::new()
            .fail("timed out")
            .respond(502, &long_body)
            .respond(500, &long_body);

        let err = get_with_retry(&transport, URL, &[], &RetryPolicy::default(), "kw=BI")
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        match err {
            NaraError::RetriesExhausted {
                label,
                attempts,
                status,
                body,
                last_error,
            } => {
                assert_eq!(label, "kw=BI");
                assert_eq!(attempts, 3);
                assert_eq!(status, Some(500));
                assert_eq!(body.unwrap().len(), BODY_PREVIEW_CHARS);
                assert!(last_error.unwrap().contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn final_transport_failure_drops_earlier_status() {
        let transport = ScriptedTransport::new()
            .respond(500, "Unexpected errors")
            .respond(500, "Unexpected errors")
            .fail("timed out");

        let err = get_with_retry(&transport, URL, &[], &RetryPolicy::default(), "kw=BI")
            .await
            .unwrap_err();

        assert!(!err.is_unexpected_format());
        match err {
            NaraError::RetriesExhausted {
                status, body, last_error, ..
            } => {
                assert_eq!(status, None);
                assert_eq!(body, None);
                assert!(last_error.unwrap().contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
