//! Tests for call-level retries and backoff

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use encryption_migrator::orchestrator::{with_retries, BackoffConfig, MigrationError};
use encryption_migrator::{ControlServiceError, RetryPolicy};

mod backoff_tests {
    use super::*;

    #[test]
    fn test_delay_grows_with_attempts() {
        let backoff = BackoffConfig {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(600),
            multiplier: 2.0,
            jitter: 0.0,
        };
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_secs(2));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_secs(4));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_secs(16));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let backoff = BackoffConfig {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.0,
        };
        assert_eq!(backoff.delay_for_attempt(10), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let backoff = BackoffConfig {
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(600),
            multiplier: 1.0,
            jitter: 0.5,
        };
        for _ in 0..100 {
            let delay = backoff.delay_for_attempt(0).as_secs_f64();
            assert!((5.0..=15.0).contains(&delay), "delay out of bounds: {delay}");
        }
    }
}

mod retry_tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts }
    }

    fn fast_backoff() -> BackoffConfig {
        BackoffConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
            jitter: 0.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = with_retries("op", &policy(3), &fast_backoff(), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(ControlServiceError::Transient("hiccup".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_budget_exhaustion_surfaces_source() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = with_retries("op", &policy(3), &fast_backoff(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ControlServiceError::Transient("still down".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(MigrationError::ControlService { op, source }) => {
                assert_eq!(op, "op");
                assert!(source.is_transient());
            }
            other => panic!("expected exhausted transient error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = with_retries("op", &policy(5), &fast_backoff(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ControlServiceError::Request("denied".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(MigrationError::ControlService {
                source: ControlServiceError::Request(_),
                ..
            })
        ));
    }
}
