use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use docket::application::ports::{NotificationError, ProcessingError, Retryable};
use docket::application::services::{RetryError, RetryPolicy};

fn fast(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
}

#[test]
fn given_policy_when_computing_backoff_then_it_doubles_up_to_cap() {
    let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(350));

    assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
    assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
    assert_eq!(policy.backoff_for(3), Duration::from_millis(350));
    assert_eq!(policy.backoff_for(40), Duration::from_millis(350));
}

#[test]
fn given_zero_attempts_when_creating_policy_then_one_attempt_is_kept() {
    assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).max_attempts(), 1);
    assert_eq!(RetryPolicy::single_attempt().max_attempts(), 1);
}

#[test]
fn given_processing_errors_when_classifying_then_only_transient_ones_are_retryable() {
    assert!(ProcessingError::Timeout("t".to_string()).is_retryable());
    assert!(ProcessingError::Transport("reset".to_string()).is_retryable());
    assert!(ProcessingError::Rejected { status: 502, body: String::new() }.is_retryable());
    assert!(ProcessingError::Rejected { status: 429, body: String::new() }.is_retryable());
    assert!(!ProcessingError::Rejected { status: 400, body: String::new() }.is_retryable());
    assert!(!ProcessingError::InvalidResponse("bad json".to_string()).is_retryable());
}

#[test]
fn given_notification_errors_when_classifying_then_only_transient_ones_are_retryable() {
    assert!(NotificationError::Timeout("t".to_string()).is_retryable());
    assert!(NotificationError::Rejected { status: 500 }.is_retryable());
    assert!(!NotificationError::Rejected { status: 410 }.is_retryable());
}

#[tokio::test]
async fn given_operation_succeeding_on_second_attempt_when_running_then_returns_value() {
    let calls = AtomicU32::new(0);

    let result: Result<u32, RetryError<ProcessingError>> = fast(3)
        .run("test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 2 {
                Err(ProcessingError::Transport("reset".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;

    assert_eq!(result.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn given_always_failing_operation_when_running_then_exhausted_after_max_attempts() {
    let calls = AtomicU32::new(0);

    let result: Result<(), RetryError<ProcessingError>> = fast(3)
        .run("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProcessingError::Timeout("no response within 10ms".to_string()))
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.is_exhausted());
    assert_eq!(
        err.to_string(),
        "gave up after 3 attempts: processing request timed out: no response within 10ms"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn given_single_attempt_policy_when_failing_then_error_is_reported_verbatim() {
    let result: Result<(), RetryError<ProcessingError>> = RetryPolicy::single_attempt()
        .run("test", || async {
            Err(ProcessingError::Timeout("no response within 10ms".to_string()))
        })
        .await;

    let err = result.unwrap_err();
    assert!(!err.is_exhausted());
    assert_eq!(
        err.to_string(),
        "processing request timed out: no response within 10ms"
    );
}

#[tokio::test]
async fn given_permanent_error_when_running_then_it_is_not_retried() {
    let calls = AtomicU32::new(0);

    let result: Result<(), RetryError<ProcessingError>> = fast(5)
        .run("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProcessingError::Rejected {
                status: 400,
                body: "bad type".to_string(),
            })
        })
        .await;

    let err = result.unwrap_err();
    assert!(!err.is_exhausted());
    assert_eq!(
        err.last_error(),
        &ProcessingError::Rejected {
            status: 400,
            body: "bad type".to_string()
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_exhausted_error_when_unwrapping_then_last_error_is_returned() {
    let result: Result<(), RetryError<ProcessingError>> = fast(2)
        .run("test", || async { Err(ProcessingError::Transport("reset".to_string())) })
        .await;

    assert_eq!(
        result.unwrap_err().into_last(),
        ProcessingError::Transport("reset".to_string())
    );
}
