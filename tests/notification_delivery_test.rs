mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use docket::application::ports::{NotificationError, NotificationOutbox};
use docket::application::services::{
    CreateJobRequest, DeliveryOutcome, NotificationDelivery, OutboxRelay, RetryPolicy,
};
use docket::domain::{Job, JobStatus, OutboxEntry};
use docket::infrastructure::notification::RecordingCallbackNotifier;
use docket::infrastructure::processing::MockProcessingClient;

use helpers::{CALLBACK_URL, TestHarness, principal, processing_result};

async fn completed_job(harness: &TestHarness) -> Job {
    let document_id = harness.add_document().await;
    let job = harness
        .service
        .create(
            CreateJobRequest {
                document_id,
                job_type: "ocr".to_string(),
                callback_url: CALLBACK_URL.to_string(),
            },
            principal(),
        )
        .await
        .unwrap();
    harness.driver.drive(job.id).await.unwrap();
    job
}

async fn only_entry(harness: &TestHarness, job: &Job) -> OutboxEntry {
    let mut entries = harness.store.list_for_job(job.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    entries.remove(0)
}

fn relay(harness: &TestHarness) -> OutboxRelay {
    OutboxRelay::new(
        harness.store.clone(),
        Arc::clone(&harness.delivery),
        Duration::from_secs(60),
        10,
    )
}

fn failing_notifier(failures: usize) -> RecordingCallbackNotifier {
    RecordingCallbackNotifier::failing_times(failures, NotificationError::Rejected { status: 503 })
}

#[tokio::test]
async fn given_failed_immediate_delivery_when_relaying_then_notification_is_delivered() {
    let (harness, _receiver) = TestHarness::build(
        MockProcessingClient::succeeding(processing_result()),
        failing_notifier(1),
        8,
    );
    let job = completed_job(&harness).await;

    let delivered = relay(&harness).relay_once().await.unwrap();

    assert_eq!(delivered, 1);
    let entry = only_entry(&harness, &job).await;
    assert!(entry.delivered_at.is_some());
    assert_eq!(entry.attempts, 2);
    assert!(entry.last_error.is_none());

    let attempts = harness.notifier.attempts().await;
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].notification, attempts[1].notification);
    assert_eq!(attempts[1].notification.status, JobStatus::Completed);
}

#[tokio::test]
async fn given_delivered_notification_when_relaying_then_nothing_is_resent() {
    let (harness, _receiver) =
        TestHarness::idle(MockProcessingClient::succeeding(processing_result()), 8);
    completed_job(&harness).await;

    let delivered = relay(&harness).relay_once().await.unwrap();

    assert_eq!(delivered, 0);
    assert_eq!(harness.notifier.attempts().await.len(), 1);
}

#[tokio::test]
async fn given_endpoint_that_never_acknowledges_when_rounds_run_out_then_entry_is_abandoned() {
    let (harness, _receiver) = TestHarness::build(
        MockProcessingClient::succeeding(processing_result()),
        failing_notifier(usize::MAX),
        8,
    );
    let job = completed_job(&harness).await;
    let relay = relay(&harness);

    relay.relay_once().await.unwrap();
    relay.relay_once().await.unwrap();

    let entry = only_entry(&harness, &job).await;
    assert_eq!(entry.attempts, 3);
    assert!(entry.abandoned_at.is_some());
    assert!(entry.delivered_at.is_none());

    assert_eq!(relay.relay_once().await.unwrap(), 0);
    assert_eq!(harness.notifier.attempts().await.len(), 3);
    assert_eq!(
        harness.service.get(job.id).await.unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn given_transient_failures_within_a_round_when_delivering_then_round_succeeds() {
    let (harness, _receiver) = TestHarness::build(
        MockProcessingClient::succeeding(processing_result()),
        failing_notifier(usize::MAX),
        8,
    );
    let job = completed_job(&harness).await;
    let entry = only_entry(&harness, &job).await;

    let notifier = Arc::new(failing_notifier(2));
    let delivery = NotificationDelivery::new(
        notifier.clone(),
        harness.store.clone(),
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2)),
        5,
    );

    let outcome = delivery.deliver(&entry).await;

    assert_eq!(outcome, DeliveryOutcome::Delivered);
    assert_eq!(notifier.attempts().await.len(), 3);
    let entry = only_entry(&harness, &job).await;
    assert!(entry.delivered_at.is_some());
}

#[tokio::test]
async fn given_client_error_from_endpoint_when_delivering_then_round_is_not_retried() {
    let (harness, _receiver) = TestHarness::build(
        MockProcessingClient::succeeding(processing_result()),
        failing_notifier(usize::MAX),
        8,
    );
    let job = completed_job(&harness).await;
    let entry = only_entry(&harness, &job).await;

    let notifier = Arc::new(RecordingCallbackNotifier::failing_times(
        1,
        NotificationError::Rejected { status: 404 },
    ));
    let delivery = NotificationDelivery::new(
        notifier.clone(),
        harness.store.clone(),
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2)),
        5,
    );

    let outcome = delivery.deliver(&entry).await;

    assert_eq!(outcome, DeliveryOutcome::Rescheduled);
    assert_eq!(notifier.attempts().await.len(), 1);
}

#[tokio::test]
async fn given_empty_outbox_when_relaying_then_nothing_is_delivered() {
    let (harness, _receiver) =
        TestHarness::idle(MockProcessingClient::succeeding(processing_result()), 8);

    assert_eq!(relay(&harness).relay_once().await.unwrap(), 0);
    assert!(harness.notifier.attempts().await.is_empty());
}

#[tokio::test]
async fn given_spawned_relay_when_immediate_delivery_failed_then_notification_is_delivered() {
    let (harness, _receiver) = TestHarness::build(
        MockProcessingClient::failing(helpers::timeout_error()),
        failing_notifier(1),
        8,
    );
    let job = completed_job(&harness).await;
    assert_eq!(
        harness.service.get(job.id).await.unwrap().status,
        JobStatus::Failed
    );

    let relay = OutboxRelay::new(
        harness.store.clone(),
        Arc::clone(&harness.delivery),
        Duration::from_millis(10),
        10,
    );
    let handle = tokio::spawn(relay.run());

    let mut delivered = false;
    for _ in 0..200 {
        if only_entry(&harness, &job).await.delivered_at.is_some() {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    assert!(delivered);
    let attempts = harness.notifier.attempts().await;
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1].notification.status, JobStatus::Failed);
}

#[tokio::test]
async fn given_zero_interval_when_running_relay_then_it_still_ticks() {
    let (harness, _receiver) = TestHarness::build(
        MockProcessingClient::succeeding(processing_result()),
        failing_notifier(1),
        8,
    );
    let job = completed_job(&harness).await;

    let relay = OutboxRelay::new(
        harness.store.clone(),
        Arc::clone(&harness.delivery),
        Duration::ZERO,
        10,
    );
    let handle = tokio::spawn(relay.run());

    let mut delivered = false;
    for _ in 0..200 {
        if only_entry(&harness, &job).await.delivered_at.is_some() {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    assert!(delivered);
}

#[tokio::test]
async fn given_claimed_entry_when_claiming_again_within_lease_then_it_is_skipped() {
    let (harness, _receiver) = TestHarness::build(
        MockProcessingClient::succeeding(processing_result()),
        failing_notifier(1),
        8,
    );
    let job = completed_job(&harness).await;
    let entry = only_entry(&harness, &job).await;

    let lease = Duration::from_secs(300);
    let first = harness.store.claim_due(Utc::now(), lease, 10).await.unwrap();
    let second = harness.store.claim_due(Utc::now(), lease, 10).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, entry.id);
    assert!(second.is_empty());
    assert_eq!(relay(&harness).relay_once().await.unwrap(), 0);
}
