//! End-to-end posting scenarios against the scripted browser

mod common;

use autopost::session::MockEvent;
use autopost::workflow::{AttemptOutcome, EditorKind, GroupOutcome, GroupTarget, PostContent, SubmitStrategy};
use autopost::Error;
use common::*;
use std::path::PathBuf;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn content() -> PostContent {
    PostContent::new("Hello group")
}

#[tokio::test]
async fn test_two_groups_first_try() {
    let mut harness = Harness::new(|_| happy_page());

    let report = assert_ok!(harness.orchestrator.run(&groups(&["111", "222"]), &content(), &[]).await);

    assert_eq!(report.posted().len(), 2);
    for group in ["111", "222"] {
        let records = report.records_for(&GroupTarget::from(group));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, AttemptOutcome::Success);
        assert_eq!(records[0].backoff, None);
    }

    let evidence = harness.evidence();
    assert_eq!(evidence.len(), 2);
    assert!(evidence[0].starts_with("evidence-group-111-"));
    assert!(evidence[1].starts_with("evidence-group-222-"));

    assert_eq!(harness.launcher.launches(), 1);
    assert_eq!(harness.launcher.typed(), vec!["Hello group", "Hello group"]);
    assert_eq!(harness.launcher.events().last(), Some(&MockEvent::Closed(0)));
}

#[tokio::test]
async fn test_fourth_editor_matcher_used_without_retry() {
    let mut harness = Harness::new(|_| {
        group_page(composer(EditorKind::AriaLabel, Some(SubmitStrategy::AriaLabelButton)))
    });

    let report = assert_ok!(harness.orchestrator.run(&groups(&["111"]), &content(), &[]).await);

    let records = report.records_for(&GroupTarget::from("111"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, AttemptOutcome::Success);
    assert!(harness
        .launcher
        .clicked()
        .contains(&editor_name(EditorKind::AriaLabel)));
    assert_eq!(harness.launcher.launches(), 1);
}

#[tokio::test]
async fn test_submit_recovers_on_third_attempt() {
    let mut harness = Harness::new(|session| {
        let submit = if session >= 2 {
            Some(SubmitStrategy::AriaLabelButton)
        } else {
            None
        };
        group_page(composer(EditorKind::Rich, submit))
    });

    let report = assert_ok!(harness.orchestrator.run(&groups(&["111"]), &content(), &[]).await);

    let records = report.records_for(&GroupTarget::from("111"));
    let outcomes: Vec<AttemptOutcome> = records.iter().map(|record| record.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            AttemptOutcome::RetryableFailure,
            AttemptOutcome::RetryableFailure,
            AttemptOutcome::Success,
        ]
    );

    let backoffs: Vec<Option<Duration>> = records.iter().map(|record| record.backoff).collect();
    assert_eq!(
        backoffs,
        vec![None, Some(Duration::from_millis(3000)), Some(Duration::from_millis(5000))]
    );
    assert_eq!(
        harness.sleeper.backoffs(),
        vec![Duration::from_millis(3000), Duration::from_millis(5000)]
    );
    assert!(records[0]
        .reason
        .as_deref()
        .is_some_and(|reason| reason.contains("Submit button not found")));

    let evidence = harness.evidence();
    assert_eq!(evidence.len(), 3);
    assert_eq!(evidence.iter().filter(|name| name.starts_with("error-group-111-attempt")).count(), 2);
    assert_eq!(evidence.iter().filter(|name| name.starts_with("evidence-group-111-")).count(), 1);

    assert_eq!(harness.launcher.launches(), 3);
}

#[tokio::test]
async fn test_missing_upload_control_aborts_run() {
    let mut harness = Harness::new(|_| happy_page());

    let abort = assert_err!(harness.orchestrator.run(&groups(&["111", "222"]), &content(), &media()).await);

    assert_eq!(abort.group, Some(GroupTarget::from("111")));
    assert!(matches!(abort.source, Error::MediaUploadControlNotFound(_)));

    let records = abort.report.records_for(&GroupTarget::from("111"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, AttemptOutcome::FatalFailure);
    assert!(abort.report.records_for(&GroupTarget::from("222")).is_empty());

    let events = harness.launcher.events();
    assert!(!events
        .iter()
        .any(|event| matches!(event, MockEvent::Navigated(url) if url.ends_with("/groups/222"))));
    assert_eq!(events.last(), Some(&MockEvent::Closed(0)));
    assert_eq!(harness.launcher.launches(), 1);

    let evidence = harness.evidence();
    assert_eq!(evidence.len(), 1);
    assert!(evidence[0].starts_with("error-no-file-input-111-"));
}

#[tokio::test]
async fn test_media_batch_attached_before_submit() {
    let mut harness = Harness::new(|_| with_upload_control(happy_page()));

    let report = assert_ok!(harness.orchestrator.run(&groups(&["111"]), &content(), &media()).await);
    assert_eq!(report.groups[0].outcome, GroupOutcome::Posted);

    let events = harness.launcher.events();
    let upload = events
        .iter()
        .position(|event| {
            *event
                == MockEvent::FilesSet(
                    "file-input".to_string(),
                    vec![PathBuf::from("/media/01.jpg"), PathBuf::from("/media/02.mp4")],
                )
        })
        .expect("media uploaded");
    let submit = events
        .iter()
        .position(|event| *event == MockEvent::Clicked("submit".to_string()))
        .expect("submit clicked");
    assert!(upload < submit);

    assert!(harness.sleeper.slept().contains(&Duration::from_millis(8000)));
}
