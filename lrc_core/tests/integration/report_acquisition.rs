use std::time::Duration;

use lrc_core::config::ReportPollPolicy;
use lrc_core::error::LrcError;
use lrc_core::model::{LoadTest, LoadTestRun};
use lrc_core::report::{NoDelay, ReportAcquisition, ReportState, ReportType};

use crate::mock_server::MockResponse;
use crate::{PROJECT_ID, TENANT_ID, authenticated, setup_logging};

const CSV_FILE: &str = "lrc_report_123456789-7.csv";
const PDF_FILE: &str = "lrc_report_123456789-7.pdf";

fn finished_run() -> LoadTestRun {
    LoadTestRun::new(
        7,
        LoadTest {
            id: 2,
            project_id: PROJECT_ID,
            name: "checkout".to_string(),
        },
    )
}

fn policy(max_retry: u32) -> ReportPollPolicy {
    ReportPollPolicy {
        interval: Duration::from_secs(3600),
        csv_max_retry: max_retry,
        pdf_max_retry: max_retry,
    }
}

fn in_progress() -> MockResponse {
    MockResponse::json(r#"{"message":"In progress"}"#)
}

#[tokio::test]
async fn report_ready_on_first_check() {
    setup_logging();
    // Given
    let (server, session) = authenticated(vec![
        MockResponse::json(r#"{"reportId":42}"#),
        MockResponse::octet_stream(b"a,b,c"),
    ])
    .await;
    let acquisition = ReportAcquisition::new(&session, &NoDelay, policy(3), TENANT_ID);

    // When
    let (run, outcomes) = acquisition
        .acquire(finished_run(), &[ReportType::Csv], false)
        .await
        .unwrap();

    // Then
    assert_eq!(run.reports.get(CSV_FILE), Some(&42));
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].state,
        ReportState::Ready {
            report_id: 42,
            retries: 0
        }
    );

    let requests = server.finish().await;
    let request = &requests[2];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/v1/projects/1/test-runs/7/reports");
    assert_eq!(request.json(), serde_json::json!({"reportType": "csv"}));
    assert_eq!(requests[3].path, "/v1/test-runs/reports/42");
}

#[tokio::test]
async fn abandoned_report_does_not_stop_the_next_one() {
    setup_logging();
    // Given
    let (server, session) = authenticated(vec![
        MockResponse::json(r#"{"reportId":42}"#),
        in_progress(),
        in_progress(),
        in_progress(),
        MockResponse::json(r#"{"reportId":43}"#),
        MockResponse::octet_stream(b"%PDF"),
    ])
    .await;
    let acquisition = ReportAcquisition::new(&session, &NoDelay, policy(3), TENANT_ID);

    // When
    let (run, outcomes) = acquisition
        .acquire(finished_run(), &[ReportType::Csv, ReportType::Pdf], false)
        .await
        .unwrap();

    // Then
    assert_eq!(
        outcomes[0].state,
        ReportState::Abandoned {
            report_id: 42,
            retries: 3
        }
    );
    assert_eq!(outcomes[1].report_type, ReportType::Pdf);
    assert!(matches!(outcomes[1].state, ReportState::Ready { report_id: 43, .. }));
    assert!(run.reports.get(CSV_FILE).is_none());
    assert_eq!(run.reports.get(PDF_FILE), Some(&43));
    assert_eq!(server.finish().await.len(), 8);
}

#[tokio::test]
async fn server_error_while_polling_counts_as_pending() {
    setup_logging();
    // Given
    let (_server, session) = authenticated(vec![
        MockResponse::json(r#"{"reportId":42}"#),
        MockResponse::status(503, "busy"),
        MockResponse::octet_stream(b"a,b,c"),
    ])
    .await;
    let acquisition = ReportAcquisition::new(&session, &NoDelay, policy(3), TENANT_ID);

    // When
    let state = acquisition
        .acquire_one(7, ReportType::Csv)
        .await
        .unwrap();

    // Then
    assert_eq!(
        state,
        ReportState::Ready {
            report_id: 42,
            retries: 1
        }
    );
}

#[tokio::test]
async fn unexpected_content_type_fails_acquisition() {
    setup_logging();
    // Given
    let (_server, session) = authenticated(vec![
        MockResponse::json(r#"{"reportId":42}"#),
        MockResponse::status(200, "<html/>").with_content_type("text/html"),
    ])
    .await;
    let acquisition = ReportAcquisition::new(&session, &NoDelay, policy(3), TENANT_ID);

    // When
    let err = acquisition
        .acquire(finished_run(), &[ReportType::Csv], false)
        .await
        .expect_err("unknown content type should fail");

    // Then
    match err {
        LrcError::Report { message, .. } => assert!(message.contains("text/html")),
        other => panic!("expected Report, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_report_request_is_fatal() {
    setup_logging();
    // Given
    let (_server, session) = authenticated(vec![MockResponse::status(500, "no reports")]).await;
    let acquisition = ReportAcquisition::new(&session, &NoDelay, policy(3), TENANT_ID);

    // When
    let err = acquisition
        .acquire(finished_run(), &[ReportType::Csv, ReportType::Pdf], false)
        .await
        .expect_err("report request should fail");

    // Then
    match err {
        LrcError::Report { message, .. } => assert!(message.contains("no reports")),
        other => panic!("expected Report, got {other:?}"),
    }
}

#[tokio::test]
async fn skipped_pdf_is_never_requested() {
    setup_logging();
    // Given
    let (server, session) = authenticated(vec![
        MockResponse::json(r#"{"reportId":42}"#),
        MockResponse::octet_stream(b"a,b,c"),
    ])
    .await;
    let acquisition = ReportAcquisition::new(&session, &NoDelay, policy(3), TENANT_ID);

    // When
    let (run, outcomes) = acquisition
        .acquire(finished_run(), &[ReportType::Csv, ReportType::Pdf], true)
        .await
        .unwrap();

    // Then
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].report_type, ReportType::Csv);
    assert_eq!(run.reports.len(), 1);
    assert_eq!(server.finish().await.len(), 4);
}

#[tokio::test]
async fn nothing_permitted_sends_no_request() {
    setup_logging();
    // Given
    let (server, session) = authenticated(vec![]).await;
    let acquisition = ReportAcquisition::new(&session, &NoDelay, policy(3), TENANT_ID);

    // When
    let (run, outcomes) = acquisition
        .acquire(finished_run(), &[ReportType::Pdf, ReportType::Xml], true)
        .await
        .unwrap();

    // Then
    assert!(outcomes.is_empty());
    assert!(run.reports.is_empty());
    assert_eq!(server.finish().await.len(), 2);
}
