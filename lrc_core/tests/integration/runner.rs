use lrc_core::config::TestRunOptions;
use lrc_core::error::LrcError;
use lrc_core::model::TestRunStatus;
use lrc_core::report::NoDelay;
use lrc_core::runner::Runner;

use crate::mock_server::{MockResponse, MockServer};
use crate::{login_responses, server_config, setup_logging};

const XML_FILE: &str = "lrc_report_123456789-7.xml";
const CSV_FILE: &str = "lrc_report_123456789-7.csv";
const PDF_FILE: &str = "lrc_report_123456789-7.pdf";
const TRANSACTIONS_FILE: &str = "lrc_report_trans_123456789-7.csv";

fn script(responses: Vec<MockResponse>) -> Vec<MockResponse> {
    let mut script = login_responses();
    script.push(MockResponse::json(r#"{"id":2,"name":"checkout"}"#));
    script.push(MockResponse::json(r#"{"runId":7}"#));
    script.extend(responses);
    script
}

fn runner(url: &str) -> Runner<NoDelay> {
    Runner::new(server_config(url), TestRunOptions::new(2, false)).with_sleeper(NoDelay)
}

#[tokio::test]
async fn failed_run_collects_reports_and_sla_narrative() {
    setup_logging();
    // Given
    let server = MockServer::start(script(vec![
        MockResponse::json(r#"{"status":"RUNNING","hasReport":false}"#),
        MockResponse::json(r#"{"status":"FAILED","detailedStatus":"SLA breached","hasReport":true}"#),
        // run transactions
        MockResponse::json(
            r#"[{"name":"Login","loadTestScriptId":5,"scriptName":"web","breakers":96,
                "slaStatus":"Failed","slaThreshold":3,"slaTrend":12.5,"passed":10,"failed":0,
                "avgTRT":2.5,"minTRT":1,"maxTRT":4.5,"percentileTRT":3.9,"stdDeviation":0.4}]"#,
        ),
        // run results
        MockResponse::json(r#"{"duration":"00:06:31","totalVusers":2,"percentileValue":90}"#),
        MockResponse::json(r#"{"reportId":42}"#),
        MockResponse::octet_stream(b"csv"),
        MockResponse::json(r#"{"reportId":43}"#),
        MockResponse::json(r#"{"message":"In progress"}"#),
        MockResponse::octet_stream(b"pdf"),
        // downloads in file name order
        MockResponse::octet_stream(b"csv report"),
        MockResponse::octet_stream(b"pdf report"),
        // SLA datasets
        MockResponse::json(r#"{"percentile":90}"#),
        MockResponse::json(
            r#"[{"id":1,"enabled":true,"scriptId":10,"testScriptId":5,"transactionName":"Login",
                "slaPercentileThreshold":3,"stopOnBreak":false,"scriptName":"web",
                "failedTrxRatio":10,"failedTrxEnabled":false}]"#,
        ),
        MockResponse::json(
            r#"[{"name":"Login","loadTestScriptId":5,"scriptName":"web","minTRT":1,"avgTRT":2.5,
                "maxTRT":4.5,"passed":10,"failed":0,"successRate":100,"avgTPS":0.3,
                "stdDeviation":0.4}]"#,
        ),
    ]))
    .await;

    // When
    let run = runner(&server.url())
        .run(std::future::pending())
        .await
        .unwrap();

    // Then
    assert_eq!(run.status, TestRunStatus::Failed);
    assert_eq!(run.load_test.name, "checkout");
    assert_eq!(run.reports.get(CSV_FILE), Some(&42));
    assert_eq!(run.reports.get(PDF_FILE), Some(&43));
    assert_eq!(run.rendered.get(CSV_FILE).map(Vec::as_slice), Some(b"csv report".as_slice()));
    assert_eq!(run.rendered.get(PDF_FILE).map(Vec::as_slice), Some(b"pdf report".as_slice()));
    assert_eq!(
        run.results.as_ref().and_then(|r| r.duration.as_deref()),
        Some("00:06:31")
    );

    let xml = String::from_utf8(run.rendered[XML_FILE].clone()).unwrap();
    assert!(xml.contains("<failure type=\"FAILED\""));
    assert!(xml.contains(
        "Percentile TRT (sec) SLA was breached by 1 transactions. \
         The worst transaction was \u{2018}Login\u{2019} with 96% exceeding 3.0 sec. "
    ));
    assert!(xml.contains("<property name=\"duration\" value=\"00:06:31\"/>"));

    let transactions = String::from_utf8(run.rendered[TRANSACTIONS_FILE].clone()).unwrap();
    assert_eq!(transactions.lines().count(), 2);
    assert!(transactions.lines().nth(1).unwrap().starts_with("web, Login, 96.0, Failed"));

    let requests = server.finish().await;
    assert_eq!(requests.len(), 18);
    assert_eq!(requests[8].json(), serde_json::json!({"reportType": "csv"}));
    assert_eq!(requests[10].json(), serde_json::json!({"reportType": "pdf"}));
    assert_eq!(requests[17].path, "/v1/test-runs/7/trt-summary");
}

#[tokio::test]
async fn passed_run_without_report_renders_summary_only() {
    setup_logging();
    // Given
    let server = MockServer::start(script(vec![MockResponse::json(
        r#"{"status":"PASSED","hasReport":false}"#,
    )]))
    .await;

    // When
    let run = runner(&server.url())
        .run(std::future::pending())
        .await
        .unwrap();

    // Then
    assert!(run.status.is_success());
    assert!(run.reports.is_empty());
    assert!(run.transactions.is_empty());
    assert!(run.results.is_none());
    let xml = String::from_utf8(run.rendered[XML_FILE].clone()).unwrap();
    assert!(xml.contains("failures=\"0\""));
    assert!(xml.contains("reportUrl"));
    let transactions = String::from_utf8(run.rendered[TRANSACTIONS_FILE].clone()).unwrap();
    assert_eq!(transactions.lines().count(), 1);
    assert_eq!(server.finish().await.len(), 5);
}

#[tokio::test]
async fn expired_session_is_renewed_once_while_waiting() {
    setup_logging();
    // Given
    let server = MockServer::start(script(vec![
        MockResponse::status(401, "expired"),
        MockResponse::json(r#"{"token":"renewed_token"}"#),
        MockResponse::json(r#"{"status":"ABORTED","hasReport":false}"#),
    ]))
    .await;

    // When
    let run = runner(&server.url())
        .run(std::future::pending())
        .await
        .unwrap();

    // Then
    assert!(run.is_aborted());
    let xml = String::from_utf8(run.rendered[XML_FILE].clone()).unwrap();
    assert!(!xml.contains("reportUrl"));

    let requests = server.finish().await;
    assert_eq!(requests[5].path, "/v1/auth");
    assert_eq!(requests[6].path, "/v1/projects/1/load-tests/2/runs/7/status");
    assert_eq!(
        requests[6].header("cookie"),
        Some("LWSSO_COOKIE_KEY=renewed_token")
    );
}

#[tokio::test]
async fn repeated_unauthorized_fails_the_run() {
    setup_logging();
    // Given
    let server = MockServer::start(script(vec![
        MockResponse::status(401, "expired"),
        MockResponse::json(r#"{"token":"renewed_token"}"#),
        MockResponse::status(401, "still expired"),
    ]))
    .await;

    // When
    let err = runner(&server.url())
        .run(std::future::pending())
        .await
        .expect_err("second 401 should fail");

    // Then
    match err {
        LrcError::Unauthorized { path, .. } => {
            assert_eq!(path, "v1/projects/1/load-tests/2/runs/7/status")
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn interrupt_aborts_the_run() {
    setup_logging();
    // Given
    let server = MockServer::start(script(vec![
        MockResponse::json("{}"),
        MockResponse::json("{}"),
    ]))
    .await;

    // When
    let err = runner(&server.url())
        .run(async {})
        .await
        .expect_err("interrupted run should fail");

    // Then
    match err {
        LrcError::Interrupted { run_id, .. } => assert_eq!(run_id, 7),
        other => panic!("expected Interrupted, got {other:?}"),
    }
    let requests = server.requests();
    let abort = requests
        .iter()
        .find(|request| request.method == "PUT")
        .expect("abort request");
    assert_eq!(abort.path, "/v1/test-runs/7/status");
    assert_eq!(abort.query_param("action"), Some("STOP"));
}

#[tokio::test]
async fn rejected_start_fails_before_polling() {
    setup_logging();
    // Given
    let mut responses = login_responses();
    responses.push(MockResponse::json(r#"{"name":"checkout"}"#));
    responses.push(MockResponse::status(403, "license exhausted"));
    let server = MockServer::start(responses).await;

    // When
    let err = runner(&server.url())
        .run(std::future::pending())
        .await
        .expect_err("start should fail");

    // Then
    assert!(matches!(err, LrcError::RunStart { test_id: 2, .. }));
    assert_eq!(server.finish().await.len(), 4);
}
