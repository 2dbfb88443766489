use lrc_core::error::{LrcError, NetworkFailure};
use lrc_core::rest::{AuthArtifact, Session};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::mock_server::{MockResponse, MockServer};
use crate::{CLIENT_ID, TENANT_ID, authenticated, login_responses, server_config, setup_logging};

#[tokio::test]
async fn interactive_login_sets_session_cookie() {
    setup_logging();
    // Given
    let server = MockServer::start(login_responses()).await;

    // When
    let session = Session::authenticate(server_config(&server.url()))
        .await
        .unwrap();

    // Then
    assert_eq!(
        session.artifact(),
        &AuthArtifact::SessionCookie("fake_token".to_string())
    );
    let requests = server.finish().await;
    assert_eq!(requests.len(), 2);

    let login = &requests[0];
    assert_eq!(login.method, "POST");
    assert_eq!(login.path, "/v1/auth");
    assert_eq!(
        login.json(),
        serde_json::json!({"user": "jenkins", "password": "secret"})
    );
    assert!(login.header("cookie").is_none());

    let projects = &requests[1];
    assert_eq!(projects.method, "GET");
    assert_eq!(projects.path, "/v1/projects");
    assert_eq!(projects.header("cookie"), Some("LWSSO_COOKIE_KEY=fake_token"));
}

#[tokio::test]
async fn client_credential_login_uses_bearer_token() {
    setup_logging();
    // Given
    let server = MockServer::start(login_responses()).await;
    let mut config = server_config(&server.url());
    config.username = CLIENT_ID.to_string();

    // When
    let session = Session::authenticate(config).await.unwrap();

    // Then
    assert!(session.artifact().is_bearer());
    let requests = server.finish().await;
    assert_eq!(requests[0].path, "/v1/auth-client");
    assert_eq!(
        requests[0].json(),
        serde_json::json!({"client_id": CLIENT_ID, "client_secret": "secret"})
    );
    assert_eq!(requests[1].header("authorization"), Some("Bearer fake_token"));
    assert!(requests[1].header("cookie").is_none());
}

#[tokio::test]
async fn every_request_carries_common_headers_and_tenant() {
    setup_logging();
    // Given
    let server = MockServer::start(login_responses()).await;

    // When
    Session::authenticate(server_config(&server.url()))
        .await
        .unwrap();

    // Then
    for request in server.finish().await {
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("cache-control"), Some("no-cache"));
        assert_eq!(request.query_param("TENANTID"), Some(TENANT_ID));
    }
}

#[tokio::test]
async fn empty_tenant_is_not_sent() {
    setup_logging();
    // Given
    let server = MockServer::start(login_responses()).await;
    let mut config = server_config(&server.url());
    config.tenant_id = String::new();

    // When
    Session::authenticate(config).await.unwrap();

    // Then
    for request in server.finish().await {
        assert!(request.query_param("TENANTID").is_none());
    }
}

#[tokio::test]
async fn rejected_login_fails_with_auth_error() {
    setup_logging();
    // Given
    let server = MockServer::start(vec![MockResponse::status(401, "bad credentials")]).await;

    // When
    let err = Session::authenticate(server_config(&server.url()))
        .await
        .expect_err("login should be rejected");

    // Then
    match err {
        LrcError::Auth { status, body, .. } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert!(body.contains("bad credentials"));
        }
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn login_without_token_fails_with_auth_error() {
    setup_logging();
    // Given
    let server = MockServer::start(vec![MockResponse::json(r#"{"user":"jenkins"}"#)]).await;

    // When
    let err = Session::authenticate(server_config(&server.url()))
        .await
        .expect_err("login without token should fail");

    // Then
    match err {
        LrcError::Auth { reason, .. } => assert_eq!(reason, "login response missing token"),
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn tenant_answering_with_object_fails_validation() {
    setup_logging();
    // Given
    let server = MockServer::start(vec![
        MockResponse::json(r#"{"token":"fake_token"}"#),
        MockResponse::json(r#"{"error":"unknown tenant"}"#),
    ])
    .await;

    // When
    let err = Session::authenticate(server_config(&server.url()))
        .await
        .expect_err("tenant validation should fail");

    // Then
    match err {
        LrcError::Auth { reason, status, .. } => {
            assert_eq!(reason, "tenant validation failed");
            assert_eq!(status, StatusCode::OK);
        }
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn forbidden_tenant_fails_validation() {
    setup_logging();
    // Given
    let server = MockServer::start(vec![
        MockResponse::json(r#"{"token":"fake_token"}"#),
        MockResponse::status(403, "forbidden"),
    ])
    .await;

    // When
    let err = Session::authenticate(server_config(&server.url()))
        .await
        .expect_err("tenant validation should fail");

    // Then
    match err {
        LrcError::Auth { status, .. } => assert_eq!(status, StatusCode::FORBIDDEN),
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn refused_connection_is_io_failure() {
    setup_logging();
    // Given
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    // When
    let err = Session::authenticate(server_config(&format!("http://{addr}")))
        .await
        .expect_err("connection should be refused");

    // Then
    match err {
        LrcError::Network { kind, .. } => {
            assert_eq!(kind, NetworkFailure::Io);
            assert!(!kind.is_configuration_actionable());
        }
        other => panic!("expected Network, got {other:?}"),
    }
}

#[tokio::test]
async fn unresolvable_host_is_unreachable() {
    setup_logging();
    // Given
    let config = server_config("http://lrc-tenant.invalid");

    // When
    let err = Session::authenticate(config)
        .await
        .expect_err("host should not resolve");

    // Then
    match err {
        LrcError::Network { kind, .. } => {
            assert_eq!(kind, NetworkFailure::UnreachableHost);
            assert!(kind.is_configuration_actionable());
        }
        other => panic!("expected Network, got {other:?}"),
    }
}

#[tokio::test]
async fn plain_http_behind_https_url_is_tls_failure() {
    setup_logging();
    // Given
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut hello = [0u8; 1024];
        let _ = stream.read(&mut hello).await;
        let _ = stream
            .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await;
        let _ = stream.shutdown().await;
    });

    // When
    let err = Session::authenticate(server_config(&format!("https://{addr}")))
        .await
        .expect_err("handshake should fail");

    // Then
    match err {
        LrcError::Network { kind, .. } => {
            assert_eq!(kind, NetworkFailure::Tls);
            assert!(kind.is_configuration_actionable());
        }
        other => panic!("expected Network, got {other:?}"),
    }
}

#[tokio::test]
async fn refresh_replaces_credential() {
    setup_logging();
    // Given
    let (server, mut session) =
        authenticated(vec![MockResponse::json(r#"{"token":"second_token"}"#)]).await;

    // When
    session.refresh().await.unwrap();

    // Then
    assert_eq!(
        session.artifact(),
        &AuthArtifact::SessionCookie("second_token".to_string())
    );
    let requests = server.finish().await;
    assert_eq!(requests[2].path, "/v1/auth");
}

#[tokio::test]
async fn report_download_requires_binary_stream() {
    setup_logging();
    // Given
    let (server, session) = authenticated(vec![
        MockResponse::octet_stream(b"%PDF-1.7"),
        MockResponse::json(r#"{"message":"In progress"}"#),
    ])
    .await;

    // When
    let ready = session.get_report(42).await.unwrap();
    let pending = session.get_report(42).await.unwrap();

    // Then
    assert_eq!(ready.as_deref(), Some(b"%PDF-1.7".as_slice()));
    assert!(pending.is_none());
    let requests = server.finish().await;
    assert_eq!(requests[2].path, "/v1/test-runs/reports/42");
}
