mod report_acquisition;
mod runner;
mod session;

use lrc_core::config::ServerConfiguration;
use lrc_core::rest::Session;

use mock_server::{MockResponse, MockServer};

pub const TENANT_ID: &str = "123456789";
pub const PROJECT_ID: u64 = 1;
pub const CLIENT_ID: &str = "oauth2-AbCdEfGhIjKlMnOpQrSt@microfocus.com";

pub fn setup_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

pub fn server_config(url: &str) -> ServerConfiguration {
    ServerConfiguration {
        url: url.to_string(),
        tenant_id: TENANT_ID.to_string(),
        project_id: PROJECT_ID,
        username: "jenkins".to_string(),
        password: "secret".to_string(),
        proxy: None,
    }
}

/// Responses consumed by a successful interactive login and tenant check.
pub fn login_responses() -> Vec<MockResponse> {
    vec![
        MockResponse::json(r#"{"token":"fake_token"}"#),
        MockResponse::json("[]"),
    ]
}

/// Starts a server that answers the login, then `responses`, and returns it
/// with an authenticated session.
pub async fn authenticated(responses: Vec<MockResponse>) -> (MockServer, Session) {
    let mut script = login_responses();
    script.extend(responses);
    let server = MockServer::start(script).await;
    let session = Session::authenticate(server_config(&server.url()))
        .await
        .expect("login should succeed");
    (server, session)
}
