use std::fmt;
use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::{IntoError, ResultExt};

use crate::config::ServerConfiguration;
use crate::error::{
    AuthSnafu, LrcError, NetworkSnafu, ParseSnafu, RequestConstructionSnafu,
    classify_transport_error, truncate_body,
};
use crate::rest::api_path;
use crate::rest::auth::{AuthArtifact, AuthStrategy, LoginResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const TENANT_QUERY_PARAM: &str = "TENANTID";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Status, content type and body of a completed HTTP exchange.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn is_octet_stream(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains(OCTET_STREAM))
    }

    /// Body text suitable for logs and error messages.
    pub fn body_excerpt(&self) -> String {
        truncate_body(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self, what: &str) -> Result<T, LrcError> {
        serde_json::from_slice(&self.body).context(ParseSnafu { what })
    }
}

/// One authenticated connection to the service.
pub struct Session {
    client: Client,
    config: ServerConfiguration,
    strategy: AuthStrategy,
    artifact: AuthArtifact,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.config.url)
            .field("tenant_id", &self.config.tenant_id)
            .field("strategy", &self.strategy)
            .field("artifact", &self.artifact)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Logs in with the strategy implied by the configured username and
    /// verifies that the tenant is reachable with the resulting credential.
    #[tracing::instrument(skip(config), fields(url = %config.url, tenant = %config.tenant_id))]
    pub async fn authenticate(config: ServerConfiguration) -> Result<Self, LrcError> {
        let client = build_client(&config)?;
        let strategy = AuthStrategy::select(&config.username, &config.password);
        tracing::info!(
            strategy = strategy.name(),
            identity = %strategy.masked_identity(),
            "Authenticating"
        );
        let artifact = login(&client, &config, &strategy).await?;
        let session = Self {
            client,
            config,
            strategy,
            artifact,
        };
        session.validate_tenant().await?;
        tracing::info!("Authenticated");
        Ok(session)
    }

    /// Logs in again with the same strategy and replaces the credential.
    pub async fn refresh(&mut self) -> Result<(), LrcError> {
        tracing::info!("Re-authenticating");
        self.artifact = login(&self.client, &self.config, &self.strategy).await?;
        Ok(())
    }

    pub fn config(&self) -> &ServerConfiguration {
        &self.config
    }

    pub fn artifact(&self) -> &AuthArtifact {
        &self.artifact
    }

    async fn validate_tenant(&self) -> Result<(), LrcError> {
        let response = self.get(api_path::PROJECTS).await?;
        let is_array = response.is_ok()
            && serde_json::from_slice::<serde_json::Value>(&response.body)
                .map(|value| value.is_array())
                .unwrap_or(false);
        if !is_array {
            tracing::error!(
                status = %response.status,
                body = %response.body_excerpt(),
                "Tenant validation failed"
            );
            return AuthSnafu {
                reason: "tenant validation failed",
                status: response.status,
                body: response.body_excerpt(),
            }
            .fail();
        }
        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, LrcError> {
        let request = self.request(Method::GET, path);
        execute(request, path).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<ApiResponse, LrcError> {
        let request = self.request(Method::POST, path).query(query).json(body);
        execute(request, path).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<ApiResponse, LrcError> {
        let request = self.request(Method::PUT, path).query(query).json(body);
        execute(request, path).await
    }

    /// Downloads a generated report. Returns `None` unless the server
    /// answers with a binary stream.
    #[tracing::instrument(skip(self))]
    pub async fn get_report(&self, report_id: u64) -> Result<Option<Vec<u8>>, LrcError> {
        let response = self.get(&api_path::report(report_id)).await?;
        if response.is_ok() && response.is_octet_stream() {
            Ok(Some(response.body))
        } else {
            tracing::warn!(
                status = %response.status,
                content_type = ?response.content_type,
                body = %response.body_excerpt(),
                "Report is not downloadable"
            );
            Ok(None)
        }
    }

    /// Releases the connection pool.
    pub fn close(self) {
        tracing::debug!("Closing session");
        drop(self.client);
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = base_request(&self.client, &self.config, method, path);
        self.artifact.apply(request)
    }
}

fn build_client(config: &ServerConfiguration) -> Result<Client, LrcError> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT);
    if let Some(proxy_config) = &config.proxy {
        let mut proxy = reqwest::Proxy::all(proxy_config.url()).map_err(|e| {
            RequestConstructionSnafu {
                request: "proxy",
                message: e.to_string(),
            }
            .build()
        })?;
        if let (Some(user), Some(password)) = (&proxy_config.username, &proxy_config.password) {
            proxy = proxy.basic_auth(user, password);
        }
        tracing::info!(proxy = %proxy_config.url(), "Using proxy");
        builder = builder.proxy(proxy);
    } else {
        // Only an explicitly configured proxy is used, never HTTP_PROXY & co.
        builder = builder.no_proxy();
    }
    builder.build().map_err(|e| {
        RequestConstructionSnafu {
            request: "http client",
            message: e.to_string(),
        }
        .build()
    })
}

fn base_request(
    client: &Client,
    config: &ServerConfiguration,
    method: Method,
    path: &str,
) -> RequestBuilder {
    let request = client
        .request(method, format!("{}/{path}", config.url))
        .header(CONTENT_TYPE, "application/json")
        .header(CACHE_CONTROL, "no-cache");
    if config.tenant_id.is_empty() {
        request
    } else {
        request.query(&[(TENANT_QUERY_PARAM, config.tenant_id.as_str())])
    }
}

async fn login(
    client: &Client,
    config: &ServerConfiguration,
    strategy: &AuthStrategy,
) -> Result<AuthArtifact, LrcError> {
    let path = strategy.login_path();
    let request = base_request(client, config, Method::POST, path).json(&strategy.login_request());
    let response = execute(request, path).await?;
    if !response.is_ok() {
        tracing::error!(
            status = %response.status,
            body = %response.body_excerpt(),
            "Login rejected"
        );
        return AuthSnafu {
            reason: "login rejected",
            status: response.status,
            body: response.body_excerpt(),
        }
        .fail();
    }
    let token = serde_json::from_slice::<LoginResponse>(&response.body)
        .ok()
        .and_then(|r| r.token)
        .filter(|token| !token.is_empty());
    match token {
        Some(token) => Ok(strategy.artifact(token)),
        None => {
            tracing::error!(body = %response.body_excerpt(), "Login response missing token");
            AuthSnafu {
                reason: "login response missing token",
                status: response.status,
                body: response.body_excerpt(),
            }
            .fail()
        }
    }
}

async fn execute(request: RequestBuilder, context: &str) -> Result<ApiResponse, LrcError> {
    let response = request.send().await.map_err(|e| transport_error(e, context))?;
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(e, context))?
        .to_vec();
    tracing::debug!(%status, path = context, body = %truncate_body(&body), "Response received");
    Ok(ApiResponse {
        status,
        content_type,
        body,
    })
}

fn transport_error(error: reqwest::Error, context: &str) -> LrcError {
    let kind = classify_transport_error(&error);
    tracing::error!(%kind, path = context, "Request failed: {error}");
    NetworkSnafu { kind, context }.into_error(error)
}
