use std::fmt;

use reqwest::StatusCode;
use snafu::{Location, Snafu};

use crate::config::ConfigError;

/// Upper bound on response bodies carried in errors and log lines.
pub const MAX_LOGGED_BODY_CHARS: usize = 512;

/// How a request failed before any HTTP status was received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkFailure {
    /// Host name could not be resolved.
    UnreachableHost,
    /// TLS handshake or certificate verification failed.
    Tls,
    /// Anything else on the wire: refused/reset connections, timeouts.
    Io,
}

impl NetworkFailure {
    /// Unreachable hosts and TLS failures are fixed by changing
    /// configuration (URL, proxy, trust store); I/O failures are transient.
    pub fn is_configuration_actionable(self) -> bool {
        matches!(self, NetworkFailure::UnreachableHost | NetworkFailure::Tls)
    }
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkFailure::UnreachableHost => write!(f, "unreachable host"),
            NetworkFailure::Tls => write!(f, "TLS failure"),
            NetworkFailure::Io => write!(f, "I/O failure"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LrcError {
    #[snafu(display("Authentication failed: {reason} (status {status}, body: {body})"))]
    Auth {
        reason: String,
        status: StatusCode,
        body: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Unauthorized request: {path}"))]
    Unauthorized {
        path: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to fetch {what}: status {status}, body: {body}"))]
    Fetch {
        what: String,
        status: StatusCode,
        body: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to start test run for load test #{test_id}: status {status}, body: {body}"))]
    RunStart {
        test_id: u64,
        status: StatusCode,
        body: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Aborting test run #{run_id} failed: status {status}, body: {body}"))]
    Abort {
        run_id: u64,
        status: StatusCode,
        body: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to parse {what}"))]
    Parse {
        what: String,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Report error: {message}"))]
    Report {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Network failure ({kind}) during {context}"))]
    Network {
        kind: NetworkFailure,
        context: String,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to build request: {request}"))]
    RequestConstruction {
        request: String,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Invalid configuration"))]
    Config {
        source: ConfigError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Failed to write {path}"))]
    Output {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Test run #{run_id} was interrupted"))]
    Interrupted {
        run_id: u64,
        #[snafu(implicit)]
        location: Location,
    },
}

impl LrcError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, LrcError::Unauthorized { .. })
    }
}

/// Lossy text of a response body, cut to [`MAX_LOGGED_BODY_CHARS`].
pub fn truncate_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(MAX_LOGGED_BODY_CHARS)
        .collect()
}

/// `io::Error::source` skips the wrapped error itself, so the rustls error
/// behind one or more custom I/O errors is only reachable through `get_ref`.
fn wraps_rustls_error(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if err.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        current = err
            .downcast_ref::<std::io::Error>()
            .and_then(std::io::Error::get_ref)
            .map(|inner| inner as &(dyn std::error::Error + 'static));
    }
    false
}

/// Sorts a transport error into one of the [`NetworkFailure`] kinds by
/// walking its source chain.
pub fn classify_transport_error(error: &reqwest::Error) -> NetworkFailure {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    let mut messages = Vec::new();
    while let Some(err) = current {
        if wraps_rustls_error(err) {
            return NetworkFailure::Tls;
        }
        messages.push(err.to_string().to_lowercase());
        current = err.source();
    }

    let mentions = |needle: &str| messages.iter().any(|m| m.contains(needle));
    if mentions("certificate") || mentions("tls handshake") {
        NetworkFailure::Tls
    } else if error.is_connect() && (mentions("dns error") || mentions("failed to lookup address"))
    {
        NetworkFailure::UnreachableHost
    } else {
        NetworkFailure::Io
    }
}
