pub mod polling;
pub mod run_options;
pub mod server;
pub mod settings;

use snafu::{Location, Snafu};

pub use polling::{ReportPollPolicy, RunPollPolicy};
pub use run_options::TestRunOptions;
pub use server::{ProxyConfiguration, ServerConfiguration};

/// Setting keys understood by [`ServerConfiguration::from_settings`] and
/// [`TestRunOptions::from_settings`].
pub mod keys {
    pub const URL: &str = "url";
    pub const TENANT_ID: &str = "tenant_id";
    pub const PROJECT_ID: &str = "project_id";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const PROXY_HOST: &str = "proxy_host";
    pub const PROXY_PORT: &str = "proxy_port";
    pub const PROXY_USERNAME: &str = "proxy_username";
    pub const PROXY_PASSWORD: &str = "proxy_password";
    pub const TEST_ID: &str = "test_id";
    pub const SEND_EMAIL: &str = "send_email";
    pub const SKIP_PDF_REPORT: &str = "skip_pdf_report";
    pub const DEBUG: &str = "debug";
    pub const TEST_MODE: &str = "test_mode";
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    #[snafu(display("Missing parameter: {parameter}"))]
    MissingParameter {
        parameter: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Invalid value for {parameter} ({value}): {explanation}"))]
    InvalidParameterValue {
        parameter: String,
        value: String,
        explanation: String,
        #[snafu(implicit)]
        location: Location,
    },
}
