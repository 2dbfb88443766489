use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgMatches, Command};
use lrc_core::config::run_options::apply_env_overrides;
use lrc_core::config::settings::{Setting, Settings};
use lrc_core::config::{ServerConfiguration, TestRunOptions, keys};
use lrc_core::error::{LrcError, NetworkFailure};
use lrc_core::logging::{LoggingConfig, init_logging};
use lrc_core::report::output::{write_artifacts, write_run_result};
use lrc_core::runner::Runner;
use tracing::{error, info, warn};

/// Value flags as (setting key, long name, value name).
const VALUE_ARGS: &[(&str, &str, &str)] = &[
    (keys::URL, "url", "URL"),
    (keys::TENANT_ID, "tenant-id", "TENANT"),
    (keys::PROJECT_ID, "project-id", "ID"),
    (keys::USERNAME, "username", "USER"),
    (keys::PASSWORD, "password", "PASSWORD"),
    (keys::PROXY_HOST, "proxy-host", "HOST"),
    (keys::PROXY_PORT, "proxy-port", "PORT"),
    (keys::PROXY_USERNAME, "proxy-username", "USER"),
    (keys::PROXY_PASSWORD, "proxy-password", "PASSWORD"),
    (keys::TEST_ID, "test-id", "ID"),
];

/// Switches as (setting key, long name, help).
const FLAG_ARGS: &[(&str, &str, &str)] = &[
    (keys::SEND_EMAIL, "send-email", "Let the server e-mail the run results"),
    (keys::SKIP_PDF_REPORT, "skip-pdf-report", "Only request the CSV report"),
    (keys::DEBUG, "debug", "Log requests and responses"),
    (keys::TEST_MODE, "test-mode", "Poll every 100 ms"),
];

fn command() -> Command {
    let mut command = Command::new("lrc_run")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs a LoadRunner Cloud load test from a CI step and collects its reports")
        .after_help(
            "LRC_URL, LRC_TENANT_ID, LRC_USERNAME, LRC_PASSWORD, LRC_PROJECT_ID and LRC_TEST_ID \
             override the matching flags. LRC_SKIP_PDF_REPORT and LRC_DEBUG_LOG switch on \
             their options unless empty, 0 or false.",
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .help("Directory receiving reports and the run result")
                .value_name("DIR")
                .default_value("."),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Also write logs to this file")
                .value_name("FILE"),
        );
    for (key, long, value_name) in VALUE_ARGS {
        command = command.arg(Arg::new(*key).long(*long).value_name(*value_name));
    }
    for (key, long, help) in FLAG_ARGS {
        command = command.arg(
            Arg::new(*key)
                .long(*long)
                .help(*help)
                .action(clap::ArgAction::SetTrue),
        );
    }
    command
}

fn settings_from_matches(matches: &ArgMatches) -> HashMap<String, Setting> {
    let mut settings: HashMap<String, Setting> = HashMap::new();
    for (key, _, _) in VALUE_ARGS {
        if let Some(value) = matches.get_one::<String>(key) {
            settings.set_string(key, value);
        }
    }
    for (key, _, _) in FLAG_ARGS {
        settings.set_bool(key, matches.get_flag(key));
    }
    settings
}

fn suggest(err: &LrcError) {
    match err {
        LrcError::Network { kind, .. } if kind.is_configuration_actionable() => match kind {
            NetworkFailure::UnreachableHost => {
                error!("Suggestion: check the server URL and proxy settings")
            }
            _ => error!("Suggestion: check the server certificate and trusted roots"),
        },
        LrcError::Network { .. } => error!("Suggestion: the failure looks transient, retry"),
        LrcError::Auth { .. } => error!("Suggestion: check the credentials and tenant id"),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = command().get_matches();
    let mut settings = settings_from_matches(&matches);
    let applied = apply_env_overrides(&mut settings, std::env::vars());

    let debug = settings.get_bool(keys::DEBUG).unwrap_or(false);
    let log_file = matches.get_one::<String>("log-file").map(PathBuf::from);
    if let Err(e) = init_logging(LoggingConfig::new(log_file, true, debug)) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    for var in applied {
        info!("Read {var} from environment");
    }

    let config = match ServerConfiguration::from_settings(&settings) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let options = match TestRunOptions::from_settings(&settings) {
        Ok(options) => options,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(?config, ?options, "Starting job");

    let output_dir = matches
        .get_one::<String>("output-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let runner = Runner::new(config, options);
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    let run = match runner.run(interrupt).await {
        Ok(run) => run,
        Err(e) => {
            error!("Failed to run test: {e}");
            suggest(&e);
            return ExitCode::FAILURE;
        }
    };

    write_artifacts(&output_dir, &run);
    if let Err(e) = write_run_result(&output_dir, runner.options(), &run) {
        error!("{e}");
    }

    if run.status.is_success() {
        info!(run_id = run.id, "Test run passed");
        ExitCode::SUCCESS
    } else {
        warn!(run_id = run.id, status = %run.status, "Test run did not pass");
        ExitCode::FAILURE
    }
}
