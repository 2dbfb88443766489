use std::path::PathBuf;

use snafu::{Location, Snafu};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

pub struct LoggingConfig {
    pub log_file: Option<PathBuf>,
    pub stderr: bool,
    /// Lowers the threshold from INFO to DEBUG, which adds request and
    /// response traces.
    pub debug: bool,
}

impl LoggingConfig {
    pub fn new(log_file: Option<PathBuf>, stderr: bool, debug: bool) -> Self {
        Self {
            log_file,
            stderr,
            debug,
        }
    }

    fn level(&self) -> LevelFilter {
        if self.debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LogError {
    #[snafu(display("Failed to initialize logging: {message}"))]
    InitError {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

pub fn init_logging(config: LoggingConfig) -> Result<(), LogError> {
    let level = config.level();
    let subscriber = Registry::default();

    let file_layer = if let Some(log_file) = config.log_file {
        let log_file = std::fs::File::create(&log_file).map_err(|e| {
            InitSnafu {
                message: format!("{}: {e}", log_file.display()),
            }
            .build()
        })?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(log_file)
                .with_filter(level),
        )
    } else {
        None
    };
    let subscriber = subscriber.with(file_layer);

    let stderr_layer = if config.stderr {
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(level),
        )
    } else {
        None
    };
    let subscriber = subscriber.with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        InitSnafu {
            message: e.to_string(),
        }
        .build()
    })?;
    Ok(())
}
