use std::time::Duration;

use crate::config::run_options::TestRunOptions;
use crate::report::ReportType;

const REPORT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const RUN_STATUS_INTERVAL: Duration = Duration::from_secs(10);
const TEST_MODE_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded polling for server-side report generation. PDF rendering is
/// noticeably slower than CSV, so it gets its own ceiling.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportPollPolicy {
    /// Delay between two readiness checks.
    pub interval: Duration,
    /// Readiness checks allowed for a CSV report before it is abandoned.
    pub csv_max_retry: u32,
    /// Readiness checks allowed for a PDF report before it is abandoned.
    pub pdf_max_retry: u32,
}

impl ReportPollPolicy {
    pub fn for_options(options: &TestRunOptions) -> Self {
        let mut policy = Self::default();
        if options.test_mode {
            policy.interval = TEST_MODE_INTERVAL;
        }
        policy
    }

    pub fn max_retry(&self, report_type: ReportType) -> u32 {
        match report_type {
            ReportType::Pdf => self.pdf_max_retry,
            ReportType::Csv | ReportType::Xml => self.csv_max_retry,
        }
    }
}

impl Default for ReportPollPolicy {
    fn default() -> Self {
        Self {
            interval: REPORT_POLL_INTERVAL,
            csv_max_retry: 30,
            pdf_max_retry: 60,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunPollPolicy {
    /// Delay between two run status requests.
    pub interval: Duration,
}

impl RunPollPolicy {
    pub fn for_options(options: &TestRunOptions) -> Self {
        if options.test_mode {
            Self {
                interval: TEST_MODE_INTERVAL,
            }
        } else {
            Self::default()
        }
    }
}

impl Default for RunPollPolicy {
    fn default() -> Self {
        Self {
            interval: RUN_STATUS_INTERVAL,
        }
    }
}
