use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::rest::payload::{LoadTestTransaction, TestRunResults, TestRunTransaction};

/// Lifecycle state reported by the server. Only the terminal/non-terminal
/// split and a handful of outcomes matter to the client; anything else is
/// carried verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestRunStatus {
    Initializing,
    Running,
    Stopping,
    Passed,
    Failed,
    Aborted,
    Halted,
    SystemError,
    FailedToStart,
    Other(String),
}

impl TestRunStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "INITIALIZING" | "QUEUED" | "PENDING" => TestRunStatus::Initializing,
            "RUNNING" | "IN_PROGRESS" => TestRunStatus::Running,
            "STOPPING" | "HALTING" => TestRunStatus::Stopping,
            "PASSED" => TestRunStatus::Passed,
            "FAILED" => TestRunStatus::Failed,
            "ABORTED" => TestRunStatus::Aborted,
            "HALTED" => TestRunStatus::Halted,
            "SYSTEM_ERROR" => TestRunStatus::SystemError,
            "FAILED_TO_START" => TestRunStatus::FailedToStart,
            _ => TestRunStatus::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TestRunStatus::Initializing => "INITIALIZING",
            TestRunStatus::Running => "RUNNING",
            TestRunStatus::Stopping => "STOPPING",
            TestRunStatus::Passed => "PASSED",
            TestRunStatus::Failed => "FAILED",
            TestRunStatus::Aborted => "ABORTED",
            TestRunStatus::Halted => "HALTED",
            TestRunStatus::SystemError => "SYSTEM_ERROR",
            TestRunStatus::FailedToStart => "FAILED_TO_START",
            TestRunStatus::Other(value) => value,
        }
    }

    /// Unknown statuses are treated as still running.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TestRunStatus::Passed
                | TestRunStatus::Failed
                | TestRunStatus::Aborted
                | TestRunStatus::Halted
                | TestRunStatus::SystemError
                | TestRunStatus::FailedToStart
        )
    }

    pub fn is_success(&self) -> bool {
        *self == TestRunStatus::Passed
    }
}

impl fmt::Display for TestRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TestRunStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTest {
    pub id: u64,
    pub project_id: u64,
    pub name: String,
}

/// Fields of a status payload that advance a run.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusUpdate {
    pub status: TestRunStatus,
    pub detailed_status: Option<String>,
    pub has_report: bool,
}

/// Snapshot of one run. Every transition consumes the snapshot and returns
/// the next one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestRun {
    pub id: u64,
    pub load_test: LoadTest,
    pub status: TestRunStatus,
    pub detailed_status: Option<String>,
    pub has_report: bool,
    /// Report file name to server report id, filled by report acquisition.
    pub reports: BTreeMap<String, u64>,
    /// File name to artifact bytes, filled by downloads and renderers.
    #[serde(skip)]
    pub rendered: BTreeMap<String, Vec<u8>>,
    pub transactions: Vec<TestRunTransaction>,
    pub results: Option<TestRunResults>,
}

impl LoadTestRun {
    pub fn new(id: u64, load_test: LoadTest) -> Self {
        Self {
            id,
            load_test,
            status: TestRunStatus::Initializing,
            detailed_status: None,
            has_report: false,
            reports: BTreeMap::new(),
            rendered: BTreeMap::new(),
            transactions: Vec::new(),
            results: None,
        }
    }

    pub fn with_status(self, update: StatusUpdate) -> Self {
        Self {
            status: update.status,
            detailed_status: update.detailed_status,
            has_report: update.has_report,
            ..self
        }
    }

    pub fn with_report(mut self, file_name: String, report_id: u64) -> Self {
        self.reports.insert(file_name, report_id);
        self
    }

    pub fn with_rendered(mut self, file_name: String, content: Vec<u8>) -> Self {
        self.rendered.insert(file_name, content);
        self
    }

    pub fn with_transactions(self, transactions: Vec<TestRunTransaction>) -> Self {
        Self {
            transactions,
            ..self
        }
    }

    pub fn with_results(self, results: TestRunResults) -> Self {
        Self {
            results: Some(results),
            ..self
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_aborted(&self) -> bool {
        self.status == TestRunStatus::Aborted
    }
}

/// SLA configuration of a load test, fetched separately from the test.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadTestSla {
    pub percentile: u32,
    pub transactions: Vec<LoadTestTransaction>,
}
