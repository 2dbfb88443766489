use std::time::Duration;

use async_trait::async_trait;

use crate::config::ReportPollPolicy;
use crate::error::{LrcError, ReportSnafu};
use crate::model::LoadTestRun;
use crate::report::{ReportType, report_file_name};
use crate::rest::payload::{ReportRequest, ReportRequestResponse, ReportStatusMessage};
use crate::rest::{ApiResponse, Session, api_path};

const IN_PROGRESS_MESSAGE: &str = "In progress";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Result of one readiness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportCheck {
    Ready,
    Pending,
}

/// Where a single report stands. `Ready` and `Abandoned` are final.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportState {
    Requested { report_id: u64 },
    Polling { report_id: u64, retries: u32 },
    Ready { report_id: u64, retries: u32 },
    Abandoned { report_id: u64, retries: u32 },
}

impl ReportState {
    pub fn report_id(&self) -> u64 {
        match *self {
            ReportState::Requested { report_id }
            | ReportState::Polling { report_id, .. }
            | ReportState::Ready { report_id, .. }
            | ReportState::Abandoned { report_id, .. } => report_id,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, ReportState::Ready { .. } | ReportState::Abandoned { .. })
    }

    /// Leaves `Requested`. A ceiling of zero abandons without any check.
    pub fn begin_polling(self, max_retry: u32) -> Self {
        match self {
            ReportState::Requested { report_id } if max_retry == 0 => ReportState::Abandoned {
                report_id,
                retries: 0,
            },
            ReportState::Requested { report_id } => ReportState::Polling {
                report_id,
                retries: 0,
            },
            other => other,
        }
    }

    /// Applies one readiness check. Each pending answer consumes a retry;
    /// the state is abandoned once `max_retry` retries are used up.
    pub fn on_check(self, check: ReportCheck, max_retry: u32) -> Self {
        match (self, check) {
            (ReportState::Polling { report_id, retries }, ReportCheck::Ready) => {
                ReportState::Ready { report_id, retries }
            }
            (ReportState::Polling { report_id, retries }, ReportCheck::Pending) => {
                let retries = retries + 1;
                if retries >= max_retry {
                    ReportState::Abandoned { report_id, retries }
                } else {
                    ReportState::Polling { report_id, retries }
                }
            }
            (other, _) => other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportOutcome {
    pub report_type: ReportType,
    pub state: ReportState,
}

/// Server side of report generation.
#[async_trait]
pub trait ReportEndpoint: Send + Sync {
    /// Asks the server to render a report. Any failure is fatal.
    async fn request_report(&self, run_id: u64, report_type: ReportType)
    -> Result<u64, LrcError>;

    async fn check_report(&self, report_id: u64) -> Result<ReportCheck, LrcError>;
}

/// Delay between two readiness checks.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately. For deterministic polling in tests and dry runs.
pub struct NoDelay;

#[async_trait]
impl Sleeper for NoDelay {
    async fn sleep(&self, _duration: Duration) {}
}

/// Maps a report download response onto a readiness answer.
pub fn classify_report_response(
    report_id: u64,
    response: &ApiResponse,
) -> Result<ReportCheck, LrcError> {
    if !response.is_ok() {
        tracing::info!(
            report_id,
            status = %response.status,
            body = %response.body_excerpt(),
            "Report is not ready"
        );
        return Ok(ReportCheck::Pending);
    }

    let content_type = response.content_type.as_deref().unwrap_or_default();
    if content_type.contains(JSON_CONTENT_TYPE) {
        let message = serde_json::from_slice::<ReportStatusMessage>(&response.body)
            .ok()
            .and_then(|status| status.message);
        if message.as_deref() == Some(IN_PROGRESS_MESSAGE) {
            tracing::info!(report_id, "Report is not ready yet");
            return Ok(ReportCheck::Pending);
        }
        return ReportSnafu {
            message: format!(
                "Report #{report_id} invalid status: {}",
                response.body_excerpt()
            ),
        }
        .fail();
    }

    if response.is_octet_stream() {
        tracing::info!(report_id, "Report is ready");
        return Ok(ReportCheck::Ready);
    }

    ReportSnafu {
        message: format!("Unknown content type for report #{report_id}: {content_type}"),
    }
    .fail()
}

#[async_trait]
impl ReportEndpoint for Session {
    async fn request_report(
        &self,
        run_id: u64,
        report_type: ReportType,
    ) -> Result<u64, LrcError> {
        let path = api_path::request_report(self.config().project_id, run_id);
        let body = ReportRequest {
            report_type: report_type.as_str(),
        };
        let response = self.post(&path, &[], &body).await?;
        if !response.is_ok() {
            tracing::error!(
                status = %response.status,
                body = %response.body_excerpt(),
                "Failed to request {report_type} report"
            );
            return ReportSnafu {
                message: format!(
                    "Failed to request {report_type} report: {}, {}",
                    response.status,
                    response.body_excerpt()
                ),
            }
            .fail();
        }
        let payload: ReportRequestResponse = response.json("report request")?;
        Ok(payload.report_id)
    }

    async fn check_report(&self, report_id: u64) -> Result<ReportCheck, LrcError> {
        let response = self.get(&api_path::report(report_id)).await?;
        classify_report_response(report_id, &response)
    }
}

/// Requests server-side reports for a finished run and waits for each of
/// them under a bounded number of checks.
pub struct ReportAcquisition<'a, E: ReportEndpoint, S: Sleeper> {
    endpoint: &'a E,
    sleeper: &'a S,
    policy: ReportPollPolicy,
    tenant_id: String,
}

impl<'a, E: ReportEndpoint, S: Sleeper> ReportAcquisition<'a, E, S> {
    pub fn new(
        endpoint: &'a E,
        sleeper: &'a S,
        policy: ReportPollPolicy,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            sleeper,
            policy,
            tenant_id: tenant_id.into(),
        }
    }

    /// Returns `run` with a file name entry for every report that became
    /// ready, and the final state of every report that was requested.
    #[tracing::instrument(skip(self, run), fields(run_id = run.id))]
    pub async fn acquire(
        &self,
        run: LoadTestRun,
        requested: &[ReportType],
        skip_pdf_report: bool,
    ) -> Result<(LoadTestRun, Vec<ReportOutcome>), LrcError> {
        let permitted = ReportType::permitted(skip_pdf_report);
        let report_types: Vec<ReportType> = requested
            .iter()
            .copied()
            .filter(|report_type| permitted.contains(report_type))
            .collect();
        if report_types.is_empty() {
            tracing::info!(?requested, "No permitted report types, skip downloading reports");
            return Ok((run, Vec::new()));
        }

        let mut run = run;
        let mut outcomes = Vec::with_capacity(report_types.len());
        for report_type in report_types {
            let state = self.acquire_one(run.id, report_type).await?;
            match state {
                ReportState::Ready { report_id, .. } => {
                    let file_name = report_file_name(&self.tenant_id, run.id, report_type);
                    run = run.with_report(file_name, report_id);
                }
                ReportState::Abandoned { report_id, retries } => {
                    tracing::warn!(
                        report_id,
                        retries,
                        "{report_type} report is not ready after {retries} retries, skipping"
                    );
                }
                ReportState::Requested { .. } | ReportState::Polling { .. } => {}
            }
            outcomes.push(ReportOutcome { report_type, state });
        }
        Ok((run, outcomes))
    }

    /// Drives one report from request to a final state.
    pub async fn acquire_one(
        &self,
        run_id: u64,
        report_type: ReportType,
    ) -> Result<ReportState, LrcError> {
        tracing::info!("Requesting {report_type} report");
        let report_id = self.endpoint.request_report(run_id, report_type).await?;
        let max_retry = self.policy.max_retry(report_type);
        let mut state = ReportState::Requested { report_id }.begin_polling(max_retry);
        while !state.is_final() {
            let check = self.endpoint.check_report(report_id).await?;
            state = state.on_check(check, max_retry);
            if !state.is_final() {
                self.sleeper.sleep(self.policy.interval).await;
            }
        }
        Ok(state)
    }
}
