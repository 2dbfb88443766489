use crate::accessor::{expect_authorized, expect_ok};
use crate::error::{AbortSnafu, LrcError, RunStartSnafu};
use crate::model::{LoadTest, LoadTestRun, StatusUpdate, TestRunStatus};
use crate::rest::payload::{
    RunStatusResponse, StartRunResponse, TestRunResponse, TestRunResults, TestRunTransaction,
    TrtSummary,
};
use crate::rest::{Session, api_path};

pub const INITIATOR: &str = "lrc_run";

/// Starts, observes and stops runs, and reads their result datasets.
/// Every read goes to the server; nothing is cached.
pub struct TestRunAccessor<'a> {
    session: &'a Session,
}

impl<'a> TestRunAccessor<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    #[tracing::instrument(skip(self))]
    pub async fn start_run(&self, test_id: u64, send_email: bool) -> Result<u64, LrcError> {
        let path = api_path::start_run(self.session.config().project_id, test_id);
        let send_email = send_email.to_string();
        let query = [("sendEmail", send_email.as_str()), ("initiator", INITIATOR)];
        let response = self
            .session
            .post(&path, &query, &serde_json::json!({}))
            .await?;
        if !response.is_ok() {
            tracing::error!(
                status = %response.status,
                body = %response.body_excerpt(),
                "Failed to start test run"
            );
            return RunStartSnafu {
                test_id,
                status: response.status,
                body: response.body_excerpt(),
            }
            .fail();
        }
        let payload: StartRunResponse = response.json("started test run")?;
        tracing::info!(run_id = payload.run_id, "Test run started");
        Ok(payload.run_id)
    }

    /// Looks up an existing run by id.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, run_id: u64) -> Result<LoadTestRun, LrcError> {
        let path = api_path::test_run(run_id);
        let response = self.session.get(&path).await?;
        expect_authorized(&response, &format!("test run #{run_id}"), &path)?;
        let payload: TestRunResponse = response.json(&format!("test run #{run_id}"))?;
        let load_test = LoadTest {
            id: payload.test_id,
            project_id: self.session.config().project_id,
            name: String::new(),
        };
        Ok(LoadTestRun::new(run_id, load_test).with_status(status_update(payload.status)))
    }

    /// Returns `run` advanced to the status currently reported by the server.
    #[tracing::instrument(skip(self, run), fields(run_id = run.id))]
    pub async fn fetch_status(&self, run: &LoadTestRun) -> Result<LoadTestRun, LrcError> {
        let path = api_path::run_status(run.load_test.project_id, run.load_test.id, run.id);
        let response = self.session.get(&path).await?;
        expect_authorized(&response, &format!("status of test run #{}", run.id), &path)?;
        let payload: RunStatusResponse =
            response.json(&format!("status of test run #{}", run.id))?;
        let update = status_update(payload);
        tracing::debug!(status = %update.status, detailed = ?update.detailed_status, "Run status");
        Ok(run.clone().with_status(update))
    }

    #[tracing::instrument(skip(self, run), fields(run_id = run.id))]
    pub async fn abort(&self, run: &LoadTestRun) -> Result<(), LrcError> {
        let path = api_path::change_run_status(run.id);
        let response = self
            .session
            .put(&path, &[("action", "STOP")], &serde_json::json!({}))
            .await?;
        if !response.is_ok() {
            tracing::error!(
                status = %response.status,
                body = %response.body_excerpt(),
                "Aborting test run failed"
            );
            return AbortSnafu {
                run_id: run.id,
                status: response.status,
                body: response.body_excerpt(),
            }
            .fail();
        }
        tracing::info!("Test run aborted");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_results(&self, run_id: u64) -> Result<TestRunResults, LrcError> {
        let response = self.session.get(&api_path::run_results(run_id)).await?;
        expect_ok(&response, "test run results")?;
        response.json("test run results")
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_transactions(&self, run_id: u64) -> Result<Vec<TestRunTransaction>, LrcError> {
        let response = self
            .session
            .get(&api_path::run_transactions(run_id))
            .await?;
        expect_ok(&response, "test run transactions")?;
        response.json("test run transactions")
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_trt_summary(&self, run_id: u64) -> Result<Vec<TrtSummary>, LrcError> {
        let response = self
            .session
            .get(&api_path::run_trt_summary(run_id))
            .await?;
        expect_ok(&response, "test run TRT summary")?;
        response.json("test run TRT summary")
    }
}

fn status_update(payload: RunStatusResponse) -> StatusUpdate {
    StatusUpdate {
        status: TestRunStatus::parse(&payload.status),
        detailed_status: payload.detailed_status,
        has_report: payload.has_report,
    }
}
