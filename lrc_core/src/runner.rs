use std::future::Future;

use crate::accessor::{LoadTestAccessor, TestRunAccessor};
use crate::config::{ReportPollPolicy, RunPollPolicy, ServerConfiguration, TestRunOptions};
use crate::error::{InterruptedSnafu, LrcError};
use crate::model::{LoadTestRun, TestRunStatus};
use crate::report::{
    ReportAcquisition, ReportType, Sleeper, TokioSleeper, csv, report_file_name, sla,
    transactions_csv_file_name, xml,
};
use crate::rest::Session;

const REQUESTED_REPORTS: &[ReportType] = &[ReportType::Csv, ReportType::Pdf];

/// Runs one load test from login to rendered artifacts.
pub struct Runner<S: Sleeper = TokioSleeper> {
    config: ServerConfiguration,
    options: TestRunOptions,
    run_policy: RunPollPolicy,
    report_policy: ReportPollPolicy,
    sleeper: S,
}

impl Runner<TokioSleeper> {
    pub fn new(config: ServerConfiguration, options: TestRunOptions) -> Self {
        Self {
            run_policy: RunPollPolicy::for_options(&options),
            report_policy: ReportPollPolicy::for_options(&options),
            config,
            options,
            sleeper: TokioSleeper,
        }
    }
}

impl<S: Sleeper> Runner<S> {
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Runner<T> {
        Runner {
            config: self.config,
            options: self.options,
            run_policy: self.run_policy,
            report_policy: self.report_policy,
            sleeper,
        }
    }

    pub fn with_report_policy(self, report_policy: ReportPollPolicy) -> Self {
        Self {
            report_policy,
            ..self
        }
    }

    pub fn options(&self) -> &TestRunOptions {
        &self.options
    }

    /// Starts the configured load test and waits for it to finish. When
    /// `interrupt` resolves first the run is aborted on the server and the
    /// call fails with `Interrupted`.
    #[tracing::instrument(skip(self, interrupt), fields(test_id = self.options.test_id))]
    pub async fn run<F>(&self, interrupt: F) -> Result<LoadTestRun, LrcError>
    where
        F: Future<Output = ()>,
    {
        let mut session = Session::authenticate(self.config.clone()).await?;

        let load_test = LoadTestAccessor::new(&session)
            .fetch(self.options.test_id)
            .await?;
        let run_id = TestRunAccessor::new(&session)
            .start_run(self.options.test_id, self.options.send_email)
            .await?;
        let run = LoadTestRun::new(run_id, load_test);
        tracing::info!(run_id, "Waiting for test run to finish");

        let finished = tokio::select! {
            result = self.wait_for_completion(&mut session, run.clone()) => Some(result),
            _ = interrupt => None,
        };
        let run = match finished {
            Some(result) => result?,
            None => {
                tracing::warn!(run_id, "Interrupted, aborting test run");
                if let Err(e) = TestRunAccessor::new(&session).abort(&run).await {
                    tracing::error!("Failed to abort test run: {e}");
                }
                session.close();
                return InterruptedSnafu { run_id }.fail();
            }
        };
        tracing::info!(
            status = %run.status,
            detailed = ?run.detailed_status,
            has_report = run.has_report,
            "Test run finished"
        );

        let run = self.collect(&session, run).await?;
        let run = self.render(&session, run).await?;
        session.close();
        Ok(run)
    }

    /// Polls the run status until the server reports a terminal state.
    /// An expired credential is renewed once before the error is surfaced.
    async fn wait_for_completion(
        &self,
        session: &mut Session,
        run: LoadTestRun,
    ) -> Result<LoadTestRun, LrcError> {
        let mut run = run;
        let mut refreshed = false;
        loop {
            match TestRunAccessor::new(session).fetch_status(&run).await {
                Ok(next) => {
                    if next.status != run.status {
                        tracing::info!(run_id = run.id, status = %next.status, "Test run status changed");
                    }
                    run = next;
                    if run.is_terminal() {
                        return Ok(run);
                    }
                    refreshed = false;
                }
                Err(e) if e.is_unauthorized() && !refreshed => {
                    session.refresh().await?;
                    refreshed = true;
                    continue;
                }
                Err(e) => return Err(e),
            }
            self.sleeper.sleep(self.run_policy.interval).await;
        }
    }

    /// Fetches result data and server-generated reports of a finished run.
    async fn collect(&self, session: &Session, run: LoadTestRun) -> Result<LoadTestRun, LrcError> {
        if !run.has_report {
            tracing::info!("Test run has no report, skipping results");
            return Ok(run);
        }

        let accessor = TestRunAccessor::new(session);
        let transactions = accessor.get_transactions(run.id).await?;
        let run = run.with_transactions(transactions);
        let run = match accessor.get_results(run.id).await {
            Ok(results) => run.with_results(results),
            Err(e) => {
                tracing::warn!("Test run results are unavailable: {e}");
                run
            }
        };

        let acquisition = ReportAcquisition::new(
            session,
            &self.sleeper,
            self.report_policy.clone(),
            self.config.tenant_id.as_str(),
        );
        let (mut run, _) = acquisition
            .acquire(run, REQUESTED_REPORTS, self.options.skip_pdf_report)
            .await?;

        let ready: Vec<(String, u64)> = run
            .reports
            .iter()
            .map(|(file_name, id)| (file_name.clone(), *id))
            .collect();
        for (file_name, report_id) in ready {
            match session.get_report(report_id).await? {
                Some(content) => run = run.with_rendered(file_name, content),
                None => tracing::warn!(report_id, "Skipping download of {file_name}"),
            }
        }
        Ok(run)
    }

    /// Adds the XML summary and the transaction CSV.
    async fn render(&self, session: &Session, run: LoadTestRun) -> Result<LoadTestRun, LrcError> {
        let sla_text = if run.has_report
            && run.status == TestRunStatus::Failed
            && !run.transactions.is_empty()
        {
            Some(self.sla_text(session, &run).await?)
        } else {
            None
        };
        if !run.is_aborted() {
            tracing::info!("View report at: {}", xml::report_url(&self.config, run.id));
            tracing::info!("View dashboard at: {}", xml::dashboard_url(&self.config, run.id));
        }

        let tenant_id = &self.config.tenant_id;
        let summary = xml::render_run_summary(&self.config, &run, sla_text.as_deref());
        let transactions = csv::render_transactions(&run.transactions);
        let xml_name = report_file_name(tenant_id, run.id, ReportType::Xml);
        let csv_name = transactions_csv_file_name(tenant_id, run.id);
        Ok(run
            .with_rendered(xml_name, summary)
            .with_rendered(csv_name, transactions))
    }

    async fn sla_text(&self, session: &Session, run: &LoadTestRun) -> Result<String, LrcError> {
        let sla = LoadTestAccessor::new(session)
            .get_sla(run.load_test.id)
            .await?;
        let trt_summary = TestRunAccessor::new(session)
            .get_trt_summary(run.id)
            .await?;
        let text = sla::evaluate(
            sla.percentile,
            &sla.transactions,
            &run.transactions,
            &trt_summary,
        );
        if !text.is_empty() {
            tracing::info!("{text}");
        }
        Ok(text)
    }
}
