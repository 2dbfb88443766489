//! Relative REST paths. The session joins them to the configured base URL.

pub const AUTH_INTERACTIVE: &str = "v1/auth";
pub const AUTH_CLIENT_CREDENTIAL: &str = "v1/auth-client";
pub const PROJECTS: &str = "v1/projects";

pub fn load_test(project_id: u64, test_id: u64) -> String {
    format!("v1/projects/{project_id}/load-tests/{test_id}")
}

pub fn start_run(project_id: u64, test_id: u64) -> String {
    format!("{}/runs", load_test(project_id, test_id))
}

pub fn run_status(project_id: u64, test_id: u64, run_id: u64) -> String {
    format!("{}/runs/{run_id}/status", load_test(project_id, test_id))
}

pub fn load_test_transactions(project_id: u64, test_id: u64) -> String {
    format!("{}/transactions", load_test(project_id, test_id))
}

pub fn load_test_percentile(project_id: u64, test_id: u64) -> String {
    format!("{}/percentile", load_test(project_id, test_id))
}

pub fn test_run(run_id: u64) -> String {
    format!("v1/test-runs/{run_id}")
}

pub fn change_run_status(run_id: u64) -> String {
    format!("{}/status", test_run(run_id))
}

pub fn run_results(run_id: u64) -> String {
    format!("{}/results", test_run(run_id))
}

pub fn run_transactions(run_id: u64) -> String {
    format!("{}/transactions", test_run(run_id))
}

pub fn run_trt_summary(run_id: u64) -> String {
    format!("{}/trt-summary", test_run(run_id))
}

pub fn request_report(project_id: u64, run_id: u64) -> String {
    format!("v1/projects/{project_id}/test-runs/{run_id}/reports")
}

pub fn report(report_id: u64) -> String {
    format!("v1/test-runs/reports/{report_id}")
}
