use serde::{Deserialize, Deserializer, Serialize};

/// Reads `null` the same way as a missing field: as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestResponse {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunResponse {
    pub run_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusResponse {
    pub status: String,
    #[serde(default)]
    pub detailed_status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_report: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunResponse {
    pub test_id: u64,
    #[serde(flatten)]
    pub status: RunStatusResponse,
}

#[derive(Debug, Deserialize)]
pub struct PercentileResponse {
    pub percentile: u32,
}

/// SLA configuration of one transaction of a load test.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestTransaction {
    #[serde(default)]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default)]
    pub script_id: u64,
    pub test_script_id: u64,
    pub transaction_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sla_percentile_threshold: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stop_on_break: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub script_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed_trx_ratio: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed_trx_enabled: bool,
}

/// Measured results of one transaction within a run.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunTransaction {
    pub name: String,
    pub load_test_script_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub script_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub breakers: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sla_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sla_threshold: f64,
    #[serde(default)]
    pub sla_trend: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: u64,
    #[serde(rename = "avgTRT", default, deserialize_with = "null_as_default")]
    pub avg_trt: f64,
    #[serde(rename = "minTRT", default, deserialize_with = "null_as_default")]
    pub min_trt: f64,
    #[serde(rename = "maxTRT", default, deserialize_with = "null_as_default")]
    pub max_trt: f64,
    #[serde(rename = "percentileTRT", default, deserialize_with = "null_as_default")]
    pub percentile_trt: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub std_deviation: f64,
}

/// Aggregated response-time statistics of one transaction within a run.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrtSummary {
    pub name: String,
    pub load_test_script_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub script_name: String,
    #[serde(rename = "minTRT", default, deserialize_with = "null_as_default")]
    pub min_trt: f64,
    #[serde(rename = "avgTRT", default, deserialize_with = "null_as_default")]
    pub avg_trt: f64,
    #[serde(rename = "maxTRT", default, deserialize_with = "null_as_default")]
    pub max_trt: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success_rate: f64,
    #[serde(rename = "avgTPS", default, deserialize_with = "null_as_default")]
    pub avg_tps: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub std_deviation: f64,
}

/// Run-wide totals. Every field is optional since the server omits the
/// ones that do not apply to the run mode.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunResults {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub percentile_value: Option<u32>,
    #[serde(default)]
    pub total_vusers: Option<u64>,
    #[serde(default)]
    pub total_transactions_passed: Option<u64>,
    #[serde(default)]
    pub total_transactions_failed: Option<u64>,
    #[serde(default)]
    pub failed_vusers: Option<u64>,
    #[serde(default)]
    pub script_errors: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest<'a> {
    pub report_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequestResponse {
    pub report_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReportStatusMessage {
    #[serde(default)]
    pub message: Option<String>,
}
