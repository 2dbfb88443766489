use crate::report::number::{format_double, format_optional_double};
use crate::rest::payload::TestRunTransaction;

pub const HEADER: &str = "Script Name, Transaction, %Breakers, SLA Status, AVG Duration, Min, Max, STD. Deviation, Passed, Failed, Percentile, SLA Threshold, Percentile Trend";
const SEPARATOR: &str = ", ";

/// One row per transaction. Values are not quoted, so a comma inside a
/// script or transaction name shifts the remaining columns.
pub fn render_transactions(transactions: &[TestRunTransaction]) -> Vec<u8> {
    let mut out = String::with_capacity(HEADER.len() + 1 + transactions.len() * 128);
    out.push_str(HEADER);
    out.push('\n');
    for tx in transactions {
        let row = [
            tx.script_name.clone(),
            tx.name.clone(),
            format_double(tx.breakers),
            tx.sla_status.clone(),
            format_double(tx.avg_trt),
            format_double(tx.min_trt),
            format_double(tx.max_trt),
            format_double(tx.std_deviation),
            tx.passed.to_string(),
            tx.failed.to_string(),
            format_double(tx.percentile_trt),
            format_double(tx.sla_threshold),
            format_optional_double(tx.sla_trend),
        ];
        out.push_str(&row.join(SEPARATOR));
        out.push('\n');
    }
    out.into_bytes()
}
