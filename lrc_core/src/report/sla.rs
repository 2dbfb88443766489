//! SLA breach narrative for failed runs.
//!
//! Three datasets are joined on (script id, transaction name): the SLA
//! configuration of the load test, the per-transaction results of the run
//! and the run's TRT summary. Records without a counterpart in the load
//! test configuration are left out of the analysis.

use std::collections::HashMap;

use crate::report::number::format_double;
use crate::rest::payload::{LoadTestTransaction, TestRunTransaction, TrtSummary};

/// Load test transactions by test script id, then by transaction name.
/// A later duplicate replaces an earlier one.
pub type ScriptTransactions<'a> = HashMap<u64, HashMap<&'a str, &'a LoadTestTransaction>>;

pub fn index_transactions(transactions: &[LoadTestTransaction]) -> ScriptTransactions<'_> {
    let mut index: ScriptTransactions<'_> = HashMap::new();
    for transaction in transactions {
        index
            .entry(transaction.test_script_id)
            .or_default()
            .insert(transaction.transaction_name.as_str(), transaction);
    }
    index
}

fn lookup<'a>(
    index: &ScriptTransactions<'a>,
    script_id: u64,
    name: &str,
) -> Option<&'a LoadTestTransaction> {
    index.get(&script_id)?.get(name).copied()
}

#[derive(Clone, Debug, PartialEq)]
pub struct PercentileTrtBreach {
    pub count: usize,
    pub worst_transaction: Option<String>,
    pub sla_threshold: f64,
    pub worst_breakers: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FailedTrxBreach {
    pub count: usize,
    pub worst_transaction: Option<String>,
    pub failed_trx_ratio: f64,
    pub worst_success_rate: f64,
}

/// A transaction breaches when the share of requests over its threshold
/// exceeds what the percentile allows.
pub fn is_percentile_breach(breakers: f64, percentile: u32) -> bool {
    breakers - (100.0 - f64::from(percentile)) > 0.0
}

pub fn percentile_trt_breach(
    percentile: u32,
    index: &ScriptTransactions<'_>,
    run_transactions: &[TestRunTransaction],
) -> PercentileTrtBreach {
    let mut breach = PercentileTrtBreach {
        count: 0,
        worst_transaction: None,
        sla_threshold: 0.0,
        worst_breakers: 0.0,
    };
    for transaction in run_transactions {
        let Some(configured) = lookup(index, transaction.load_test_script_id, &transaction.name)
        else {
            continue;
        };
        if !configured.enabled || !is_percentile_breach(transaction.breakers, percentile) {
            continue;
        }
        breach.count += 1;
        if transaction.breakers > breach.worst_breakers {
            breach.worst_transaction = Some(transaction.name.clone());
            breach.sla_threshold = transaction.sla_threshold;
            breach.worst_breakers = transaction.breakers;
        }
    }
    breach
}

pub fn failed_trx_breach(
    index: &ScriptTransactions<'_>,
    trt_summary: &[TrtSummary],
) -> FailedTrxBreach {
    let mut breach = FailedTrxBreach {
        count: 0,
        worst_transaction: None,
        failed_trx_ratio: 100.0,
        worst_success_rate: 100.0,
    };
    for summary in trt_summary {
        let Some(configured) = lookup(index, summary.load_test_script_id, &summary.name) else {
            continue;
        };
        if !configured.failed_trx_enabled {
            continue;
        }
        let deviation = 100.0 - summary.success_rate - configured.failed_trx_ratio;
        if deviation <= 0.0 {
            continue;
        }
        breach.count += 1;
        // Compared against the deviation of the current worst; the initial
        // ratio and rate of 100 make the first breach always win.
        if deviation > 100.0 - breach.failed_trx_ratio - breach.worst_success_rate {
            breach.worst_transaction = Some(summary.name.clone());
            breach.failed_trx_ratio = configured.failed_trx_ratio;
            breach.worst_success_rate = summary.success_rate;
        }
    }
    breach
}

/// Two decimals with trailing zeros and a dangling point removed.
pub fn format_percent(value: f64) -> String {
    let formatted = format!("{value:.2}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

pub fn render_sla_text(percentile: &PercentileTrtBreach, failed: &FailedTrxBreach) -> String {
    let mut text = String::new();
    if let Some(name) = &percentile.worst_transaction {
        text.push_str(&format!(
            "Percentile TRT (sec) SLA was breached by {} transactions. ",
            percentile.count
        ));
        text.push_str(&format!(
            "The worst transaction was \u{2018}{name}\u{2019} with {}% exceeding {} sec. ",
            format_percent(percentile.worst_breakers),
            format_double(percentile.sla_threshold)
        ));
    }
    if let Some(name) = &failed.worst_transaction {
        text.push_str(&format!(
            "Failed TRX (%) SLA was breached by {} transactions. ",
            failed.count
        ));
        text.push_str(&format!(
            "The worst transaction was \u{2018}{name}\u{2019} with a failure ratio of {}%. ",
            format_percent(100.0 - failed.worst_success_rate)
        ));
    }
    text
}

/// Builds the narrative from the three datasets. Empty when nothing breached.
pub fn evaluate(
    percentile: u32,
    load_test_transactions: &[LoadTestTransaction],
    run_transactions: &[TestRunTransaction],
    trt_summary: &[TrtSummary],
) -> String {
    let index = index_transactions(load_test_transactions);
    let percentile_breach = percentile_trt_breach(percentile, &index, run_transactions);
    let failed_breach = failed_trx_breach(&index, trt_summary);
    tracing::debug!(
        percentile_breaches = percentile_breach.count,
        failed_breaches = failed_breach.count,
        "Evaluated SLA"
    );
    render_sla_text(&percentile_breach, &failed_breach)
}
