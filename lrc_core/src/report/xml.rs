//! JUnit-style run summary consumed by CI test report publishers.

use std::fmt::Write;

use crate::config::ServerConfiguration;
use crate::model::LoadTestRun;

const SUITES_NAME: &str = "LoadRunner Cloud";

pub fn report_url(config: &ServerConfiguration, run_id: u64) -> String {
    run_overview_url(config, run_id, "report")
}

pub fn dashboard_url(config: &ServerConfiguration, run_id: u64) -> String {
    run_overview_url(config, run_id, "dashboard")
}

fn run_overview_url(config: &ServerConfiguration, run_id: u64, page: &str) -> String {
    format!(
        "{}/run-overview/{run_id}/{page}/?TENANTID={}&projectId={}",
        config.url, config.tenant_id, config.project_id
    )
}

pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn property(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(
        out,
        "      <property name=\"{name}\" value=\"{}\"/>",
        escape(value)
    );
}

/// Renders the summary of a finished run. Report and dashboard links are
/// left out for aborted runs; the SLA narrative is included when non-empty.
pub fn render_run_summary(
    config: &ServerConfiguration,
    run: &LoadTestRun,
    sla_text: Option<&str>,
) -> Vec<u8> {
    let failures = usize::from(!run.status.is_success());
    let sla_text = sla_text.filter(|text| !text.is_empty());

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<testsuites name=\"{SUITES_NAME}\" tests=\"1\" failures=\"{failures}\">"
    );
    let _ = writeln!(
        out,
        "  <testsuite name=\"{}\" id=\"{}\" tests=\"1\" failures=\"{failures}\" errors=\"0\">",
        escape(&run.load_test.name),
        run.load_test.id
    );

    out.push_str("    <properties>\n");
    property(&mut out, "runId", &run.id.to_string());
    property(&mut out, "testId", &run.load_test.id.to_string());
    property(&mut out, "projectId", &run.load_test.project_id.to_string());
    property(&mut out, "status", run.status.as_str());
    if let Some(detailed) = &run.detailed_status {
        property(&mut out, "detailedStatus", detailed);
    }
    if !run.is_aborted() {
        property(&mut out, "reportUrl", &report_url(config, run.id));
        property(&mut out, "dashboardUrl", &dashboard_url(config, run.id));
    }
    if let Some(results) = &run.results {
        if let Some(duration) = &results.duration {
            property(&mut out, "duration", duration);
        }
        if let Some(vusers) = results.total_vusers {
            property(&mut out, "totalVusers", &vusers.to_string());
        }
        if let Some(percentile) = results.percentile_value {
            property(&mut out, "percentile", &percentile.to_string());
        }
        if let Some(passed) = results.total_transactions_passed {
            property(&mut out, "totalTransactionsPassed", &passed.to_string());
        }
        if let Some(failed) = results.total_transactions_failed {
            property(&mut out, "totalTransactionsFailed", &failed.to_string());
        }
    }
    out.push_str("    </properties>\n");

    let _ = write!(
        out,
        "    <testcase classname=\"lrc.load_test_{}\" name=\"Run #{}\" status=\"{}\"",
        run.load_test.id,
        run.id,
        escape(run.status.as_str())
    );
    if run.status.is_success() && sla_text.is_none() {
        out.push_str("/>\n");
    } else {
        out.push_str(">\n");
        if !run.status.is_success() {
            let _ = writeln!(
                out,
                "      <failure type=\"{status}\" message=\"Test run #{} finished with status {status}\"/>",
                run.id,
                status = escape(run.status.as_str())
            );
        }
        if let Some(text) = sla_text {
            let _ = writeln!(out, "      <system-out>{}</system-out>", escape(text));
        }
        out.push_str("    </testcase>\n");
    }

    out.push_str("  </testsuite>\n");
    out.push_str("</testsuites>\n");
    out.into_bytes()
}
