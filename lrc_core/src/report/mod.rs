pub mod acquisition;
pub mod csv;
pub mod number;
pub mod output;
pub mod sla;
pub mod xml;

use std::fmt;

pub use acquisition::{
    NoDelay, ReportAcquisition, ReportEndpoint, ReportOutcome, ReportCheck, ReportState, Sleeper,
    TokioSleeper,
};

/// Kinds of report artifacts. CSV and PDF are generated by the server,
/// XML is rendered locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportType {
    Csv,
    Pdf,
    Xml,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Csv => "csv",
            ReportType::Pdf => "pdf",
            ReportType::Xml => "xml",
        }
    }

    /// Server-generated types allowed under the given options.
    pub fn permitted(skip_pdf_report: bool) -> &'static [ReportType] {
        if skip_pdf_report {
            &[ReportType::Csv]
        } else {
            &[ReportType::Csv, ReportType::Pdf]
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn report_file_name(tenant_id: &str, run_id: u64, report_type: ReportType) -> String {
    format!("lrc_report_{tenant_id}-{run_id}.{report_type}")
}

pub fn transactions_csv_file_name(tenant_id: &str, run_id: u64) -> String {
    format!("lrc_report_trans_{tenant_id}-{run_id}.csv")
}

pub fn run_result_file_name(run_id: u64) -> String {
    format!("lrc_run_result_{run_id}.json")
}
