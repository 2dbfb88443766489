pub mod run;

pub use run::{LoadTest, LoadTestRun, LoadTestSla, StatusUpdate, TestRunStatus};
