use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use snafu::ResultExt;

use crate::config::TestRunOptions;
use crate::error::{LrcError, OutputSnafu};
use crate::model::LoadTestRun;
use crate::report::run_result_file_name;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResult<'a> {
    test_options: &'a TestRunOptions,
    test_run: &'a LoadTestRun,
}

/// Writes every rendered or downloaded artifact of `run` into `dir`.
/// A file that cannot be written is logged and skipped.
pub fn write_artifacts(dir: &Path, run: &LoadTestRun) -> Vec<PathBuf> {
    let mut written = Vec::with_capacity(run.rendered.len());
    for (file_name, content) in &run.rendered {
        let path = dir.join(file_name);
        match fs::write(&path, content) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Report file created");
                written.push(path);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "Failed to create report file: {e}");
            }
        }
    }
    written
}

/// Writes the run state and options as JSON. Artifact bytes are not part
/// of the document.
pub fn write_run_result(
    dir: &Path,
    options: &TestRunOptions,
    run: &LoadTestRun,
) -> Result<PathBuf, LrcError> {
    let path = dir.join(run_result_file_name(run.id));
    let document = RunResult {
        test_options: options,
        test_run: run,
    };
    let json = serde_json::to_vec_pretty(&document)
        .map_err(std::io::Error::from)
        .context(OutputSnafu {
            path: path.display().to_string(),
        })?;
    fs::write(&path, json).context(OutputSnafu {
        path: path.display().to_string(),
    })?;
    tracing::info!(path = %path.display(), "Run result written");
    Ok(path)
}
