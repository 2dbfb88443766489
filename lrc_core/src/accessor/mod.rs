pub mod test_run;

pub use load_test::LoadTestAccessor;
pub use test_run::TestRunAccessor;

use reqwest::StatusCode;

use crate::error::{FetchSnafu, LrcError, UnauthorizedSnafu};
use crate::rest::ApiResponse;

/// Fails with `Fetch` unless the response is a 200.
#[track_caller]
fn expect_ok(response: &ApiResponse, what: &str) -> Result<(), LrcError> {
    if response.is_ok() {
        return Ok(());
    }
    tracing::error!(
        status = %response.status,
        body = %response.body_excerpt(),
        "Failed to fetch {what}"
    );
    FetchSnafu {
        what,
        status: response.status,
        body: response.body_excerpt(),
    }
    .fail()
}

/// Like [`expect_ok`] but reports a 401 as `Unauthorized` so the caller can
/// re-authenticate.
#[track_caller]
fn expect_authorized(response: &ApiResponse, what: &str, path: &str) -> Result<(), LrcError> {
    if response.status == StatusCode::UNAUTHORIZED {
        tracing::warn!(path, "Unauthorized while fetching {what}");
        return UnauthorizedSnafu { path }.fail();
    }
    expect_ok(response, what)
}
