use serde::Serialize;

use crate::config::server::get_positive_id;
use crate::config::settings::{Settings, is_enabled_flag};
use crate::config::{ConfigError, keys};

/// Per-invocation options of a CI step.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunOptions {
    pub test_id: u64,
    pub send_email: bool,
    pub skip_pdf_report: bool,
    pub debug: bool,
    pub test_mode: bool,
}

impl TestRunOptions {
    pub fn new(test_id: u64, send_email: bool) -> Self {
        Self {
            test_id,
            send_email,
            skip_pdf_report: false,
            debug: false,
            test_mode: false,
        }
    }

    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            test_id: get_positive_id(settings, keys::TEST_ID)?,
            send_email: settings.get_bool(keys::SEND_EMAIL).unwrap_or(false),
            skip_pdf_report: settings.get_bool(keys::SKIP_PDF_REPORT).unwrap_or(false),
            debug: settings.get_bool(keys::DEBUG).unwrap_or(false),
            test_mode: settings.get_bool(keys::TEST_MODE).unwrap_or(false),
        })
    }
}

/// Environment variables that replace configured values.
const VALUE_OVERRIDES: &[(&str, &str)] = &[
    ("LRC_URL", keys::URL),
    ("LRC_TENANT_ID", keys::TENANT_ID),
    ("LRC_USERNAME", keys::USERNAME),
    ("LRC_PASSWORD", keys::PASSWORD),
    ("LRC_PROJECT_ID", keys::PROJECT_ID),
    ("LRC_TEST_ID", keys::TEST_ID),
];

/// Environment variables that can only switch an option on.
const FLAG_OVERRIDES: &[(&str, &str)] = &[
    ("LRC_SKIP_PDF_REPORT", keys::SKIP_PDF_REPORT),
    ("LRC_DEBUG_LOG", keys::DEBUG),
];

/// Applies `LRC_*` overrides to `settings`. Returns the names of the
/// variables that took effect so the caller can log them.
pub fn apply_env_overrides<I, K, V>(settings: &mut dyn Settings, vars: I) -> Vec<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut applied = Vec::new();
    for (name, value) in vars {
        let (name, value) = (name.as_ref(), value.as_ref());
        if let Some((_, key)) = VALUE_OVERRIDES.iter().find(|(var, _)| *var == name) {
            if !value.trim().is_empty() {
                settings.set_string(key, value.trim());
                applied.push(name.to_string());
            }
        } else if let Some((_, key)) = FLAG_OVERRIDES.iter().find(|(var, _)| *var == name)
            && is_enabled_flag(value)
        {
            settings.set_bool(key, true);
            applied.push(name.to_string());
        }
    }
    applied.sort();
    applied
}
