use std::fmt;

use crate::config::settings::Settings;
use crate::config::{ConfigError, InvalidParameterValueSnafu, MissingParameterSnafu, keys};
use snafu::OptionExt;
use url::Url;

const MAX_URL_LEN: usize = 80;
const MAX_TENANT_LEN: usize = 20;
const DEFAULT_PROXY_PORT: u16 = 80;

pub const MASK_PREFIX_LEN: usize = 4;
pub const MASK_SUFFIX_LEN: usize = 4;

/// Connection parameters for one tenant/project. Immutable once built.
#[derive(Clone)]
pub struct ServerConfiguration {
    pub url: String,
    pub tenant_id: String,
    pub project_id: u64,
    pub username: String,
    pub password: String,
    pub proxy: Option<ProxyConfiguration>,
}

#[derive(Clone)]
pub struct ProxyConfiguration {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfiguration {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ServerConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfiguration")
            .field("url", &self.url)
            .field("tenant_id", &self.tenant_id)
            .field("project_id", &self.project_id)
            .field("username", &mask_string(&self.username, MASK_PREFIX_LEN, MASK_SUFFIX_LEN))
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for ProxyConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfiguration")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl ServerConfiguration {
    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        let url = get_server_url(settings)?;
        let tenant_id = settings
            .get_string(keys::TENANT_ID)
            .context(MissingParameterSnafu {
                parameter: keys::TENANT_ID,
            })?;
        if !is_valid_tenant(&tenant_id) {
            return InvalidParameterValueSnafu {
                parameter: keys::TENANT_ID,
                value: tenant_id,
                explanation: format!("Tenant id must be at most {MAX_TENANT_LEN} characters"),
            }
            .fail();
        }

        Ok(Self {
            url,
            tenant_id,
            project_id: get_positive_id(settings, keys::PROJECT_ID)?,
            username: settings
                .get_string(keys::USERNAME)
                .context(MissingParameterSnafu {
                    parameter: keys::USERNAME,
                })?,
            password: settings
                .get_string(keys::PASSWORD)
                .context(MissingParameterSnafu {
                    parameter: keys::PASSWORD,
                })?,
            proxy: ProxyConfiguration::from_settings(settings)?,
        })
    }
}

impl ProxyConfiguration {
    fn from_settings(settings: &dyn Settings) -> Result<Option<Self>, ConfigError> {
        let Some(host) = settings.get_string(keys::PROXY_HOST) else {
            return Ok(None);
        };
        let port = match settings.get(keys::PROXY_PORT) {
            None => DEFAULT_PROXY_PORT,
            Some(_) => settings
                .get_int(keys::PROXY_PORT)
                .and_then(|port| u16::try_from(port).ok())
                .context(InvalidParameterValueSnafu {
                    parameter: keys::PROXY_PORT,
                    value: format!("{:?}", settings.get(keys::PROXY_PORT)),
                    explanation: "Proxy port must be a number between 0 and 65535",
                })?,
        };
        Ok(Some(Self {
            host,
            port,
            username: settings.get_string(keys::PROXY_USERNAME),
            password: settings.get_string(keys::PROXY_PASSWORD),
        }))
    }
}

fn get_server_url(settings: &dyn Settings) -> Result<String, ConfigError> {
    let raw = settings
        .get_string(keys::URL)
        .context(MissingParameterSnafu {
            parameter: keys::URL,
        })?;
    let url = raw.trim_end_matches('/').to_string();
    if !is_valid_server_url(&url) {
        return InvalidParameterValueSnafu {
            parameter: keys::URL,
            value: raw,
            explanation: format!("Expected an http(s) URL of at most {MAX_URL_LEN} characters"),
        }
        .fail();
    }
    Ok(url)
}

pub(crate) fn get_positive_id(settings: &dyn Settings, key: &str) -> Result<u64, ConfigError> {
    if settings.get(key).is_none() {
        return MissingParameterSnafu { parameter: key }.fail();
    }
    settings
        .get_int(key)
        .filter(|id| *id > 0)
        .and_then(|id| u64::try_from(id).ok())
        .context(InvalidParameterValueSnafu {
            parameter: key,
            value: format!("{:?}", settings.get(key)),
            explanation: "Expected a positive integer",
        })
}

pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub fn is_valid_server_url(url: &str) -> bool {
    is_valid_url(url) && url.len() <= MAX_URL_LEN
}

pub fn is_valid_tenant(tenant: &str) -> bool {
    !tenant.trim().is_empty() && tenant.len() <= MAX_TENANT_LEN
}

/// Replaces everything between the first `prefix_len` and the last
/// `suffix_len` characters with `*`. Short values are returned untouched.
pub fn mask_string(value: &str, prefix_len: usize, suffix_len: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if value.trim().is_empty() || len <= prefix_len + suffix_len {
        return value.to_string();
    }
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i >= prefix_len && i < len - suffix_len {
                '*'
            } else {
                *c
            }
        })
        .collect()
}
