use std::fmt;

use reqwest::RequestBuilder;
use reqwest::header::{AUTHORIZATION, COOKIE};
use serde::{Deserialize, Serialize};

use crate::config::server::{MASK_PREFIX_LEN, MASK_SUFFIX_LEN, mask_string};
use crate::rest::api_path;

const CLIENT_ID_MIN_LEN: usize = 42;
const CLIENT_ID_PREFIX: &str = "oauth2-";
const CLIENT_ID_SUFFIX: &str = "@microfocus.com";
const SESSION_COOKIE_NAME: &str = "LWSSO_COOKIE_KEY";

/// Returns true when `username` has the shape of an OAuth client id.
pub fn is_client_credential_id(username: &str) -> bool {
    username.len() >= CLIENT_ID_MIN_LEN
        && username.starts_with(CLIENT_ID_PREFIX)
        && username.ends_with(CLIENT_ID_SUFFIX)
}

/// How the session logs in. Chosen once from the configured username and
/// kept for the lifetime of the session, including re-authentication.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    ClientCredential {
        client_id: String,
        client_secret: String,
    },
    Interactive {
        user: String,
        password: String,
    },
}

impl AuthStrategy {
    pub fn select(username: &str, password: &str) -> Self {
        if is_client_credential_id(username) {
            AuthStrategy::ClientCredential {
                client_id: username.to_string(),
                client_secret: password.to_string(),
            }
        } else {
            AuthStrategy::Interactive {
                user: username.to_string(),
                password: password.to_string(),
            }
        }
    }

    pub fn login_path(&self) -> &'static str {
        match self {
            AuthStrategy::ClientCredential { .. } => api_path::AUTH_CLIENT_CREDENTIAL,
            AuthStrategy::Interactive { .. } => api_path::AUTH_INTERACTIVE,
        }
    }

    pub fn login_request(&self) -> LoginRequest<'_> {
        match self {
            AuthStrategy::ClientCredential {
                client_id,
                client_secret,
            } => LoginRequest::ClientCredential {
                client_id,
                client_secret,
            },
            AuthStrategy::Interactive { user, password } => {
                LoginRequest::Interactive { user, password }
            }
        }
    }

    /// Wraps the token returned by the login endpoint into the artifact
    /// this strategy produces.
    pub fn artifact(&self, token: String) -> AuthArtifact {
        match self {
            AuthStrategy::ClientCredential { .. } => AuthArtifact::Bearer(token),
            AuthStrategy::Interactive { .. } => AuthArtifact::SessionCookie(token),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::ClientCredential { .. } => "client credential",
            AuthStrategy::Interactive { .. } => "interactive",
        }
    }

    pub fn masked_identity(&self) -> String {
        let identity = match self {
            AuthStrategy::ClientCredential { client_id, .. } => client_id,
            AuthStrategy::Interactive { user, .. } => user,
        };
        mask_string(identity, MASK_PREFIX_LEN, MASK_SUFFIX_LEN)
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStrategy")
            .field("kind", &self.name())
            .field("identity", &self.masked_identity())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginRequest<'a> {
    ClientCredential {
        client_id: &'a str,
        client_secret: &'a str,
    },
    Interactive {
        user: &'a str,
        password: &'a str,
    },
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
}

/// The credential attached to every authenticated request.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthArtifact {
    Bearer(String),
    SessionCookie(String),
}

impl AuthArtifact {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            AuthArtifact::Bearer(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            AuthArtifact::SessionCookie(token) => {
                request.header(COOKIE, format!("{SESSION_COOKIE_NAME}={token}"))
            }
        }
    }

    pub fn is_bearer(&self) -> bool {
        matches!(self, AuthArtifact::Bearer(_))
    }
}

impl fmt::Debug for AuthArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthArtifact::Bearer(_) => write!(f, "Bearer(****)"),
            AuthArtifact::SessionCookie(_) => write!(f, "SessionCookie(****)"),
        }
    }
}
