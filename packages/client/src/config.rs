//! Client configuration from the environment.
//!
//! | Variable             | Default                     |
//! |----------------------|-----------------------------|
//! | `VIA_SEGURA_API_URL` | `http://localhost:8080`     |
//! | `VIA_SEGURA_SESSION` | `.via_segura/session.toml`  |
//! | `VIA_SEGURA_TOKEN`   | unset (use the session)     |

use std::path::PathBuf;

/// API base URL variable.
pub const API_URL_VAR: &str = "VIA_SEGURA_API_URL";
/// Session file path variable.
pub const SESSION_PATH_VAR: &str = "VIA_SEGURA_SESSION";
/// Access token override variable.
pub const TOKEN_VAR: &str = "VIA_SEGURA_TOKEN";

/// Base URL used when [`API_URL_VAR`] is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
/// Session path used when [`SESSION_PATH_VAR`] is unset.
pub const DEFAULT_SESSION_PATH: &str = ".via_segura/session.toml";

/// Where to reach the API and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL.
    pub base_url: String,
    /// Login session file.
    pub session_path: PathBuf,
    /// Access token that takes precedence over the session file.
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
            token: None,
        }
    }
}

impl ClientConfig {
    /// Reads the configuration from the environment, falling back to the
    /// defaults for unset or empty variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            base_url: var(API_URL_VAR).unwrap_or(defaults.base_url),
            session_path: var(SESSION_PATH_VAR).map_or(defaults.session_path, PathBuf::from),
            token: var(TOKEN_VAR),
        }
    }
}
