//! Persisted login session.
//!
//! The login endpoint returns an access token, a refresh token and the
//! username. They are stored as a small TOML file so later invocations can
//! authenticate without logging in again.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Tokens returned by `POST auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Token used to obtain a new access token.
    #[serde(default)]
    pub refresh_token: String,
    /// Display name of the logged-in user.
    #[serde(default)]
    pub username: String,
}

impl Session {
    /// Whether the session holds a usable access token.
    ///
    /// The literal string `"undefined"` does not count as a token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let token = self.access_token.trim();
        !token.is_empty() && token != "undefined"
    }

    /// Reads the session at `path`. A missing file yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Option<Self>, ClientError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(toml::from_str(&text)?))
    }

    /// Writes the session to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string(self)?)?;
        log::debug!("Saved session for {} to {}", self.username, path.display());
        Ok(())
    }

    /// Deletes the session file. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the file exists but cannot be
    /// removed.
    pub fn clear(path: &Path) -> Result<bool, ClientError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
