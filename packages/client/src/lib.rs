#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! REST client for the ViaSegura incident API.
//!
//! Wraps the endpoints the heat map front-end consumes:
//!
//! - `GET heatmap` and `GET heatmap/export` (filtered incident data)
//! - `GET h3_grid/neighborhoods` (neighborhood picker options)
//! - `POST usuarios` and `POST auth/login` (account creation and login)
//!
//! Authenticated calls send `Authorization: Bearer <token>`, with the token
//! taken from the [`session`] file or the `VIA_SEGURA_TOKEN` environment
//! variable (see [`config`]).

pub mod auth;
pub mod config;
pub mod session;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use via_segura_heatmap::build_heatmap_query;
use via_segura_heatmap::export::ExportSource;
use via_segura_heatmap_models::{FilterCriteria, HeatmapResponse};

use crate::auth::{CredentialError, LoginCredentials, Registration};
use crate::config::ClientConfig;
use crate::session::Session;

/// Endpoint paths, relative to the API base URL.
pub mod endpoints {
    /// Filtered heat map data.
    pub const HEATMAP: &str = "heatmap";
    /// Base64 spreadsheet export of the filtered data.
    pub const HEATMAP_EXPORT: &str = "heatmap/export";
    /// Neighborhood names.
    pub const NEIGHBORHOODS: &str = "h3_grid/neighborhoods";
    /// Account creation.
    pub const REGISTER: &str = "usuarios";
    /// Login.
    pub const LOGIN: &str = "auth/login";
}

/// Errors from API client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (session file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file could not be parsed.
    #[error("Invalid session file: {0}")]
    SessionParse(#[from] toml::de::Error),

    /// Session could not be serialized.
    #[error("Failed to serialize session: {0}")]
    SessionWrite(#[from] toml::ser::Error),

    /// The server answered with an unexpected status.
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Requested URL.
        url: String,
    },

    /// Credentials failed local validation.
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Client for the ViaSegura API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates an unauthenticated client for `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Creates a client from configuration, authenticating with the
    /// configured token or, failing that, the stored session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the session file exists but cannot be
    /// read or parsed.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let token = match &config.token {
            Some(token) => Some(token.clone()),
            None => Session::load(&config.session_path)?
                .filter(Session::is_authenticated)
                .map(|session| session.access_token),
        };

        if token.is_none() {
            log::debug!("No access token available, requests will be unauthenticated");
        }

        Ok(Self::new(config.base_url.clone()).with_token(token))
    }

    /// Replaces the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Whether a bearer token is attached to requests.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// API base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path`, with `query` appended when non-empty.
    #[must_use]
    pub fn url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/{path}", self.base_url)
        } else {
            format!("{}/{path}?{query}", self.base_url)
        }
    }

    fn authorized_get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(url).header(CONTENT_TYPE, "application/json");
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    /// Fetches heat map data for `criteria`.
    ///
    /// Never fails: transport errors, non-success statuses and bodies that
    /// do not decode all yield [`HeatmapResponse::empty`], with a warning
    /// logged.
    pub async fn fetch_heatmap(&self, criteria: Option<&FilterCriteria>) -> HeatmapResponse {
        let url = self.url(endpoints::HEATMAP, &build_heatmap_query(criteria));
        log::debug!("GET {url}");

        let response = match self.authorized_get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Heatmap request failed: {e}");
                return HeatmapResponse::empty();
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::warn!("Heatmap request returned {status} for {url}");
            return HeatmapResponse::empty();
        }

        match response.json::<HeatmapResponse>().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Failed to decode heatmap response from {url}: {e}");
                HeatmapResponse::empty()
            }
        }
    }

    /// Fetches neighborhood names.
    ///
    /// A body that is not a JSON array yields an empty list; non-string
    /// entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the body is not
    /// JSON.
    pub async fn fetch_neighborhoods(&self) -> Result<Vec<String>, ClientError> {
        let url = self.url(endpoints::NEIGHBORHOODS, "");
        log::debug!("GET {url}");

        let body: serde_json::Value = self.authorized_get(&url).send().await?.json().await?;

        let Some(items) = body.as_array() else {
            log::warn!("Neighborhood response is not an array: {body}");
            return Ok(Vec::new());
        };

        Ok(items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect())
    }

    /// Calls `GET heatmap/export?{query}`.
    ///
    /// The body is decoded as JSON when possible; otherwise its trimmed
    /// text is returned as a JSON string (some deployments answer with the
    /// bare base64 text).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for a non-success status, or
    /// [`ClientError::Http`] if the request fails.
    pub async fn fetch_export_payload(
        &self,
        query: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let url = self.url(endpoints::HEATMAP_EXPORT, query);
        log::debug!("GET {url}");

        let response = self.authorized_get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status, url });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::Value::String(text.trim().to_string())))
    }

    /// Creates an account.
    ///
    /// Returns `true` only when the server answers `201 Created`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Credentials`] if the registration fails
    /// local validation, or [`ClientError::Http`] if the request fails.
    pub async fn register(&self, registration: &Registration) -> Result<bool, ClientError> {
        registration.validate()?;

        let url = self.url(endpoints::REGISTER, "");
        log::debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .json(&registration.to_request())
            .send()
            .await?;

        let created = response.status() == StatusCode::CREATED;
        if !created {
            log::warn!("Registration rejected with status {}", response.status());
        }
        Ok(created)
    }

    /// Logs in.
    ///
    /// Returns the new [`Session`] when the server answers `200 OK`, or
    /// `None` for any other status.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Credentials`] if the credentials fail local
    /// validation, or [`ClientError`] if the request fails or a `200`
    /// body does not decode.
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<Session>, ClientError> {
        credentials.validate()?;

        let url = self.url(endpoints::LOGIN, "");
        log::debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .json(&credentials.to_request())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            log::warn!("Login rejected with status {}", response.status());
            return Ok(None);
        }

        Ok(Some(response.json::<Session>().await?))
    }
}

#[async_trait]
impl ExportSource for ApiClient {
    async fn fetch_export(
        &self,
        query: &str,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.fetch_export_payload(query).await?)
    }
}
