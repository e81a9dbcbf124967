//! Spreadsheet export.
//!
//! `GET heatmap/export` answers with a base64-encoded `.xls` file. The
//! backend has wrapped it differently over time (bare string, or an
//! object keyed by `data`, `base64`, `content` or `file`), so the payload
//! is probed in that order before giving up.
//!
//! The decoded file is written to a temporary name next to its final
//! location and renamed once complete, so a failed export never leaves a
//! partial report behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;
use serde_json::Value;
use strum::IntoEnumIterator as _;
use strum_macros::{AsRefStr, Display, EnumIter};
use via_segura_heatmap_models::{ExportCriteria, MonthYear};

use crate::query::build_export_query;

/// MIME type of the exported spreadsheet.
pub const EXPORT_MIME_TYPE: &str = "application/vnd.ms-excel";

/// File name used when no month/year filter is active.
pub const GENERAL_EXPORT_FILE_NAME: &str = "relatorio_sinistros_geral.xls";

/// Maximum number of payload characters included in log messages.
const PAYLOAD_PREVIEW_LEN: usize = 200;

/// Standard alphabet, padding optional.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors from the export pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The export request itself failed.
    #[error("Export request failed: {0}")]
    Request(Box<dyn std::error::Error + Send + Sync>),

    /// The response carried no base64 string.
    #[error("No base64 payload found in export response")]
    MissingPayload,

    /// The payload was not valid base64.
    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object keys that may hold the base64 payload, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PayloadField {
    /// `{ "data": "..." }`
    Data,
    /// `{ "base64": "..." }`
    Base64,
    /// `{ "content": "..." }`
    Content,
    /// `{ "file": "..." }`
    File,
}

/// Backend able to serve the export endpoint.
#[async_trait]
pub trait ExportSource: Send + Sync {
    /// Calls `GET heatmap/export?{query}` and returns the decoded JSON
    /// body. A body that is not JSON is returned as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    async fn fetch_export(
        &self,
        query: &str,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// A decoded export ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Target file name.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Locates the base64 string in an export response.
///
/// A bare JSON string is used as-is. For objects, the [`PayloadField`]
/// keys are tried in order, then the first string-valued field of any
/// name. Empty strings are skipped.
#[must_use]
pub fn extract_base64(payload: &Value) -> Option<&str> {
    match payload {
        Value::String(s) => Some(s.as_str()).filter(|s| !s.is_empty()),
        Value::Object(map) => PayloadField::iter()
            .find_map(|field| map.get(field.as_ref()).and_then(non_empty_str))
            .or_else(|| {
                log::debug!(
                    "Export response has no known payload field, trying any string field: {}",
                    preview(payload)
                );
                map.values().find_map(non_empty_str)
            }),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Removes a `data:<mime>;base64,` prefix if present.
#[must_use]
pub fn strip_data_uri(payload: &str) -> &str {
    let re = Regex::new(r"^data:.*,").unwrap_or_else(|_| unreachable!());
    re.find(payload)
        .map_or(payload, |prefix| &payload[prefix.end()..])
}

/// Decodes a base64 payload, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns [`ExportError::Decode`] if the payload is not valid base64.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, ExportError> {
    let cleaned: String = strip_data_uri(payload)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(BASE64.decode(cleaned)?)
}

/// Report file name: `relatorio_sinistros_MM-YYYY.xls` for a month filter,
/// [`GENERAL_EXPORT_FILE_NAME`] otherwise.
#[must_use]
pub fn export_file_name(period: Option<MonthYear>) -> String {
    period.map_or_else(
        || GENERAL_EXPORT_FILE_NAME.to_string(),
        |period| format!("relatorio_sinistros_{}.xls", period.file_label()),
    )
}

/// Turns an export response into a file.
///
/// # Errors
///
/// Returns [`ExportError::MissingPayload`] if no base64 string is found,
/// or [`ExportError::Decode`] if it does not decode.
pub fn prepare_export(
    payload: &Value,
    period: Option<MonthYear>,
) -> Result<ExportFile, ExportError> {
    let Some(encoded) = extract_base64(payload) else {
        log::error!(
            "Failed to find base64 string in export response: {}",
            preview(payload)
        );
        return Err(ExportError::MissingPayload);
    };

    Ok(ExportFile {
        file_name: export_file_name(period),
        mime_type: EXPORT_MIME_TYPE,
        bytes: decode_base64(encoded)?,
    })
}

/// Writes `file` into `dir`, creating the directory if needed.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the directory cannot be created or the
/// file cannot be written.
pub fn save_export(file: &ExportFile, dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;

    let target = dir.join(&file.file_name);
    let partial = dir.join(format!(".{}.part", file.file_name));

    if let Err(e) = std::fs::write(&partial, &file.bytes) {
        let _ = std::fs::remove_file(&partial);
        return Err(e.into());
    }
    std::fs::rename(&partial, &target)?;

    Ok(target)
}

/// Runs the whole export: builds the query, fetches the payload, decodes
/// it and saves it into `output_dir`.
///
/// The file name follows [`ExportCriteria::period`]. Concurrent calls are
/// not coordinated; callers disable their trigger while one is running.
///
/// # Errors
///
/// Returns an [`ExportError`] if any step fails. Nothing is written in
/// that case.
pub async fn export_and_download(
    source: &dyn ExportSource,
    criteria: &ExportCriteria,
    output_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let query = build_export_query(Some(criteria));
    log::debug!("Requesting export: {query}");

    let payload = source
        .fetch_export(&query)
        .await
        .map_err(ExportError::Request)?;

    let file = prepare_export(&payload, criteria.period())?;
    log::info!(
        "Decoded export {} ({} bytes, {})",
        file.file_name,
        file.bytes.len(),
        file.mime_type
    );

    save_export(&file, output_dir)
}

fn preview(payload: &Value) -> String {
    let text = payload.to_string();
    if text.len() > PAYLOAD_PREVIEW_LEN {
        let end = (0..=PAYLOAD_PREVIEW_LEN)
            .rev()
            .find(|i| text.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &text[..end])
    } else {
        text
    }
}
