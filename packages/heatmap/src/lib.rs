#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Heat map pipeline for ViaSegura incident data.
//!
//! 1. [`query`] turns filter criteria into the query strings sent to
//!    `GET heatmap` and `GET heatmap/export`.
//! 2. [`normalize`] flattens a [`HeatmapResponse`] into
//!    `[latitude, longitude, intensity]` points for the map layer.
//! 3. [`summary`] computes the summary panel statistics.
//! 4. [`export`] fetches the base64 spreadsheet export, decodes it, and
//!    saves it under the conventional report file name.
//!
//! [`HeatmapResponse`]: via_segura_heatmap_models::HeatmapResponse

pub mod export;
pub mod normalize;
pub mod query;
pub mod summary;

pub use export::{ExportError, ExportSource, export_and_download};
pub use normalize::normalize;
pub use query::{build_export_query, build_heatmap_query};
pub use summary::summarize;
