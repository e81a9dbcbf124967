//! Actions shared by the subcommands and the interactive menu.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use via_segura_cli_utils::{MultiProgress, Spinner};
use via_segura_client::auth::{LoginCredentials, Registration};
use via_segura_client::config::ClientConfig;
use via_segura_client::{ApiClient, ClientError};
use via_segura_heatmap::{export_and_download, normalize, summarize};
use via_segura_heatmap_models::{
    ApiKeyUsage, ExportCriteria, FilterCriteria, IGNORED_NEIGHBORHOOD, SummaryStats,
};

/// Builds an API client, authenticated from the environment or the stored
/// session.
///
/// # Errors
///
/// Returns [`ClientError`] if the session file cannot be read.
pub fn client(config: &ClientConfig) -> Result<ApiClient, ClientError> {
    let client = ApiClient::from_config(config)?;
    if !client.is_authenticated() {
        log::warn!("Not logged in; run `via_segura login` first");
    }
    Ok(client)
}

/// Fetches heat map data for `criteria` and prints the summary panel.
///
/// # Errors
///
/// Returns an error if the points cannot be serialized.
pub async fn show_heatmap(
    multi: &MultiProgress,
    client: &ApiClient,
    criteria: &FilterCriteria,
    print_points: bool,
) -> Result<(), serde_json::Error> {
    let spinner = Spinner::start(multi, "Loading heat map data...");
    let response = client.fetch_heatmap(Some(criteria)).await;
    spinner.clear();

    let points = normalize(&response);
    print!("{}", format_summary(&summarize(&response)));
    println!("Map points:         {}", points.len());

    if print_points {
        println!("{}", serde_json::to_string_pretty(&points)?);
    }

    Ok(())
}

/// Formats the summary panel.
#[must_use]
pub fn format_summary(stats: &SummaryStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total incidents:    {}", stats.total_incidents);
    let _ = writeln!(out, "Affected regions:   {}", stats.affected_regions);
    let _ = writeln!(out, "Most critical area: {}", stats.top_region);
    out
}

/// Neighborhood picker options: [`IGNORED_NEIGHBORHOOD`] followed by the
/// names the API returns. A failed request leaves only the first option.
pub async fn neighborhood_options(client: &ApiClient) -> Vec<String> {
    let names = match client.fetch_neighborhoods().await {
        Ok(names) => names,
        Err(e) => {
            log::error!("Error loading neighborhoods list: {e}");
            Vec::new()
        }
    };
    with_all_option(names)
}

fn with_all_option(names: Vec<String>) -> Vec<String> {
    std::iter::once(IGNORED_NEIGHBORHOOD.to_string())
        .chain(names)
        .collect()
}

/// Runs the export pipeline behind a spinner.
///
/// Failures are logged and yield `None`; the caller stays usable.
pub async fn export(
    multi: &MultiProgress,
    client: &ApiClient,
    criteria: &ExportCriteria,
    output_dir: &Path,
) -> Option<PathBuf> {
    let spinner = Spinner::start(multi, "Exporting...");

    match export_and_download(client, criteria, output_dir).await {
        Ok(path) => {
            spinner.finish(&format!("Saved {}", path.display()));
            Some(path)
        }
        Err(e) => {
            spinner.clear();
            log::error!("Export failed: {e}");
            None
        }
    }
}

/// Logs in and stores the session. Returns whether login succeeded.
///
/// # Errors
///
/// Returns [`ClientError`] if the request fails or the session cannot be
/// saved.
pub async fn login(
    config: &ClientConfig,
    credentials: &LoginCredentials,
) -> Result<bool, ClientError> {
    let api = ApiClient::new(config.base_url.clone());

    let session = match api.login(credentials).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            eprintln!("Login failed: invalid e-mail or password.");
            return Ok(false);
        }
        Err(ClientError::Credentials(e)) => {
            eprintln!("{e}");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    session.save(&config.session_path)?;
    println!("Logged in as {}.", session.username);
    Ok(true)
}

/// Creates an account. Returns whether the server accepted it.
///
/// # Errors
///
/// Returns [`ClientError`] if the request fails.
pub async fn register(
    config: &ClientConfig,
    registration: &Registration,
) -> Result<bool, ClientError> {
    let api = ApiClient::new(config.base_url.clone());

    match api.register(registration).await {
        Ok(true) => {
            println!("Account created. You can now log in.");
            Ok(true)
        }
        Ok(false) => {
            eprintln!("Registration failed.");
            Ok(false)
        }
        Err(ClientError::Credentials(e)) => {
            eprintln!("{e}");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Formats the API key dashboard.
#[must_use]
pub fn format_api_key(usage: &ApiKeyUsage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "API key:   {}", usage.api_key);
    let _ = writeln!(
        out,
        "Usage:     {}/{} requests ({:.0}%)",
        usage.current,
        usage.limit,
        usage.progress_percentage()
    );
    let _ = writeln!(out, "Remaining: {}", usage.remaining());
    if usage.is_near_limit() {
        let _ = writeln!(
            out,
            "You are close to your request limit. Consider upgrading your plan."
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_option_comes_first() {
        assert_eq!(
            with_all_option(vec!["Centro".to_string(), "Boa Viagem".to_string()]),
            vec!["All", "Centro", "Boa Viagem"]
        );
        assert_eq!(with_all_option(Vec::new()), vec!["All"]);
    }

    #[test]
    fn formats_summary() {
        let stats = SummaryStats {
            total_incidents: 57,
            affected_regions: 2,
            top_region: "Boa Viagem".to_string(),
        };
        assert_eq!(
            format_summary(&stats),
            "Total incidents:    57\nAffected regions:   2\nMost critical area: Boa Viagem\n"
        );
    }

    #[test]
    fn api_key_dashboard_warns_near_limit() {
        let mock = format_api_key(&ApiKeyUsage::mock());
        assert!(mock.contains("22/50 requests (44%)"));
        assert!(mock.contains("Remaining: 28"));
        assert!(!mock.contains("close to your request limit"));

        let busy = format_api_key(&ApiKeyUsage {
            current: 45,
            ..ApiKeyUsage::mock()
        });
        assert!(busy.contains("close to your request limit"));
    }
}
