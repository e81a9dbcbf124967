//! Interactive heat map dashboard.
//!
//! Holds the selected neighborhood and month between actions. Data is
//! loaded once on start with no filters, then reloaded whenever filters
//! are applied or cleared.

use std::path::PathBuf;

use dialoguer::{Input, Select};
use via_segura_cli_utils::MultiProgress;
use via_segura_client::ApiClient;
use via_segura_client::config::ClientConfig;
use via_segura_heatmap_models::{
    ApiKeyUsage, ExportCriteria, FilterCriteria, MonthYear, NeighborhoodFilter,
};

use crate::commands;

/// Actions in the dashboard menu.
enum DashboardAction {
    ApplyFilters,
    ClearFilters,
    Refresh,
    Export,
    ApiKey,
    Quit,
}

impl DashboardAction {
    const ALL: &[Self] = &[
        Self::ApplyFilters,
        Self::ClearFilters,
        Self::Refresh,
        Self::Export,
        Self::ApiKey,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ApplyFilters => "Apply filters",
            Self::ClearFilters => "Clear filters",
            Self::Refresh => "Refresh data",
            Self::Export => "Export spreadsheet",
            Self::ApiKey => "Show API key usage",
            Self::Quit => "Quit",
        }
    }
}

/// Filter panel state.
#[derive(Debug, Default)]
struct Filters {
    neighborhood: NeighborhoodFilter,
    period: Option<MonthYear>,
}

impl Filters {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            neighborhood: self.neighborhood.clone(),
            ..FilterCriteria::default()
        }
        .with_period(self.period)
    }

    fn describe(&self) -> String {
        self.period.map_or_else(
            || format!("Neighborhood: {} | Period: all", self.neighborhood),
            |period| format!("Neighborhood: {} | Period: {period}", self.neighborhood),
        )
    }
}

/// Runs the interactive dashboard until the user quits.
///
/// # Errors
///
/// Returns an error if the session file cannot be read or a prompt fails.
pub async fn run(
    multi: &MultiProgress,
    config: &ClientConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = commands::client(config)?;

    println!("ViaSegura Heat Map");
    println!();

    let neighborhoods = commands::neighborhood_options(&client).await;
    let mut filters = Filters::default();

    commands::show_heatmap(multi, &client, &filters.criteria(), false).await?;

    let labels: Vec<&str> = DashboardAction::ALL
        .iter()
        .map(DashboardAction::label)
        .collect();

    loop {
        println!();
        println!("{}", filters.describe());

        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match DashboardAction::ALL[idx] {
            DashboardAction::ApplyFilters => {
                prompt_filters(&mut filters, &neighborhoods)?;
                commands::show_heatmap(multi, &client, &filters.criteria(), false).await?;
            }
            DashboardAction::ClearFilters => {
                filters = Filters::default();
                commands::show_heatmap(multi, &client, &filters.criteria(), false).await?;
            }
            DashboardAction::Refresh => {
                commands::show_heatmap(multi, &client, &filters.criteria(), false).await?;
            }
            DashboardAction::Export => handle_export(multi, &client, &filters).await?,
            DashboardAction::ApiKey => {
                print!("{}", commands::format_api_key(&ApiKeyUsage::mock()));
            }
            DashboardAction::Quit => break,
        }
    }

    Ok(())
}

/// Prompts for a neighborhood and a month.
fn prompt_filters(
    filters: &mut Filters,
    neighborhoods: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let current = filters.neighborhood.to_string();
    let default = neighborhoods
        .iter()
        .position(|name| *name == current)
        .unwrap_or(0);

    let idx = Select::new()
        .with_prompt("Neighborhood")
        .items(neighborhoods)
        .default(default)
        .interact()?;
    filters.neighborhood = NeighborhoodFilter::parse(&neighborhoods[idx]);

    let period: String = Input::new()
        .with_prompt("Month (MM/YYYY, empty for all)")
        .allow_empty(true)
        .with_initial_text(
            filters
                .period
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        )
        .interact_text()?;

    let period = period.trim();
    if period.is_empty() {
        filters.period = None;
    } else {
        match period.parse::<MonthYear>() {
            Ok(parsed) => filters.period = Some(parsed),
            Err(e) => log::warn!("{e}; keeping the previous month"),
        }
    }

    Ok(())
}

/// Exports the current filters into a chosen directory.
async fn handle_export(
    multi: &MultiProgress,
    client: &ApiClient,
    filters: &Filters,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir: String = Input::new()
        .with_prompt("Output directory")
        .default(".".to_string())
        .interact_text()?;

    let criteria = ExportCriteria::from(&filters.criteria());
    commands::export(multi, client, &criteria, &PathBuf::from(dir)).await;

    Ok(())
}
