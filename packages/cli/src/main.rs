#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front-end for the ViaSegura incident heat map.
//!
//! ```text
//! via_segura heatmap [--neighborhood N] [--period MM/YYYY] [--points]
//! via_segura neighborhoods
//! via_segura export [--neighborhood N] [--period MM/YYYY] [--output-dir D]
//! via_segura login --email E [--password P]
//! via_segura logout
//! via_segura register --name N --email E [--password P]
//! via_segura api-key
//! ```
//!
//! Running `via_segura` with no subcommand enters interactive mode, which
//! keeps the selected filters between actions.
//!
//! The API base URL, session file and token come from `VIA_SEGURA_API_URL`,
//! `VIA_SEGURA_SESSION` and `VIA_SEGURA_TOKEN`.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::Password;
use via_segura_client::auth::{LoginCredentials, Registration};
use via_segura_client::config::ClientConfig;
use via_segura_client::session::Session;
use via_segura_heatmap_models::{
    ApiKeyUsage, ExportCriteria, FilterCriteria, MonthYear, NeighborhoodFilter,
};

#[derive(Parser)]
#[command(
    name = "via_segura",
    about = "Query, summarize and export ViaSegura incident heat map data"
)]
struct Cli {
    /// API base URL (overrides `VIA_SEGURA_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch heat map data and print summary statistics
    Heatmap {
        /// Neighborhood name (`All` for every neighborhood)
        #[arg(long)]
        neighborhood: Option<String>,
        /// Month to filter by, e.g. 06/2023
        #[arg(long)]
        period: Option<MonthYear>,
        /// Page number (zero-based)
        #[arg(long)]
        page: Option<u32>,
        /// Records per page
        #[arg(long)]
        page_size: Option<u32>,
        /// H3 cell index
        #[arg(long)]
        h3_cell: Option<String>,
        /// Number of casualties
        #[arg(long)]
        num_casualties: Option<u32>,
        /// Also print the normalized `[lat, lng, intensity]` points as JSON
        #[arg(long)]
        points: bool,
    },
    /// List neighborhood filter options
    Neighborhoods,
    /// Download the filtered incidents as a spreadsheet
    Export {
        /// Neighborhood name (`All` for every neighborhood)
        #[arg(long)]
        neighborhood: Option<String>,
        /// Month to filter by, e.g. 06/2023
        #[arg(long)]
        period: Option<MonthYear>,
        /// Directory to save the file in
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Log in and store the session
    Login {
        /// Account e-mail
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Remove the stored session
    Logout,
    /// Create an account
    Register {
        /// Display name
        #[arg(long)]
        name: String,
        /// Account e-mail
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Show API key usage
    ApiKey,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = via_segura_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.base_url = api_url;
    }

    let Some(command) = cli.command else {
        return interactive::run(&multi, &config).await;
    };

    match command {
        Commands::Heatmap {
            neighborhood,
            period,
            page,
            page_size,
            h3_cell,
            num_casualties,
            points,
        } => {
            let criteria = FilterCriteria {
                neighborhood: neighborhood
                    .as_deref()
                    .map(NeighborhoodFilter::parse)
                    .unwrap_or_default(),
                h3_cell,
                num_casualties,
                page,
                page_size,
                ..FilterCriteria::default()
            }
            .with_period(period);

            let client = commands::client(&config)?;
            commands::show_heatmap(&multi, &client, &criteria, points).await?;
        }
        Commands::Neighborhoods => {
            let client = commands::client(&config)?;
            for name in commands::neighborhood_options(&client).await {
                println!("{name}");
            }
        }
        Commands::Export {
            neighborhood,
            period,
            output_dir,
        } => {
            let criteria = ExportCriteria::from(
                &FilterCriteria {
                    neighborhood: neighborhood
                        .as_deref()
                        .map(NeighborhoodFilter::parse)
                        .unwrap_or_default(),
                    ..FilterCriteria::default()
                }
                .with_period(period),
            );

            let client = commands::client(&config)?;
            if commands::export(&multi, &client, &criteria, &output_dir)
                .await
                .is_none()
            {
                std::process::exit(1);
            }
        }
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => Password::new().with_prompt("Password").interact()?,
            };

            let credentials = LoginCredentials { email, password };
            if !commands::login(&config, &credentials).await? {
                std::process::exit(1);
            }
        }
        Commands::Logout => {
            if Session::clear(&config.session_path)? {
                println!("Logged out.");
            } else {
                println!("No active session.");
            }
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()?,
            };

            let registration = Registration {
                name,
                email,
                password,
            };
            if !commands::register(&config, &registration).await? {
                std::process::exit(1);
            }
        }
        Commands::ApiKey => {
            print!("{}", commands::format_api_key(&ApiKeyUsage::mock()));
        }
    }

    Ok(())
}
