//! CLI entry point for the noise dashboard.
//!
//! Provides subcommands for the current-month overview, the before/during/after
//! comparison, station-wise levels, violation analysis and the full report.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use noise_dashboard::cache::load_cached;
use noise_dashboard::config::DataConfig;
use noise_dashboard::dashboard::{DEFAULT_MONTH, DashboardParams, DashboardView, render};
use noise_dashboard::loader::Dataset;
use noise_dashboard::output::{Section, render_text, to_json, write_violation_report};
use noise_dashboard::periods::PeriodBounds;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "noise_dashboard")]
#[command(about = "Explore urban noise readings against regulatory limits", long_about = None)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Directory containing the input CSV files (env: NOISE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Station metadata file, relative to the data directory (env: NOISE_STATIONS_FILE)
    #[arg(long, global = true)]
    stations: Option<PathBuf>,

    /// Monthly readings file, relative to the data directory (env: NOISE_READINGS_FILE)
    #[arg(long, global = true)]
    readings: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Args)]
struct QueryArgs {
    /// City to analyze (defaults to the first city alphabetically)
    #[arg(short, long)]
    city: Option<String>,

    /// Selected month, 1-12
    #[arg(short, long, default_value_t = DEFAULT_MONTH)]
    month: u8,

    /// Zone type to include; repeat for several (defaults to all)
    #[arg(short = 't', long = "zone-type")]
    zone_types: Vec<String>,

    /// First month of the before period
    #[arg(long)]
    before_start: Option<u8>,

    /// Last month of the before period
    #[arg(long)]
    before_end: Option<u8>,

    /// First month of the after period
    #[arg(long)]
    after_start: Option<u8>,

    /// Last month of the after period
    #[arg(long)]
    after_end: Option<u8>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Subcommand)]
enum Commands {
    /// Current-month averages, zone distribution and yearly trend
    Overview(QueryArgs),
    /// Before / selected / after period comparison
    Compare(QueryArgs),
    /// Station-wise levels for the selected month, loudest first
    Stations(QueryArgs),
    /// Violation counts, detailed report and zone roll-up
    Violations {
        #[command(flatten)]
        query: QueryArgs,

        /// Also write the detailed report to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Every section of the dashboard
    Report(QueryArgs),
    /// List cities and zone types present in the data
    Cities {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Serialize)]
struct Catalogue {
    cities: Vec<String>,
    zone_types: Vec<String>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/noise_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("noise_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = DataConfig::from_env().with_overrides(
        cli.data.data_dir,
        cli.data.stations,
        cli.data.readings,
    );
    let dataset = match load_cached(&config.stations_path(), &config.readings_path()) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!(error = %e, "Failed to load noise data");
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Overview(query) => {
            run_query(&dataset, &query, Section::Overview, |view| to_json(&view.overview))?;
        }
        Commands::Compare(query) => {
            run_query(&dataset, &query, Section::Comparison, |view| {
                to_json(&view.comparison)
            })?;
        }
        Commands::Stations(query) => {
            run_query(&dataset, &query, Section::Stations, |view| to_json(&view.stations))?;
        }
        Commands::Violations { query, csv } => {
            let params = params_for(&dataset, &query)?;
            let view = render(&dataset, &params)?;
            if let Some(path) = csv {
                write_violation_report(&path, &view.violations.report)?;
                info!(path = %path.display(), rows = view.violations.report.len(), "Violation report written");
            }
            match query.format {
                Format::Text => print!("{}", render_text(&view, Section::Violations)?),
                Format::Json => println!("{}", to_json(&view.violations)?),
            }
        }
        Commands::Report(query) => {
            run_query(&dataset, &query, Section::All, |view| to_json(view))?;
        }
        Commands::Cities { format } => {
            let catalogue = Catalogue {
                cities: dataset.cities(),
                zone_types: dataset.zone_types(),
            };
            match format {
                Format::Text => {
                    println!("Cities: {}", catalogue.cities.join(", "));
                    println!("Zone types: {}", catalogue.zone_types.join(", "));
                }
                Format::Json => println!("{}", to_json(&catalogue)?),
            }
        }
    }

    Ok(())
}

/// Builds dashboard parameters, defaulting the city to the first one in the data.
fn params_for(dataset: &Dataset, query: &QueryArgs) -> Result<DashboardParams> {
    let city = match &query.city {
        Some(city) => city.clone(),
        None => match dataset.cities().into_iter().next() {
            Some(city) => city,
            None => bail!("the joined dataset is empty; no city to select"),
        },
    };

    let mut params = DashboardParams::new(city, query.month).with_bounds(PeriodBounds {
        before_start: query.before_start,
        before_end: query.before_end,
        after_start: query.after_start,
        after_end: query.after_end,
    });
    if !query.zone_types.is_empty() {
        params = params.with_zone_types(query.zone_types.iter().cloned());
    }
    Ok(params)
}

/// Renders one section as text, or the JSON picked by `json`.
fn run_query(
    dataset: &Dataset,
    query: &QueryArgs,
    section: Section,
    json: impl Fn(&DashboardView<'_>) -> Result<String>,
) -> Result<()> {
    let params = params_for(dataset, query)?;
    let view = render(dataset, &params)?;
    match query.format {
        Format::Text => print!("{}", render_text(&view, section)?),
        Format::Json => println!("{}", json(&view)?),
    }
    Ok(())
}
