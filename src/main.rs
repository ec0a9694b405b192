use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vigil::config::Config;
use vigil::error::ConfigError;
use vigil::events::{
    AlertContext, AlertRoutingDecision, CorrelationAnalysis, ErrorDataPoint, ErrorPrediction,
    HistoricalResolution, TeamExpertise,
};
use vigil::routing::RouterStatistics;
use vigil::ErrorIntelligence;

/// Command-line arguments for the scenario replayer
#[derive(Parser)]
#[command(
    name = "vigil",
    about = "Error forecasting and alert routing - replay a scenario and print the results",
    long_about = "Replays a JSON scenario (teams, error samples, resolutions and alerts) through \
                  the error predictor and alert router, then prints forecasts, correlation \
                  analysis, routing decisions and router statistics as JSON."
)]
struct Cli {
    /// Scenario file to replay
    #[arg(value_name = "SCENARIO", help = "Scenario file path (JSON format)")]
    scenario: PathBuf,

    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Number of hourly intervals to forecast
    #[arg(long, default_value_t = 6)]
    hours: usize,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if !self.scenario.is_file() {
            return Err(format!(
                "Scenario path is not a file: {}",
                self.scenario.display()
            ));
        }

        if let Some(ref config_path) = self.config {
            // Missing config files fall back to defaults in load_config
            if config_path.exists() && !config_path.is_file() {
                return Err(format!(
                    "Configuration path is not a file: {}",
                    config_path.display()
                ));
            }
            if config_path.extension().is_some_and(|ext| ext != "toml") {
                warn!(
                    "Configuration file does not have .toml extension: {}",
                    config_path.display()
                );
            }
        }

        if self.hours == 0 {
            return Err("--hours must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Input replayed through the predictor and router, in this order
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Scenario {
    teams: Vec<TeamExpertise>,
    data_points: Vec<ErrorDataPoint>,
    resolutions: Vec<HistoricalResolution>,
    alerts: Vec<AlertContext>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    predictions: Vec<ErrorPrediction>,
    accuracy: f64,
    correlations: CorrelationAnalysis,
    decisions: Vec<AlertRoutingDecision>,
    statistics: RouterStatistics,
}

/// Load configuration from file or use defaults
///
/// Missing, unreadable or invalid files are reported and replaced by the
/// default configuration.
fn load_config(config_path: Option<&Path>) -> Config {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => config,
                Err(ConfigError::ReadError(_)) => {
                    warn!(
                        "Configuration file '{}' not found or unreadable, using defaults",
                        path.display()
                    );
                    Config::default()
                }
                Err(e) => {
                    error!("Configuration error in '{}': {}", path.display(), e);
                    warn!("Using default configuration due to invalid config file");
                    Config::default()
                }
            }
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    }
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing scenario {}", path.display()))
}

fn replay(service: &ErrorIntelligence, scenario: Scenario, hours: usize) -> Report {
    info!(
        "Replaying {} teams, {} samples, {} resolutions, {} alerts",
        scenario.teams.len(),
        scenario.data_points.len(),
        scenario.resolutions.len(),
        scenario.alerts.len()
    );

    for team in scenario.teams {
        service.add_team(team);
    }
    for point in scenario.data_points {
        service.add_data_point(point);
    }
    for resolution in scenario.resolutions {
        service.record_resolution(resolution);
    }
    let decisions = scenario
        .alerts
        .iter()
        .map(|alert| service.route_alert(alert))
        .collect();

    Report {
        predictions: service.predict_next(hours),
        accuracy: service.accuracy(),
        correlations: service.analyze_correlations(),
        decisions,
        statistics: service.statistics(),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref());
    let scenario = load_scenario(&cli.scenario)?;
    let service = ErrorIntelligence::new(&config);

    let report = replay(&service, scenario, cli.hours);
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    println!("{}", json);
    Ok(())
}

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli) {
        error!("Replay failed: {:#}", e);
        std::process::exit(1);
    }
}
