use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};
use weatherstream::models::{AlertWeatherResponse, CurrentWeatherResponse, ForecastWeatherResponse};
use weatherstream::pipeline::{WeatherPipeline, parse_date};
use weatherstream::secrets::{self, SecretProvider};
use weatherstream::sink::{EventPublisher, event, table};
use weatherstream::{
    LocationQuery, TimerSchedule, WeatherStreamConfig, WeatherStreamError, flatten, logging,
    scheduler,
};

/// Poll a weather API and stream flattened weather records
#[derive(Parser)]
#[command(name = "weatherstream", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "WEATHERSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Location to query, overrides weather.location
    #[arg(short, long, global = true)]
    location: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the timer trigger: fetch, flatten and publish on the cron schedule
    Run,
    /// Fetch, flatten and publish a single snapshot
    Once,
    /// Write the current conditions as a one-row table
    Current {
        /// CSV output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Write one table row per day of observed history
    History {
        /// First day, YYYY-MM-DD (inclusive)
        #[arg(long)]
        start: String,
        /// Last day, YYYY-MM-DD (exclusive)
        #[arg(long)]
        end: String,
        /// CSV output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Flatten saved current, forecast and alert payloads and print the record
    Flatten {
        #[arg(long)]
        current: PathBuf,
        #[arg(long)]
        forecast: PathBuf,
        #[arg(long)]
        alerts: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(e) = err.downcast_ref::<WeatherStreamError>() {
                eprintln!("Error: {}", e.user_message());
            }
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = WeatherStreamConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;
    debug!(
        "Using config from: {}",
        cli.config
            .as_deref()
            .map_or_else(|| "defaults and environment".to_string(), |p| p.display().to_string())
    );

    let location = cli.location.as_deref();
    match cli.command {
        Command::Flatten {
            current,
            forecast,
            alerts,
        } => flatten_files(&current, &forecast, &alerts),
        Command::Run => {
            let (location, secrets) = prepare(&config, location)?;
            run_timer(config, secrets, location).await
        }
        Command::Once => {
            let (location, secrets) = prepare(&config, location)?;
            let publisher = event::from_config(&config.sink)?;
            let pipeline = WeatherPipeline::connect(&config.weather, secrets.as_ref()).await?;
            pipeline
                .publish_snapshot(&location, publisher.as_ref())
                .await?;
            Ok(())
        }
        Command::Current { output } => {
            let (location, secrets) = prepare(&config, location)?;
            let pipeline = WeatherPipeline::connect(&config.weather, secrets.as_ref()).await?;
            let row = pipeline.current_summary(&location).await?;
            let path = output.or(config.table.path);
            table::open(path.as_deref())?.write(&[row])?;
            Ok(())
        }
        Command::History { start, end, output } => {
            let (location, secrets) = prepare(&config, location)?;
            let start = parse_date(&start)?;
            let end = parse_date(&end)?;
            let pipeline = WeatherPipeline::connect(&config.weather, secrets.as_ref()).await?;
            let rows = pipeline.history_range(&location, start, end).await?;
            let path = output.or(config.table.path);
            let written = table::open(path.as_deref())?.write(&rows)?;
            info!("Wrote {} rows", written);
            Ok(())
        }
    }
}

/// Location and secret provider shared by the commands that call the API
fn prepare(
    config: &WeatherStreamConfig,
    location: Option<&str>,
) -> Result<(LocationQuery, Arc<dyn SecretProvider>)> {
    let location = LocationQuery::parse(location.unwrap_or(&config.weather.location))?;
    let secrets: Arc<dyn SecretProvider> = Arc::from(secrets::from_config(&config.secrets)?);
    Ok((location, secrets))
}

async fn run_timer(
    config: WeatherStreamConfig,
    secrets: Arc<dyn SecretProvider>,
    location: LocationQuery,
) -> Result<()> {
    let schedule = TimerSchedule::parse(&config.schedule.cron)?;
    let run_on_startup = config.schedule.run_on_startup;
    let publisher: Arc<dyn EventPublisher> = Arc::from(event::from_config(&config.sink)?);
    let weather = Arc::new(config.weather);
    let location = Arc::new(location);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
        }
        let _ = shutdown_tx.send(true);
    });

    scheduler::run(&schedule, run_on_startup, shutdown_rx, move |_tick| {
        let weather = Arc::clone(&weather);
        let secrets = Arc::clone(&secrets);
        let publisher = Arc::clone(&publisher);
        let location = Arc::clone(&location);
        async move {
            // The key is resolved per run so a rotated secret is picked up
            let pipeline = WeatherPipeline::connect(&weather, secrets.as_ref()).await?;
            pipeline
                .publish_snapshot(&location, publisher.as_ref())
                .await
                .map(|_| ())
        }
    })
    .await?;
    Ok(())
}

fn flatten_files(current: &Path, forecast: &Path, alerts: &Path) -> Result<()> {
    let current: CurrentWeatherResponse = read_json(current)?;
    let forecast: ForecastWeatherResponse = read_json(forecast)?;
    let alerts: AlertWeatherResponse = read_json(alerts)?;

    let record = flatten(&current, &forecast, &alerts)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}
