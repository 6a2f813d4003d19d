//! House price estimator CLI
//!
//! Form-style front end: every input is a bounded flag with the same default
//! the interactive form starts from.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use house_price_estimator::config::EstimatorConfig;
use house_price_estimator::{HousePriceEstimator, Record};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "price-estimator")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Estimate house prices with a random forest trained at startup", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset CSV (overrides the configuration)
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict the price of one property
    Predict(PredictArgs),
    /// List the choices for every categorical input
    Options,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Read the whole record from a JSON object instead of flags
    #[arg(long, conflicts_with_all = ["state", "property_type", "furnished", "availability"])]
    record: Option<PathBuf>,

    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    property_type: Option<String>,

    #[arg(long)]
    furnished: Option<String>,

    #[arg(long, default_value = "Medium", value_parser = ["Low", "Medium", "High"])]
    transport: String,

    #[arg(long, default_value = "Yes", value_parser = ["Yes", "No"])]
    parking: String,

    #[arg(long, default_value = "Yes", value_parser = ["Yes", "No"])]
    security: String,

    #[arg(long)]
    availability: Option<String>,

    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(i64).range(1..=6))]
    bhk: i64,

    #[arg(long, default_value_t = 1200, value_parser = clap::value_parser!(i64).range(500..=6000))]
    size: i64,

    #[arg(long, default_value_t = 2010, value_parser = clap::value_parser!(i64).range(1980..=2024))]
    year_built: i64,

    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(i64).range(0..=30))]
    floor: i64,

    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..=40))]
    total_floors: i64,

    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i64).range(0..=50))]
    age: i64,

    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(i64).range(0..=20))]
    schools: i64,

    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(i64).range(0..=20))]
    hospitals: i64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        EstimatorConfig::read(cli.config.as_deref()).context("Failed to load configuration")?;

    init_logging(&config.log_level(), cli.verbose)?;
    info!("House price estimator v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &cli.config {
        info!("Loaded configuration from {}", path.display());
    }

    config.apply_env_overrides();
    if let Some(dataset) = &cli.dataset {
        config.dataset.path = dataset.clone();
    }
    config.validate().context("Invalid configuration")?;

    let estimator =
        HousePriceEstimator::global(config).context("Failed to initialise estimator")?;

    match cli.command {
        Command::Predict(args) => predict(estimator, args),
        Command::Options => options(estimator),
    }
}

fn init_logging(level: &str, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn predict(estimator: &HousePriceEstimator, args: PredictArgs) -> Result<()> {
    let record = match &args.record {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read record {}", path.display()))?;
            serde_json::from_str::<Record>(&content).context("Failed to parse record JSON")?
        }
        None => form_record(estimator, args)?,
    };

    // Fit happens here on first use; a training failure is fatal.
    let pipeline = estimator.pipeline().context("Failed to train model")?;
    info!(
        "Model trained on {} rows ({} trees)",
        pipeline.metadata().train_rows,
        pipeline.metadata().tree_count
    );

    let prediction = estimator.predict(&record)?;
    println!("Estimated House Price: ₹ {prediction} Lakhs");
    Ok(())
}

/// Build a record from flags, filling unset select boxes with the first
/// option the dataset offers.
fn form_record(estimator: &HousePriceEstimator, args: PredictArgs) -> Result<Record> {
    let pick = |column: &str, value: Option<String>| -> Result<String> {
        match value {
            Some(v) => Ok(v),
            None => estimator
                .category_options(column)?
                .into_iter()
                .next()
                .with_context(|| format!("Dataset has no values for {column}")),
        }
    };

    Ok(Record::new()
        .with("State", pick("State", args.state)?)
        .with("Property_Type", pick("Property_Type", args.property_type)?)
        .with("Furnished_Status", pick("Furnished_Status", args.furnished)?)
        .with("Public_Transport_Accessibility", args.transport)
        .with("Parking_Space", args.parking)
        .with("Security", args.security)
        .with("Availability_Status", pick("Availability_Status", args.availability)?)
        .with("BHK", args.bhk as f64)
        .with("Size_in_SqFt", args.size as f64)
        .with("Year_Built", args.year_built as f64)
        .with("Floor_No", args.floor as f64)
        .with("Total_Floors", args.total_floors as f64)
        .with("Age_of_Property", args.age as f64)
        .with("Nearby_Schools", args.schools as f64)
        .with("Nearby_Hospitals", args.hospitals as f64))
}

fn options(estimator: &HousePriceEstimator) -> Result<()> {
    for &column in estimator.schema().categorical {
        let choices = estimator.category_options(column)?;
        println!("{column}: {}", choices.join(", "));
    }
    Ok(())
}
