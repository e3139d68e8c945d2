use clap::Parser;
use incentive_tracker::config::AppConfig;
use incentive_tracker::error::AppError;
use incentive_tracker::telemetry;
use incentive_tracker::tracker::{
    RunConfig, SalesPayload, SchemeSpec, TrackerEngine, TrackerError,
};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "incentive-tracker",
    about = "Compute base-period tracker metrics for a sales incentive scheme",
    version
)]
struct Cli {
    /// Sales ledger export (CSV)
    #[arg(long)]
    sales: PathBuf,
    /// Scheme configuration document (JSON)
    #[arg(long)]
    scheme: PathBuf,
    /// Run window configuration (JSON)
    #[arg(long)]
    run: PathBuf,
    /// Write the result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(config.environment, &config.telemetry)?;

    let sales_file = fs::File::open(&cli.sales)?;
    let sales = SalesPayload::from_csv_reader(sales_file)
        .and_then(SalesPayload::normalize)
        .map_err(TrackerError::from)?;

    let scheme =
        SchemeSpec::from_json(&fs::read_to_string(&cli.scheme)?).map_err(TrackerError::from)?;
    let run = RunConfig::from_json(&fs::read_to_string(&cli.run)?).map_err(TrackerError::from)?;

    info!(
        records = sales.len(),
        additional_schemes = scheme.additional.len(),
        "inputs loaded"
    );

    let engine = TrackerEngine::new(config.engine);
    let result = engine.compute(sales, &scheme, &run).await?;

    let rendered = serde_json::to_string_pretty(&result)?;
    match cli.output {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }

    Ok(())
}
