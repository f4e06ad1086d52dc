use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rig_compare::data::filter::{Selection, ALL};
use rig_compare::report::render_text;
use rig_compare::{load_file, DashboardConfig, DashboardSession, Selections};

/// Compare drilling-rig performance across operators, contractors and shakers.
#[derive(Parser, Debug)]
#[command(name = "rig-compare")]
#[command(version)]
struct CliArgs {
    /// Rig data file (.csv, .json or .parquet)
    file: PathBuf,

    /// JSON file overriding column names and defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = ALL)]
    operator: String,

    #[arg(long, default_value = ALL)]
    contractor: String,

    /// Shaker / equipment identifier
    #[arg(long, default_value = ALL)]
    shaker: String,

    #[arg(long, default_value = ALL)]
    hole_size: String,

    /// Metric column to compare (repeatable); defaults come from the config
    #[arg(long = "metric")]
    metrics: Vec<String>,

    /// Number of ranked wells to show
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Print the full view as JSON instead of a text report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };

    let dataset = load_file(&args.file)?;
    let mut session = DashboardSession::new(dataset, config);

    let selections = Selections {
        operator: Selection::parse(&args.operator),
        contractor: Selection::parse(&args.contractor),
        equipment: Selection::parse(&args.shaker),
        hole_size: Selection::parse(&args.hole_size),
    };
    let view = session.view(&selections, &args.metrics);

    if args.json {
        let json = serde_json::to_string_pretty(view.as_ref()).context("serializing view")?;
        println!("{json}");
    } else {
        print!("{}", render_text(&view, args.top)?);
    }
    Ok(())
}
