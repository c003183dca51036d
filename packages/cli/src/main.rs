#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for farm lead generation.
//!
//! ```text
//! farm_leads [--config leads.toml] [--parcels parcels.geojson] [--silos silos.geojson]
//!            [--reference bins.csv] [--cluster-size 3] [--cluster-distance 20]
//! ```
//!
//! Settings come from the optional TOML config file, then individual flags
//! override single values. Uses `indicatif-log-bridge` (via
//! [`farm_leads_cli_utils::init_logger`]) so log lines and the stage bar
//! never fight for the terminal.

mod pipeline;

use std::path::PathBuf;

use clap::Parser;
use farm_leads_cli_utils::IndicatifProgress;
use farm_leads_config::{Crs, LeadGenConfig, TierOrdering};

#[derive(Parser)]
#[command(
    name = "farm_leads",
    about = "Rank farm owners by estimated on-farm grain storage"
)]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parcel `GeoJSON` file
    #[arg(long)]
    parcels: Option<PathBuf>,

    /// Silo detection `GeoJSON` file
    #[arg(long)]
    silos: Option<PathBuf>,

    /// Manufacturer capacity table (CSV)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Where to write the lead `GeoJSON`
    #[arg(long)]
    output_geojson: Option<PathBuf>,

    /// Where to write the flat lead CSV
    #[arg(long)]
    output_csv: Option<PathBuf>,

    /// Smallest plausible silo diameter in meters
    #[arg(long)]
    min_diameter: Option<f64>,

    /// Largest plausible silo diameter in meters
    #[arg(long)]
    max_diameter: Option<f64>,

    /// Detections needed within reach, counting the detection itself
    #[arg(long)]
    cluster_size: Option<usize>,

    /// Buffer distance in meters
    #[arg(long)]
    cluster_distance: Option<f64>,

    /// Metric CRS for distances, e.g. EPSG:32616
    #[arg(long)]
    distance_crs: Option<Crs>,

    /// Tier label comparison: `lexical` or `numeric`
    #[arg(long, value_parser = parse_tier_ordering)]
    tier_ordering: Option<TierOrdering>,
}

fn parse_tier_ordering(value: &str) -> Result<TierOrdering, String> {
    value
        .parse()
        .map_err(|_| format!("unknown tier ordering '{value}', expected `lexical` or `numeric`"))
}

impl Cli {
    fn apply_overrides(self, config: &mut LeadGenConfig) {
        if let Some(path) = self.parcels {
            config.inputs.parcels = path;
        }
        if let Some(path) = self.silos {
            config.inputs.silos = path;
        }
        if let Some(path) = self.reference {
            config.inputs.reference_table = path;
        }
        if let Some(path) = self.output_geojson {
            config.outputs.leads_geojson = path;
        }
        if let Some(path) = self.output_csv {
            config.outputs.leads_csv = path;
        }
        if let Some(min) = self.min_diameter {
            config.cluster.min_diameter = min;
        }
        if let Some(max) = self.max_diameter {
            config.cluster.max_diameter = max;
        }
        if let Some(size) = self.cluster_size {
            config.cluster.cluster_size = size;
        }
        if let Some(distance) = self.cluster_distance {
            config.cluster.cluster_distance_m = distance;
        }
        if let Some(crs) = self.distance_crs {
            config.cluster.distance_crs = crs;
        }
        if let Some(ordering) = self.tier_ordering {
            config.capacity.tier_ordering = ordering;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = farm_leads_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config =
        LeadGenConfig::load(cli.config.as_deref()).map_err(pipeline::PipelineError::Config)?;
    cli.apply_overrides(&mut config);

    let progress =
        IndicatifProgress::steps_bar(&multi, "Generating leads", pipeline::STAGE_COUNT);
    let summary = pipeline::run(&config, &progress)?;

    println!();
    println!(
        "{} owners, {} with estimated storage",
        summary.owners, summary.owners_with_storage
    );
    println!(
        "{} of {} silo detections kept after size and cluster filtering",
        summary.silos_kept, summary.silos_detected
    );
    println!(
        "Leads written to {} and {}",
        config.outputs.leads_geojson.display(),
        config.outputs.leads_csv.display()
    );

    Ok(())
}
