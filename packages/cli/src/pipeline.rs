//! Staged lead generation run.
//!
//! Stages run in a fixed order, each consuming the previous stages' full
//! output: ownership aggregation, silo cluster filtering, capacity model
//! fitting, estimation with attribution, and output. Nothing is written
//! until every stage has succeeded.

use std::sync::Arc;
use std::time::Instant;

use farm_leads_capacity::{
    CapacityError, ensure_coverage, fit_tier_curves, load_reference_table,
    tier_bracket_by_diameter,
};
use farm_leads_cli_utils::ProgressCallback;
use farm_leads_config::{ConfigError, LeadGenConfig};
use farm_leads_estimate::output::write_outputs;
use farm_leads_estimate::{EstimateError, attribute, estimate};
use farm_leads_parcel::{ParcelError, aggregate_owners, load_parcels};
use farm_leads_silo::{SiloError, filter_clustered_silos, load_detections};

/// Number of stages reported through the progress callback.
pub const STAGE_COUNT: u64 = 5;

/// A failed run, naming the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The configuration could not be loaded or is invalid.
    #[error("Configuration failed: {0}")]
    Config(#[from] ConfigError),

    /// Parcels could not be loaded or aggregated.
    #[error("Ownership aggregation failed: {0}")]
    Ownership(#[from] ParcelError),

    /// Silo detections could not be loaded or filtered.
    #[error("Silo cluster filtering failed: {0}")]
    SiloFilter(#[from] SiloError),

    /// The capacity model could not be built.
    #[error("Capacity model failed: {0}")]
    CapacityModel(#[from] CapacityError),

    /// Silos could not be estimated.
    #[error("Estimation failed: {0}")]
    Estimation(#[source] EstimateError),

    /// Lead outputs could not be written.
    #[error("Writing outputs failed: {0}")]
    Output(#[source] EstimateError),
}

/// Counts reported at the end of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Owners with farmland, one lead each.
    pub owners: usize,
    /// Owners with at least one attributed silo.
    pub owners_with_storage: usize,
    /// Detections read from the silo layer.
    pub silos_detected: usize,
    /// Detections left after size and cluster filtering.
    pub silos_kept: usize,
}

/// Runs every stage against `config` and writes both lead outputs.
///
/// # Errors
///
/// Returns [`PipelineError`] for the first stage that fails. No output
/// file is created in that case.
pub fn run(
    config: &LeadGenConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, PipelineError> {
    let start = Instant::now();
    config.validate()?;

    progress.set_message("Aggregating owners".to_string());
    let parcels = load_parcels(&config.inputs.parcels, &config.parcel_fields)?;
    let owners = aggregate_owners(&parcels);
    progress.inc(1);

    progress.set_message("Filtering silo clusters".to_string());
    let detections = load_detections(&config.inputs.silos, &config.cluster.diameter_field)?;
    let clustered = filter_clustered_silos(&detections, &config.cluster)?;
    progress.inc(1);

    progress.set_message("Fitting capacity curves".to_string());
    let reference = load_reference_table(&config.inputs.reference_table, &config.reference_columns)?;
    let curves = fit_tier_curves(&reference)?;
    let brackets = tier_bracket_by_diameter(&reference, config.capacity.tier_ordering);
    ensure_coverage(&curves, &brackets)?;
    progress.inc(1);

    progress.set_message("Estimating capacity".to_string());
    let estimated = estimate(&clustered, &curves, &brackets).map_err(PipelineError::Estimation)?;
    let leads = attribute(&estimated, owners);
    progress.inc(1);

    progress.set_message("Writing leads".to_string());
    write_outputs(
        &config.outputs.leads_geojson,
        &config.outputs.leads_csv,
        &leads,
    )
    .map_err(PipelineError::Output)?;
    progress.inc(1);

    let summary = RunSummary {
        owners: leads.len(),
        owners_with_storage: leads.iter().filter(|lead| lead.silo_count > 0).count(),
        silos_detected: detections.len(),
        silos_kept: clustered.len(),
    };

    let elapsed = start.elapsed();
    progress.finish(format!("Done in {:.1}s", elapsed.as_secs_f64()));
    log::info!("Lead generation finished in {elapsed:.1?}");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::*;
    use farm_leads_cli_utils::null_progress;
    use farm_leads_estimate::output::read_leads_csv;

    const PARCELS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"OWNER":" GRAIN FARMS LLC ","FARM_ACRES":60,"MAILTO_ADD":"100 FARM RD","MAILTO_CSZ":"PETERSBURG IL 62675"},
         "geometry":{"type":"Polygon","coordinates":[[[-89.902,39.998],[-89.900,39.998],[-89.900,40.002],[-89.902,40.002],[-89.902,39.998]]]}},
        {"type":"Feature","properties":{"OWNER":"GRAIN FARMS LLC","FARM_ACRES":"40","MAILTO_ADD":"PO BOX 9","MAILTO_CSZ":"ATHENS IL 62613"},
         "geometry":{"type":"Polygon","coordinates":[[[-89.900,39.998],[-89.898,39.998],[-89.898,40.002],[-89.900,40.002],[-89.900,39.998]]]}},
        {"type":"Feature","properties":{"OWNER":"NO SILO ACRES","FARM_ACRES":80,"MAILTO_ADD":"7 CREEK LN","MAILTO_CSZ":"TALLULA IL 62688"},
         "geometry":{"type":"Polygon","coordinates":[[[-89.80,39.99],[-89.79,39.99],[-89.79,40.00],[-89.80,40.00],[-89.80,39.99]]]}},
        {"type":"Feature","properties":{"OWNER":"TOWN LOT","FARM_ACRES":0},
         "geometry":{"type":"Polygon","coordinates":[[[-89.70,39.99],[-89.69,39.99],[-89.69,40.00],[-89.70,40.00],[-89.70,39.99]]]}}
    ]}"#;

    const SILOS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"DIAMETER":6},"geometry":{"type":"Point","coordinates":[-89.9000,40.0000]}},
        {"type":"Feature","properties":{"DIAMETER":8},"geometry":{"type":"Point","coordinates":[-89.9001,40.0000]}},
        {"type":"Feature","properties":{"DIAMETER":6},"geometry":{"type":"Point","coordinates":[-89.9000,40.0001]}},
        {"type":"Feature","properties":{"DIAMETER":30},"geometry":{"type":"Point","coordinates":[-89.9001,40.0001]}},
        {"type":"Feature","properties":{"DIAMETER":8},"geometry":{"type":"Point","coordinates":[-89.7950,39.9950]}}
    ]}"#;

    const REFERENCE: &str = "diameter_m,tier,bushels\n4,1,50\n8,1,400\n4,2,70\n8,2,560\n";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "farm_leads_pipeline_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config_in(dir: &Path, reference: &str) -> LeadGenConfig {
        fs::write(dir.join("parcels.geojson"), PARCELS).unwrap();
        fs::write(dir.join("silos.geojson"), SILOS).unwrap();
        fs::write(dir.join("bins.csv"), reference).unwrap();

        let mut config = LeadGenConfig::default();
        config.inputs.parcels = dir.join("parcels.geojson");
        config.inputs.silos = dir.join("silos.geojson");
        config.inputs.reference_table = dir.join("bins.csv");
        config.outputs.leads_geojson = dir.join("out").join("lead_gen.geojson");
        config.outputs.leads_csv = dir.join("out").join("lead_gen.csv");
        config
    }

    #[test]
    fn full_run_writes_ranked_leads() {
        let dir = scratch_dir("full");
        let config = config_in(&dir, REFERENCE);

        let summary = run(&config, &null_progress()).unwrap();

        assert_eq!(summary.owners, 2, "zero-acre owner is not a lead");
        assert_eq!(summary.owners_with_storage, 1);
        assert_eq!(summary.silos_detected, 5);
        assert_eq!(
            summary.silos_kept, 3,
            "oversized and isolated detections are dropped"
        );

        let csv = fs::read(&config.outputs.leads_csv).unwrap();
        let rows = read_leads_csv(csv.as_slice()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].owner, "GRAIN FARMS LLC");
        assert!((rows[0].farm_acres - 100.0).abs() < 1e-9);
        assert_eq!(rows[0].mail_address.as_deref(), Some("100 FARM RD"));
        assert!(rows[0].min_capacity_est > 0.0);
        assert!(rows[0].max_capacity_est > rows[0].min_capacity_est);

        assert_eq!(rows[1].owner, "NO SILO ACRES");
        assert!(rows[1].min_capacity_est.abs() < f64::EPSILON);
        assert!(rows[1].max_capacity_est.abs() < f64::EPSILON);

        assert!(config.outputs.leads_geojson.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_stage_is_named_and_leaves_no_output() {
        let dir = scratch_dir("failed");
        let config = config_in(&dir, "diameter_m,tier,bushels\n4,1,50\n8,1,400\n4,2,70\n");

        let err = run(&config, &null_progress()).unwrap_err();

        assert!(
            matches!(
                err,
                PipelineError::CapacityModel(CapacityError::InsufficientData { .. })
            ),
            "unexpected error: {err}"
        );
        assert!(err.to_string().starts_with("Capacity model failed"));
        assert!(!config.outputs.leads_geojson.exists());
        assert!(!config.outputs.leads_csv.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_config_fails_before_reading_inputs() {
        let mut config = LeadGenConfig::default();
        config.inputs.parcels = PathBuf::from("/nonexistent/parcels.geojson");
        config.cluster.cluster_size = 0;

        let err = run(&config, &null_progress()).unwrap_err();

        assert!(matches!(err, PipelineError::Config(_)), "unexpected error: {err}");
    }
}
