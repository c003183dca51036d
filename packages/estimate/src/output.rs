//! Lead outputs: a `GeoJSON` layer with owner footprints and a flat CSV
//! extract for mail merges.

use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use farm_leads_estimate_models::{LeadCsvRow, LeadRecord};

use crate::EstimateError;

/// Serializes leads as a `GeoJSON` `FeatureCollection`, one `MultiPolygon`
/// feature per owner.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn leads_to_geojson(leads: &[LeadRecord]) -> Result<String, EstimateError> {
    let mut features = Vec::with_capacity(leads.len());

    for lead in leads {
        let geometry = geojson::Geometry::new(geojson::Value::from(&lead.geometry));

        features.push(serde_json::json!({
            "type": "Feature",
            "geometry": serde_json::to_value(&geometry)?,
            "properties": {
                "owner": lead.owner,
                "mail_address": lead.contact.mail_address,
                "mail_city_state_zip": lead.contact.mail_city_state_zip,
                "farm_acres": lead.farm_acres,
                "min_capacity_est": lead.min_capacity_est,
                "max_capacity_est": lead.max_capacity_est,
                "silo_count": lead.silo_count,
            },
        }));
    }

    let collection = serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    });

    Ok(serde_json::to_string(&collection)?)
}

/// Writes the flat lead extract. Columns are `owner`, `mail_address`,
/// `mail_city_state_zip`, `farm_acres`, `min_capacity_est`,
/// `max_capacity_est`; geometry is omitted.
///
/// # Errors
///
/// Returns an error if a row cannot be written.
pub fn write_leads_csv<W: Write>(writer: W, leads: &[LeadRecord]) -> Result<(), EstimateError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for lead in leads {
        csv_writer.serialize(LeadCsvRow::from(lead))?;
    }

    // An empty extract still gets its header row.
    if leads.is_empty() {
        csv_writer.write_record([
            "owner",
            "mail_address",
            "mail_city_state_zip",
            "farm_acres",
            "min_capacity_est",
            "max_capacity_est",
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Reads a lead extract written by [`write_leads_csv`].
///
/// # Errors
///
/// Returns an error if the input is not a well-formed lead extract.
pub fn read_leads_csv<R: Read>(reader: R) -> Result<Vec<LeadCsvRow>, EstimateError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Writes both lead outputs, creating parent directories as needed.
///
/// Each document is first written to a staging file beside its target and
/// only renamed into place once both staging writes succeed. If any step
/// fails, the staging files and any output already moved into place are
/// removed, so a failed call leaves neither output behind.
///
/// # Errors
///
/// Returns an error if serialization fails or a file cannot be written.
pub fn write_outputs(
    geojson_path: &Path,
    csv_path: &Path,
    leads: &[LeadRecord],
) -> Result<(), EstimateError> {
    let geojson = leads_to_geojson(leads)?;
    let mut csv_buf = Vec::new();
    write_leads_csv(&mut csv_buf, leads)?;

    for path in [geojson_path, csv_path] {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
    }

    let geojson_staging = staging_path(geojson_path);
    let csv_staging = staging_path(csv_path);

    let result = publish(&[
        (geojson_staging.as_path(), geojson_path, geojson.as_bytes()),
        (csv_staging.as_path(), csv_path, csv_buf.as_slice()),
    ]);

    if let Err(e) = result {
        log::warn!("Writing lead outputs failed, removing partial files: {e}");
        for path in [&geojson_staging, &csv_staging] {
            let _ = fs::remove_file(path);
        }
        return Err(e.into());
    }

    log::info!(
        "Wrote {} lead features to {}",
        leads.len(),
        geojson_path.display()
    );
    log::info!("Wrote {} lead rows to {}", leads.len(), csv_path.display());

    Ok(())
}

/// Writes every `(staging, target, contents)` entry to its staging path,
/// then renames each into place. A rename failure removes the targets that
/// were already moved.
fn publish(entries: &[(&Path, &Path, &[u8])]) -> std::io::Result<()> {
    for (staging, _, contents) in entries {
        fs::write(staging, contents)?;
    }

    for (done, (staging, target, _)) in entries.iter().enumerate() {
        if let Err(e) = fs::rename(staging, target) {
            for (_, published, _) in &entries[..done] {
                let _ = fs::remove_file(published);
            }
            return Err(e);
        }
    }

    Ok(())
}

/// Sibling path used while an output is being written.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
