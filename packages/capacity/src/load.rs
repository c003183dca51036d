//! Reads the reference capacity table from CSV.

use std::io::Read;
use std::path::Path;

use farm_leads_capacity_models::ReferenceRow;
use farm_leads_config::ReferenceColumns;

use crate::CapacityError;

/// Reads the reference table at `path`.
///
/// # Errors
///
/// Returns [`CapacityError`] if the file cannot be opened or parsed.
pub fn load_reference_table(
    path: &Path,
    columns: &ReferenceColumns,
) -> Result<Vec<ReferenceRow>, CapacityError> {
    let file = std::fs::File::open(path)?;
    let rows = parse_reference_table(file, columns)?;
    log::info!(
        "Loaded {} reference rows from {}",
        rows.len(),
        path.display()
    );
    Ok(rows)
}

/// Parses reference rows from CSV.
///
/// Extra columns are ignored. An empty capacity cell is kept as a row
/// without capacity: it still counts toward the tier bracket of its
/// diameter but not toward any curve fit.
///
/// # Errors
///
/// Returns [`CapacityError::MissingColumn`] when a configured column is
/// absent and [`CapacityError::InvalidRow`] for an empty tier, a
/// non-positive or unreadable diameter, or an unreadable or non-positive
/// capacity.
pub fn parse_reference_table<R: Read>(
    reader: R,
    columns: &ReferenceColumns,
) -> Result<Vec<ReferenceRow>, CapacityError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CapacityError::MissingColumn(name.to_string()))
    };
    let diameter_col = position(&columns.diameter)?;
    let tier_col = position(&columns.tier)?;
    let capacity_col = position(&columns.capacity)?;

    let mut rows = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let cell = |col: usize| record.get(col).unwrap_or("").trim();
        let invalid = |message: String| CapacityError::InvalidRow { row, message };

        let diameter_text = cell(diameter_col);
        let diameter_m = diameter_text
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| {
                invalid(format!("diameter '{diameter_text}' is not a positive number"))
            })?;

        let tier = cell(tier_col);
        if tier.is_empty() {
            return Err(invalid("tier is empty".to_string()));
        }

        let bushels = match cell(capacity_col) {
            "" => None,
            text => Some(
                text.parse::<f64>()
                    .ok()
                    .filter(|b| b.is_finite() && *b > 0.0)
                    .ok_or_else(|| invalid(format!("capacity '{text}' is not a positive number")))?,
            ),
        };

        rows.push(ReferenceRow {
            diameter_m,
            tier: tier.to_string(),
            bushels,
        });
    }

    Ok(rows)
}
