//! Background sample loading from the training CSV.
//!
//! The CSV must contain one column per model feature; header names are
//! matched ignoring case and whitespace, so the training file's
//! `Current Smoker` header resolves to `CurrentSmoker`. Extra columns are
//! ignored. Indicator cells accept `1/0`, `Y/N`, `yes/no`, `true/false`,
//! `male/female` (and the dataset spelling `Fmale`).
//!
//! Age is passed through the same fitted scaler as request ages, so the
//! background lives in exactly the feature space the model scores.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use cadrisk_contracts::{
    attribution::BackgroundSample,
    error::{CadError, CadResult},
    feature::{Feature, FEATURE_COUNT},
};
use cadrisk_core::scaler::StandardScaler;

/// Read the background CSV at `path`.
pub fn load_background_csv(path: &Path, scaler: &StandardScaler) -> CadResult<BackgroundSample> {
    let file = std::fs::File::open(path).map_err(|e| {
        CadError::config(format!(
            "failed to open background file '{}': {}",
            path.display(),
            e
        ))
    })?;
    parse_background(file, scaler)
}

/// Parse background rows from any CSV reader.
pub fn parse_background<R: Read>(reader: R, scaler: &StandardScaler) -> CadResult<BackgroundSample> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| CadError::config(format!("failed to read background headers: {}", e)))?
        .clone();

    // columns[f] = CSV column index of feature f.
    let mut columns = [usize::MAX; FEATURE_COUNT];
    for (col, header) in headers.iter().enumerate() {
        if let Some(feature) = Feature::from_name(header) {
            columns[feature.index()] = col;
        }
    }
    if let Some(missing) = Feature::ALL.iter().find(|f| columns[f.index()] == usize::MAX) {
        return Err(CadError::config(format!(
            "background file has no '{}' column",
            missing.name()
        )));
    }

    let mut rows = Vec::new();
    for (idx, record) in csv_reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = record
            .map_err(|e| CadError::config(format!("background line {}: {}", line, e)))?;

        let mut row = vec![0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            let cell = record.get(columns[feature.index()]).unwrap_or("");
            row[feature.index()] = match feature {
                Feature::Age => scaler.transform(number(cell, feature, line)?),
                _ => indicator(cell, feature, line)?,
            };
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), "background sample parsed");
    BackgroundSample::new(FEATURE_COUNT, rows)
}

fn number(cell: &str, feature: Feature, line: usize) -> CadResult<f64> {
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            CadError::config(format!(
                "background line {}: '{}' is not a number for column '{}'",
                line, cell, feature
            ))
        })
}

fn indicator(cell: &str, feature: Feature, line: usize) -> CadResult<f64> {
    match cell.to_lowercase().as_str() {
        "1" | "1.0" | "y" | "yes" | "true" | "male" => Ok(1.0),
        "0" | "0.0" | "n" | "no" | "false" | "female" | "fmale" => Ok(0.0),
        _ => Err(CadError::config(format!(
            "background line {}: '{}' is not a valid indicator for column '{}'",
            line, cell, feature
        ))),
    }
}
