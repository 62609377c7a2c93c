//! Fovea localization evaluator.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::eval::{ExportOptions, report, sort_by_filename};
use crate::gt::FoveaAnnotations;
use crate::metrics::fovea::{Point, euclidean_distances};
use crate::metrics::mean;

/// Localization score for one set of predictions.
#[derive(Debug, Clone, Serialize)]
pub struct FoveaPerformance {
    /// Mean Euclidean distance to the ground-truth fovea, in pixels.
    pub mean_distance: f64,
}

/// Read a `fovea_location_results.csv`: header row, then one row per image
/// with columns (filename, x, y).
pub fn read_fovea_results(path: &Path) -> Result<(Vec<String>, Vec<Point>)> {
    if !path.is_file() {
        return Err(Error::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut filenames = Vec::new();
    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let filename = record.get(0).unwrap_or("").trim().to_string();
        if filename.is_empty() {
            continue;
        }
        let parse = |col: usize| -> Result<f64> {
            let raw = record.get(col).unwrap_or("").trim();
            raw.parse().map_err(|_| Error::MalformedRow {
                path: path.to_path_buf(),
                line: i + 2,
                reason: format!("coordinate is not a number: {raw:?}"),
            })
        };
        let point = Point::new(parse(1)?, parse(2)?);
        filenames.push(filename);
        points.push(point);
    }
    Ok((filenames, points))
}

/// Evaluate a team's fovea predictions against the ground-truth
/// annotations.
pub fn evaluate_fovea_location(
    results_csv: &Path,
    annotations: &FoveaAnnotations,
    options: &ExportOptions,
) -> Result<FoveaPerformance> {
    let (filenames, points) = read_fovea_results(results_csv)?;
    let aligned = sort_by_filename(&annotations.filenames, &filenames, &points)?;
    let distances = euclidean_distances(&annotations.points, &aligned)?;

    let performance = FoveaPerformance {
        mean_distance: mean(&distances),
    };

    if let Some(dir) = &options.output_dir {
        fs::create_dir_all(dir)?;
        if options.export_table {
            report::write_fovea_table(
                &dir.join(report::FOVEA_TABLE_FILE),
                &annotations.filenames,
                &distances,
            )?;
        }
        report::write_fovea_summary(&dir.join(report::FOVEA_SUMMARY_FILE), &performance)?;
    }

    Ok(performance)
}
