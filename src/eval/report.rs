//! CSV and JSON report writers for per-submission evaluation output.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::eval::classification::ClassificationPerformance;
use crate::eval::fovea::FoveaPerformance;
use crate::eval::segmentation::SegmentationPerformance;
use crate::metrics::classification::RocCurve;

/// Per-image segmentation detail table.
pub const SEGMENTATION_TABLE_FILE: &str = "evaluation_table_segmentation.csv";
/// Segmentation summary (means across images).
pub const SEGMENTATION_SUMMARY_FILE: &str = "evaluation_segmentation.csv";
/// Classification summary (AUC, reference sensitivity).
pub const CLASSIFICATION_SUMMARY_FILE: &str = "evaluation_classification.csv";
/// Serialized ROC curve for downstream plotting tools.
pub const ROC_CURVE_FILE: &str = "roc_curve.json";
/// Per-image fovea-location detail table.
pub const FOVEA_TABLE_FILE: &str = "evaluation_table_fovea_location.csv";
/// Fovea-location summary (mean distance).
pub const FOVEA_SUMMARY_FILE: &str = "evaluation_fovea_location.csv";

/// Write the per-image segmentation table: one row per image with cup Dice,
/// disc Dice and absolute vCDR error.
pub fn write_segmentation_table(
    path: &Path,
    filenames: &[String],
    cup_dices: &[f64],
    disc_dices: &[f64],
    ae_cdrs: &[f64],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Filename", "Cup-Dice", "Disc-Dice", "AE-CDR"])?;
    for (i, filename) in filenames.iter().enumerate() {
        writer.write_record([
            filename.as_str(),
            &cup_dices[i].to_string(),
            &disc_dices[i].to_string(),
            &ae_cdrs[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the segmentation summary CSV.
pub fn write_segmentation_summary(path: &Path, perf: &SegmentationPerformance) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Cup-Dice", "Disc-Dice", "AE-CDR"])?;
    writer.write_record([
        perf.mean_cup_dice.to_string(),
        perf.mean_disc_dice.to_string(),
        perf.mae_cdr.to_string(),
    ])?;
    writer.flush()?;
    Ok(())
}

/// Write the classification summary CSV.
pub fn write_classification_summary(path: &Path, perf: &ClassificationPerformance) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["AUC", "Reference sensitivity"])?;
    writer.write_record([perf.auc.to_string(), perf.reference_sensitivity.to_string()])?;
    writer.flush()?;
    Ok(())
}

/// Serialize a ROC curve (sensitivity array, FPR array, scalar AUC) for
/// downstream plotting tools.
pub fn write_roc_curve(path: &Path, curve: &RocCurve) -> Result<()> {
    let json = serde_json::to_string_pretty(curve)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write the per-image fovea-location table.
pub fn write_fovea_table(path: &Path, filenames: &[String], distances: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Filename", "Euclidean distance"])?;
    for (filename, distance) in filenames.iter().zip(distances) {
        writer.write_record([filename.as_str(), &distance.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the fovea-location summary CSV.
pub fn write_fovea_summary(path: &Path, perf: &FoveaPerformance) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Mean Euclidean distance"])?;
    writer.write_record([perf.mean_distance.to_string()])?;
    writer.flush()?;
    Ok(())
}

/// Write a `classification_results.csv` in the submission format (header
/// row, filename and score columns). Used by the reference baselines so
/// their scores can be re-read like any team's.
pub fn write_classification_results(
    path: &Path,
    filenames: &[String],
    scores: &[f64],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Filename", "Glaucoma Risk"])?;
    for (filename, score) in filenames.iter().zip(scores) {
        writer.write_record([filename.as_str(), &score.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmentation_table_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SEGMENTATION_TABLE_FILE);
        write_segmentation_table(
            &path,
            &["a.bmp".to_string(), "b.bmp".to_string()],
            &[0.9, 0.8],
            &[0.95, 0.85],
            &[0.05, 0.1],
        )
        .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            vec!["Filename", "Cup-Dice", "Disc-Dice", "AE-CDR"]
        );
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn test_roc_curve_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ROC_CURVE_FILE);
        let curve = RocCurve {
            sensitivity: vec![0.0, 1.0],
            false_positive_rate: vec![0.0, 1.0],
            auc: 0.5,
        };
        write_roc_curve(&path, &curve).unwrap();

        let restored: RocCurve =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored.sensitivity, curve.sensitivity);
        assert_eq!(restored.auc, 0.5);
    }
}
