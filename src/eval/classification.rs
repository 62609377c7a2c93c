//! Glaucoma classification evaluator.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::eval::{ExportOptions, report, sort_by_filename};
use crate::gt::ClassificationLabels;
use crate::metrics::classification::{
    REFERENCE_SPECIFICITY, roc_curve, sensitivity_at_specificity,
};

/// Classification scores for one set of predictions.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationPerformance {
    /// Area under the ROC curve.
    pub auc: f64,
    /// Sensitivity at the reference specificity.
    pub reference_sensitivity: f64,
}

/// Read a `classification_results.csv`: header row, then one row per image
/// with columns (filename, score).
pub fn read_classification_results(path: &Path) -> Result<(Vec<String>, Vec<f64>)> {
    if !path.is_file() {
        return Err(Error::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut filenames = Vec::new();
    let mut scores = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let filename = record.get(0).unwrap_or("").trim().to_string();
        if filename.is_empty() {
            continue;
        }
        let raw = record.get(1).unwrap_or("").trim();
        let score: f64 = raw.parse().map_err(|_| Error::MalformedRow {
            path: path.to_path_buf(),
            line: i + 2,
            reason: format!("score is not a number: {raw:?}"),
        })?;
        filenames.push(filename);
        scores.push(score);
    }
    Ok((filenames, scores))
}

/// Divide scores by their own maximum, mapping them into `[0, 1]`.
///
/// Each team's score scale is independent; normalization must happen per
/// team, never across the ensemble. A non-positive maximum (all-zero
/// scores) leaves the vector unchanged.
pub fn normalize_scores(scores: &mut [f64]) {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        for s in scores.iter_mut() {
            *s /= max;
        }
    }
}

/// Evaluate classification scores already aligned to the ground-truth
/// filename order.
pub fn evaluate_aligned_scores(
    scores: &[f64],
    labels: &[bool],
    options: &ExportOptions,
) -> Result<ClassificationPerformance> {
    let curve = roc_curve(scores, labels)?;
    let reference_sensitivity =
        sensitivity_at_specificity(&curve.sensitivity, &curve.specificity(), REFERENCE_SPECIFICITY)?;

    let performance = ClassificationPerformance {
        auc: curve.auc,
        reference_sensitivity,
    };

    if let Some(dir) = &options.output_dir {
        fs::create_dir_all(dir)?;
        report::write_roc_curve(&dir.join(report::ROC_CURVE_FILE), &curve)?;
        report::write_classification_summary(
            &dir.join(report::CLASSIFICATION_SUMMARY_FILE),
            &performance,
        )?;
    }

    Ok(performance)
}

/// Evaluate a team's classification results file against the ground-truth
/// labels.
///
/// Predictions are reordered to the ground-truth filename order before the
/// ROC sweep; a label row without a prediction fails with
/// [`Error::MissingPrediction`].
pub fn evaluate_classification(
    results_csv: &Path,
    labels: &ClassificationLabels,
    options: &ExportOptions,
) -> Result<ClassificationPerformance> {
    let (filenames, scores) = read_classification_results(results_csv)?;
    let aligned = sort_by_filename(&labels.filenames, &filenames, &scores)?;
    evaluate_aligned_scores(&aligned, &labels.labels, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_results(path: &Path, rows: &[(&str, &str)]) {
        let mut f = fs::File::create(path).unwrap();
        writeln!(f, "Filename,Glaucoma Risk").unwrap();
        for (name, score) in rows {
            writeln!(f, "{name},{score}").unwrap();
        }
    }

    fn labels() -> ClassificationLabels {
        ClassificationLabels {
            filenames: vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into(), "d.jpg".into()],
            labels: vec![true, false, true, false],
        }
    }

    #[test]
    fn test_evaluates_out_of_order_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classification_results.csv");
        // Rows deliberately not in ground-truth order.
        write_results(
            &path,
            &[("d.jpg", "0.2"), ("a.jpg", "0.9"), ("c.jpg", "0.8"), ("b.jpg", "0.3")],
        );

        let perf =
            evaluate_classification(&path, &labels(), &ExportOptions::default()).unwrap();
        assert_eq!(perf.auc, 1.0);
        assert_eq!(perf.reference_sensitivity, 1.0);
    }

    #[test]
    fn test_missing_row_fails_task() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classification_results.csv");
        write_results(&path, &[("a.jpg", "0.9"), ("b.jpg", "0.3"), ("c.jpg", "0.8")]);

        let err =
            evaluate_classification(&path, &labels(), &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingPrediction { filename } if filename == "d.jpg"));
    }

    #[test]
    fn test_malformed_score_is_reported_with_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classification_results.csv");
        write_results(&path, &[("a.jpg", "0.9"), ("b.jpg", "high")]);

        let err = read_classification_results(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { line: 3, .. }));
    }

    #[test]
    fn test_normalize_scores_by_own_maximum() {
        let mut scores = vec![1.0, 4.0, 2.0];
        normalize_scores(&mut scores);
        assert_eq!(scores, vec![0.25, 1.0, 0.5]);

        let mut zeros = vec![0.0, 0.0];
        normalize_scores(&mut zeros);
        assert_eq!(zeros, vec![0.0, 0.0]);
    }

    #[test]
    fn test_roc_outputs_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classification_results.csv");
        write_results(
            &path,
            &[("a.jpg", "0.9"), ("b.jpg", "0.3"), ("c.jpg", "0.8"), ("d.jpg", "0.2")],
        );
        let out = dir.path().join("out");

        evaluate_classification(&path, &labels(), &ExportOptions::into_dir(&out, false))
            .unwrap();
        assert!(out.join(report::ROC_CURVE_FILE).exists());
        assert!(out.join(report::CLASSIFICATION_SUMMARY_FILE).exists());
    }
}
