//! Reference baselines for the classification task.
//!
//! Neither baseline competes; both exist to put team results in context:
//!
//! - [`evaluate_ensemble`]: averages the max-normalized scores of several
//!   teams' classification results and scores the ensemble.
//! - [`evaluate_vcdr_baseline`]: uses the vertical cup-to-disc ratio of the
//!   ground-truth masks as a classification score, the classic glaucoma
//!   biomarker.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::eval::classification::{
    ClassificationPerformance, evaluate_aligned_scores, normalize_scores,
    read_classification_results,
};
use crate::eval::{ExportOptions, report, sort_by_filename};
use crate::gt::{self, GroundTruth};
use crate::metrics::segmentation::vertical_cup_to_disc_ratio;
use crate::submission::CLASSIFICATION_RESULTS_FILE;

/// Output subfolder for the ensemble baseline.
pub const ENSEMBLE_OUTPUT_DIR: &str = "baseline_ensemble";
/// Output subfolder for the vCDR baseline.
pub const VCDR_OUTPUT_DIR: &str = "baseline_vcdr";

/// Average the max-normalized classification scores of every team folder
/// under `ensemble_folder`, aligned to `gt_filenames` order.
///
/// Each team's scores are divided by that team's own maximum before
/// averaging: the scales are independent and must not leak into each other.
pub fn ensemble_scores(ensemble_folder: &Path, gt_filenames: &[String]) -> Result<Vec<f64>> {
    let mut team_dirs = Vec::new();
    for entry in fs::read_dir(ensemble_folder)? {
        let path = entry?.path();
        if path.is_dir() {
            team_dirs.push(path);
        }
    }
    team_dirs.sort();
    if team_dirs.is_empty() {
        return Err(Error::DegenerateInput(format!(
            "no team folders under {}",
            ensemble_folder.display()
        )));
    }

    let mut sums = vec![0.0; gt_filenames.len()];
    for dir in &team_dirs {
        let (filenames, scores) =
            read_classification_results(&dir.join(CLASSIFICATION_RESULTS_FILE))?;
        let mut aligned = sort_by_filename(gt_filenames, &filenames, &scores)?;
        normalize_scores(&mut aligned);
        for (sum, score) in sums.iter_mut().zip(&aligned) {
            *sum += score;
        }
    }

    let count = team_dirs.len() as f64;
    Ok(sums.into_iter().map(|s| s / count).collect())
}

/// Score an ensemble of top-ranked teams' classification results.
///
/// Writes the ROC curve and summary under
/// `<output_folder>/baseline_ensemble/`.
pub fn evaluate_ensemble(
    ensemble_folder: &Path,
    gt: &GroundTruth,
    output_folder: &Path,
) -> Result<ClassificationPerformance> {
    let scores = ensemble_scores(ensemble_folder, &gt.classification.filenames)?;
    let options = ExportOptions::into_dir(output_folder.join(ENSEMBLE_OUTPUT_DIR), false);
    let performance = evaluate_aligned_scores(&scores, &gt.classification.labels, &options)?;
    tracing::info!(
        auc = performance.auc,
        reference_sensitivity = performance.reference_sensitivity,
        "ensemble baseline"
    );
    Ok(performance)
}

/// Score the ground-truth vertical cup-to-disc ratio as a classifier.
///
/// The per-image vCDR values are also written as a
/// `classification_results.csv` under `<output_folder>/baseline_vcdr/`, so
/// the baseline can be ensembled like any team submission.
pub fn evaluate_vcdr_baseline(
    gt: &GroundTruth,
    output_folder: &Path,
) -> Result<ClassificationPerformance> {
    let masks_folder = gt.mask_folder();
    let mut scores = Vec::with_capacity(gt.classification.filenames.len());
    for filename in &gt.classification.filenames {
        let mask = gt::load_mask(&gt::find_gt_mask(&masks_folder, gt.layout, filename)?)?;
        scores.push(vertical_cup_to_disc_ratio(&mask));
    }

    let out = output_folder.join(VCDR_OUTPUT_DIR);
    fs::create_dir_all(&out)?;
    report::write_classification_results(
        &out.join(CLASSIFICATION_RESULTS_FILE),
        &gt.classification.filenames,
        &scores,
    )?;

    let performance =
        evaluate_aligned_scores(&scores, &gt.classification.labels, &ExportOptions::into_dir(out, false))?;
    tracing::info!(
        auc = performance.auc,
        reference_sensitivity = performance.reference_sensitivity,
        "vCDR baseline"
    );
    Ok(performance)
}
