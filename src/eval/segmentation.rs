//! Optic disc/cup segmentation evaluator.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::eval::{ExportOptions, report};
use crate::gt::{self, GroundTruth};
use crate::metrics::segmentation::{dice, vertical_cup_to_disc_ratio};
use crate::metrics::mean;

/// Mean segmentation scores across all ground-truth images.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentationPerformance {
    /// Mean Dice coefficient for the optic cup.
    pub mean_cup_dice: f64,
    /// Mean Dice coefficient for the optic disc.
    pub mean_disc_dice: f64,
    /// Mean absolute error of the vertical cup-to-disc ratio.
    pub mae_cdr: f64,
}

/// Evaluate a team's segmentation masks against the ground truth.
///
/// Iterates the ground-truth mask set (the prediction folder may hold more;
/// extras are ignored), looks up each team mask by filename stem, and
/// computes per-image cup/disc Dice plus absolute vCDR error. A
/// ground-truth image with no team mask fails with
/// [`Error::MissingPrediction`].
pub fn evaluate_segmentation(
    segmentation_folder: &Path,
    gt: &GroundTruth,
    options: &ExportOptions,
) -> Result<SegmentationPerformance> {
    if !segmentation_folder.is_dir() {
        return Err(Error::MissingFile {
            path: segmentation_folder.to_path_buf(),
        });
    }

    let masks_folder = gt.mask_folder();
    let gt_filenames = gt::list_gt_mask_filenames(&masks_folder, gt.layout)?;
    if gt_filenames.is_empty() {
        return Err(Error::DegenerateInput(format!(
            "no ground-truth masks under {}",
            masks_folder.display()
        )));
    }

    let mut cup_dices = Vec::with_capacity(gt_filenames.len());
    let mut disc_dices = Vec::with_capacity(gt_filenames.len());
    let mut ae_cdrs = Vec::with_capacity(gt_filenames.len());

    for filename in &gt_filenames {
        let gt_mask = gt::load_mask(&gt::find_gt_mask(&masks_folder, gt.layout, filename)?)?;
        let predicted_path = gt::find_by_stem(segmentation_folder, filename)?.ok_or_else(|| {
            Error::MissingPrediction {
                filename: filename.clone(),
            }
        })?;
        let predicted = gt::load_mask(&predicted_path)?;

        let cup_dice = dice(&predicted.cup_region(), &gt_mask.cup_region())?;
        let disc_dice = dice(&predicted.disc_region(), &gt_mask.disc_region())?;
        let ae_cdr =
            (vertical_cup_to_disc_ratio(&predicted) - vertical_cup_to_disc_ratio(&gt_mask)).abs();

        tracing::debug!(%filename, cup_dice, disc_dice, ae_cdr, "segmentation scores");

        cup_dices.push(cup_dice);
        disc_dices.push(disc_dice);
        ae_cdrs.push(ae_cdr);
    }

    let performance = SegmentationPerformance {
        mean_cup_dice: mean(&cup_dices),
        mean_disc_dice: mean(&disc_dices),
        mae_cdr: mean(&ae_cdrs),
    };

    if let Some(dir) = &options.output_dir {
        fs::create_dir_all(dir)?;
        if options.export_table {
            report::write_segmentation_table(
                &dir.join(report::SEGMENTATION_TABLE_FILE),
                &gt_filenames,
                &cup_dices,
                &disc_dices,
                &ae_cdrs,
            )?;
        }
        report::write_segmentation_summary(
            &dir.join(report::SEGMENTATION_SUMMARY_FILE),
            &performance,
        )?;
    }

    Ok(performance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gt::{DISC_CUP_MASKS_DIR, GroundTruthLayout};
    use crate::metrics::segmentation::{BACKGROUND_LABEL, CUP_LABEL, DISC_LABEL};
    use image::{GrayImage, Luma};
    use std::path::PathBuf;

    /// 4x4 mask: disc fills the two middle columns, cup the middle rows of
    /// those columns.
    fn write_mask(path: &Path, cup_rows: std::ops::Range<u32>) {
        let img = GrayImage::from_fn(4, 4, |x, y| {
            if (1..3).contains(&x) {
                if cup_rows.contains(&y) {
                    Luma([CUP_LABEL])
                } else {
                    Luma([DISC_LABEL])
                }
            } else {
                Luma([BACKGROUND_LABEL])
            }
        });
        img.save(path).unwrap();
    }

    fn fixture(dir: &Path) -> (PathBuf, GroundTruth) {
        let gt_masks = dir.join("gt").join(DISC_CUP_MASKS_DIR);
        let submission = dir.join("submission").join("segmentation");
        fs::create_dir_all(&gt_masks).unwrap();
        fs::create_dir_all(&submission).unwrap();

        write_mask(&gt_masks.join("t0001.png"), 1..3);
        write_mask(&submission.join("t0001.png"), 1..3);

        let gt = GroundTruth {
            folder: dir.join("gt"),
            layout: GroundTruthLayout::Evaluation,
            classification: crate::gt::ClassificationLabels {
                filenames: vec![],
                labels: vec![],
            },
            fovea: crate::gt::FoveaAnnotations {
                filenames: vec![],
                points: vec![],
            },
        };
        (submission, gt)
    }

    #[test]
    fn test_identical_masks_score_perfectly() {
        let dir = tempfile::tempdir().unwrap();
        let (submission, gt) = fixture(dir.path());

        let perf =
            evaluate_segmentation(&submission, &gt, &ExportOptions::default()).unwrap();
        assert_eq!(perf.mean_cup_dice, 1.0);
        assert_eq!(perf.mean_disc_dice, 1.0);
        assert_eq!(perf.mae_cdr, 0.0);
    }

    #[test]
    fn test_cdr_error_reflects_cup_difference() {
        let dir = tempfile::tempdir().unwrap();
        let (submission, gt) = fixture(dir.path());
        // Overwrite the prediction with a taller cup: 4 rows instead of 2.
        write_mask(&submission.join("t0001.png"), 0..4);

        let perf =
            evaluate_segmentation(&submission, &gt, &ExportOptions::default()).unwrap();
        // GT vCDR = 2/4, predicted vCDR = 4/4.
        assert!((perf.mae_cdr - 0.5).abs() < 1e-12);
        assert_eq!(perf.mean_disc_dice, 1.0);
        assert!(perf.mean_cup_dice < 1.0);
    }

    #[test]
    fn test_missing_prediction_mask() {
        let dir = tempfile::tempdir().unwrap();
        let (submission, gt) = fixture(dir.path());
        fs::remove_file(submission.join("t0001.png")).unwrap();

        let err =
            evaluate_segmentation(&submission, &gt, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingPrediction { .. }));
    }

    #[test]
    fn test_detail_table_exported_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let (submission, gt) = fixture(dir.path());
        let out = dir.path().join("out");

        evaluate_segmentation(&submission, &gt, &ExportOptions::into_dir(&out, true)).unwrap();
        assert!(out.join(report::SEGMENTATION_TABLE_FILE).exists());
        assert!(out.join(report::SEGMENTATION_SUMMARY_FILE).exists());
    }
}
