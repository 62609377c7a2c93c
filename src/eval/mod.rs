//! Per-task evaluators.
//!
//! One evaluator per challenge task:
//!
//! - [`segmentation::evaluate_segmentation`]: disc/cup Dice and vCDR error
//! - [`classification::evaluate_classification`]: ROC/AUC and reference sensitivity
//! - [`fovea::evaluate_fovea_location`]: mean Euclidean localization distance
//!
//! Every evaluator reorders predictions to the ground-truth filename order
//! before scoring. Prediction order is untrusted: rows are looked up by
//! filename, and a ground-truth image without a matching prediction fails
//! the task with [`Error::MissingPrediction`].

pub mod classification;
pub mod fovea;
pub mod report;
pub mod segmentation;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::gt::stem_of;

pub use classification::{ClassificationPerformance, evaluate_classification};
pub use fovea::{FoveaPerformance, evaluate_fovea_location};
pub use segmentation::{SegmentationPerformance, evaluate_segmentation};

/// Where (and how much) an evaluator writes next to its return value.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Folder for this submission's output files; nothing is written when
    /// absent.
    pub output_dir: Option<PathBuf>,
    /// Also write per-image detail tables, in addition to summaries.
    pub export_table: bool,
}

impl ExportOptions {
    /// Export summaries (and detail tables if `export_table`) into `dir`.
    #[must_use]
    pub fn into_dir(dir: impl Into<PathBuf>, export_table: bool) -> Self {
        Self {
            output_dir: Some(dir.into()),
            export_table,
        }
    }
}

/// Reorder `values` so that position `i` holds the value whose filename
/// matches `target_filenames[i]`.
///
/// Matching is by filename stem, so `T0001.jpg` pairs with `T0001.bmp`.
/// Fails with [`Error::ShapeMismatch`] when `filenames` and `values`
/// disagree in length, and with [`Error::MissingPrediction`] when a target
/// filename has no match.
pub fn sort_by_filename<T: Clone>(
    target_filenames: &[String],
    filenames: &[String],
    values: &[T],
) -> Result<Vec<T>> {
    if filenames.len() != values.len() {
        return Err(Error::ShapeMismatch {
            expected: filenames.len(),
            actual: values.len(),
        });
    }

    let by_stem: HashMap<&str, &T> = filenames
        .iter()
        .zip(values)
        .map(|(f, v)| (stem_of(f), v))
        .collect();

    target_filenames
        .iter()
        .map(|target| {
            by_stem
                .get(stem_of(target))
                .map(|v| (*v).clone())
                .ok_or_else(|| Error::MissingPrediction {
                    filename: target.clone(),
                })
        })
        .collect()
}
