//! Submission handling: archive extraction, layout normalization and batch
//! evaluation.
//!
//! A batch run owns its staging folder exclusively: it is wiped at batch
//! start and repopulated per submission, one submission at a time. There is
//! no concurrent extraction or evaluation, so no locking is needed; a
//! parallel variant would require per-submission scratch directories.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::eval::{
    ExportOptions, evaluate_classification, evaluate_fovea_location, evaluate_segmentation,
};
use crate::gt::GroundTruth;
use crate::table::ResultsTable;

/// Submission subfolder holding the team's segmentation masks.
pub const SEGMENTATION_DIR: &str = "segmentation";
/// Submission file with (filename, score) classification rows.
pub const CLASSIFICATION_RESULTS_FILE: &str = "classification_results.csv";
/// Submission file with (filename, x, y) fovea rows.
pub const FOVEA_RESULTS_FILE: &str = "fovea_location_results.csv";
/// Legacy name for the fovea results file, still accepted.
pub const LEGACY_FOVEA_RESULTS_FILE: &str = "fovea_localization_results.csv";

/// Cross-team results table written at the end of a batch run.
pub const RESULTS_TABLE_FILE: &str = "table_of_results.csv";
/// Machine-readable run manifest written next to the results table.
pub const BATCH_REPORT_FILE: &str = "batch_report.json";

/// Folders created by archive tooling, never a submission root.
const METADATA_DIRS: &[&str] = &["__MACOSX"];

/// Determine the effective root of an extracted submission.
///
/// If none of the expected entries (`segmentation/`, the classification
/// CSV, the fovea CSV under either name) are present at the top level,
/// descend exactly one level, ignoring archive-tool metadata folders. More
/// than one candidate child, or none, fails with
/// [`Error::NormalizationFailed`]. This is deliberately not a recursive
/// search: only one level of indirection is tolerated.
pub fn effective_root(dir: &Path) -> Result<PathBuf> {
    if has_expected_entries(dir) {
        return Ok(dir.to_path_buf());
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || METADATA_DIRS.contains(&name) {
            continue;
        }
        if has_expected_entries(&path) {
            candidates.push(path);
        }
    }

    if candidates.len() == 1 {
        Ok(candidates.remove(0))
    } else {
        Err(Error::NormalizationFailed {
            root: dir.to_path_buf(),
        })
    }
}

fn has_expected_entries(dir: &Path) -> bool {
    dir.join(SEGMENTATION_DIR).is_dir()
        || dir.join(CLASSIFICATION_RESULTS_FILE).is_file()
        || dir.join(FOVEA_RESULTS_FILE).is_file()
        || dir.join(LEGACY_FOVEA_RESULTS_FILE).is_file()
}

/// Path of the fovea results file under `root`, preferring the current
/// name and falling back to the legacy one.
#[must_use]
pub fn fovea_results_path(root: &Path) -> PathBuf {
    let legacy = root.join(LEGACY_FOVEA_RESULTS_FILE);
    let current = root.join(FOVEA_RESULTS_FILE);
    if !current.is_file() && legacy.is_file() {
        legacy
    } else {
        current
    }
}

/// Extract a submission archive into `dest`.
pub fn extract_submission(archive: &Path, dest: &Path) -> Result<()> {
    let wrap = |reason: String| Error::Archive {
        path: archive.to_path_buf(),
        reason,
    };
    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| wrap(e.to_string()))?;
    zip.extract(dest).map_err(|e| wrap(e.to_string()))?;
    Ok(())
}

/// Outcome of one task for one team.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// The task evaluated normally.
    Ok,
    /// The task failed and its metrics were recorded as NaN.
    Failed {
        /// Diagnostic message.
        message: String,
    },
}

impl TaskStatus {
    fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => Self::Failed {
                message: e.to_string(),
            },
        }
    }
}

/// Per-team entry of the batch report.
#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    /// Team name (submission archive stem).
    pub team: String,
    /// Segmentation task outcome.
    pub segmentation: TaskStatus,
    /// Classification task outcome.
    pub classification: TaskStatus,
    /// Fovea-location task outcome.
    pub fovea_location: TaskStatus,
}

/// Machine-readable manifest of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// When the batch run finished.
    pub generated_at: DateTime<Utc>,
    /// One entry per evaluated submission, in evaluation order.
    pub teams: Vec<TeamReport>,
}

/// Evaluate all three tasks of one normalized submission, with per-task
/// failure containment.
///
/// Each task is attempted independently; an error in one task records NaN
/// for its metrics and a diagnostic in the report while the other tasks
/// still evaluate. The returned row matches [`ResultsTable::standard`]
/// column order.
pub fn evaluate_submission(
    team: &str,
    root: &Path,
    gt: &GroundTruth,
    options: &ExportOptions,
) -> (Vec<f64>, TeamReport) {
    let segmentation = evaluate_segmentation(&root.join(SEGMENTATION_DIR), gt, options);
    if let Err(e) = &segmentation {
        tracing::warn!(team, error = %e, "segmentation task failed");
    }
    let classification = evaluate_classification(
        &root.join(CLASSIFICATION_RESULTS_FILE),
        &gt.classification,
        options,
    );
    if let Err(e) = &classification {
        tracing::warn!(team, error = %e, "classification task failed");
    }
    let fovea = evaluate_fovea_location(&fovea_results_path(root), &gt.fovea, options);
    if let Err(e) = &fovea {
        tracing::warn!(team, error = %e, "fovea location task failed");
    }

    let report = TeamReport {
        team: team.to_string(),
        segmentation: TaskStatus::of(&segmentation),
        classification: TaskStatus::of(&classification),
        fovea_location: TaskStatus::of(&fovea),
    };

    let mut row = Vec::with_capacity(6);
    match segmentation {
        Ok(s) => row.extend([s.mean_cup_dice, s.mean_disc_dice, s.mae_cdr]),
        Err(_) => row.extend([f64::NAN; 3]),
    }
    match classification {
        Ok(c) => row.extend([c.auc, c.reference_sensitivity]),
        Err(_) => row.extend([f64::NAN; 2]),
    }
    match fovea {
        Ok(f) => row.push(f.mean_distance),
        Err(_) => row.push(f64::NAN),
    }

    (row, report)
}

/// Sequential batch evaluator over a folder of submission archives.
pub struct BatchEvaluator {
    gt: GroundTruth,
    staging_folder: PathBuf,
    output_folder: PathBuf,
    export_table: bool,
}

impl BatchEvaluator {
    /// Create a batch evaluator. Ground truth must already be loaded; a
    /// missing or unreadable ground-truth package is a fatal error at load
    /// time, before any submission is touched.
    #[must_use]
    pub fn new(
        gt: GroundTruth,
        staging_folder: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
        export_table: bool,
    ) -> Self {
        Self {
            gt,
            staging_folder: staging_folder.into(),
            output_folder: output_folder.into(),
            export_table,
        }
    }

    /// Evaluate every `*.zip` in `submissions_folder`, in sorted filename
    /// order, and write `table_of_results.csv` plus `batch_report.json` to
    /// the output folder.
    ///
    /// The staging folder is wiped at the start of the run. Per-team task
    /// failures are contained as NaN cells; archive or normalization
    /// failures fail all three of that team's tasks. The batch itself only
    /// fails on I/O errors touching the run's own folders.
    pub fn run(&self, submissions_folder: &Path) -> Result<(ResultsTable, BatchReport)> {
        let archives = list_archives(submissions_folder)?;

        if self.staging_folder.exists() {
            fs::remove_dir_all(&self.staging_folder)?;
        }
        fs::create_dir_all(&self.staging_folder)?;
        fs::create_dir_all(&self.output_folder)?;

        let mut table = ResultsTable::standard();
        let mut reports = Vec::with_capacity(archives.len());

        for archive in &archives {
            let team = archive
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
            tracing::info!(team, "evaluating submission");

            let extracted = self.staging_folder.join(&team);
            let options =
                ExportOptions::into_dir(self.output_folder.join(&team), self.export_table);

            let root = extract_submission(archive, &extracted)
                .and_then(|()| effective_root(&extracted));
            let (row, report) = match root {
                Ok(root) => evaluate_submission(&team, &root, &self.gt, &options),
                Err(e) => {
                    tracing::warn!(team, error = %e, "submission could not be unpacked");
                    let failed = TaskStatus::Failed {
                        message: e.to_string(),
                    };
                    (
                        vec![f64::NAN; 6],
                        TeamReport {
                            team: team.clone(),
                            segmentation: failed.clone(),
                            classification: failed.clone(),
                            fovea_location: failed,
                        },
                    )
                }
            };

            table.push_row(team, row)?;
            reports.push(report);
        }

        let report = BatchReport {
            generated_at: Utc::now(),
            teams: reports,
        };

        table.write_csv(self.output_folder.join(RESULTS_TABLE_FILE))?;
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(self.output_folder.join(BATCH_REPORT_FILE), json)?;

        Ok((table, report))
    }
}

fn list_archives(submissions_folder: &Path) -> Result<Vec<PathBuf>> {
    if !submissions_folder.is_dir() {
        return Err(Error::MissingFile {
            path: submissions_folder.to_path_buf(),
        });
    }
    let mut archives = Vec::new();
    for entry in fs::read_dir(submissions_folder)? {
        let path = entry?.path();
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if path.is_file() && is_zip {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}
