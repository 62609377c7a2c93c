//! Ground-truth loading.
//!
//! The ground-truth package comes in two layouts, selected by the
//! `--is_training` CLI flag:
//!
//! - **Evaluation**: classification labels in `GT.xlsx`, fovea annotations
//!   in `Fovea_location.xlsx`, disc/cup masks flat under `Disc_Cup_Masks/`.
//! - **Training**: masks split into `Disc_Cup_Masks/Glaucoma/` and
//!   `Disc_Cup_Masks/Non-Glaucoma/`; classification labels are derived from
//!   that folder membership instead of a spreadsheet.
//!
//! A ground-truth file missing from disk is a fatal error: the system cannot
//! score a task without its ground truth and never fabricates values.

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Reader, open_workbook_auto};

use crate::error::{Error, Result};
use crate::metrics::fovea::Point;
use crate::metrics::segmentation::LabelMask;

/// Subfolder of the ground-truth package holding disc/cup masks.
pub const DISC_CUP_MASKS_DIR: &str = "Disc_Cup_Masks";
/// Training-layout subfolder for glaucomatous eyes.
pub const GLAUCOMA_DIR: &str = "Glaucoma";
/// Training-layout subfolder for healthy eyes.
pub const NON_GLAUCOMA_DIR: &str = "Non-Glaucoma";
/// Classification label spreadsheet (evaluation layout).
pub const CLASSIFICATION_GT_FILE: &str = "GT.xlsx";
/// Fovea annotation spreadsheet.
pub const FOVEA_GT_FILE: &str = "Fovea_location.xlsx";

/// Extensions accepted for label-mask files.
const MASK_EXTENSIONS: &[&str] = &["bmp", "png", "jpg", "jpeg", "tif", "tiff"];

/// How the ground-truth package is organized on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTruthLayout {
    /// Masks split into Glaucoma / Non-Glaucoma subfolders; labels derived
    /// from folder membership.
    Training,
    /// Flat mask folder plus label and fovea spreadsheets.
    Evaluation,
}

impl GroundTruthLayout {
    /// Map the CLI `--is_training` flag to a layout.
    #[must_use]
    pub fn from_training_flag(is_training: bool) -> Self {
        if is_training {
            Self::Training
        } else {
            Self::Evaluation
        }
    }
}

/// Binary glaucoma labels, aligned with `filenames`.
#[derive(Debug, Clone)]
pub struct ClassificationLabels {
    /// Ground-truth image filenames, in scoring order.
    pub filenames: Vec<String>,
    /// True where the eye is glaucomatous.
    pub labels: Vec<bool>,
}

/// Ground-truth fovea coordinates, aligned with `filenames`.
#[derive(Debug, Clone)]
pub struct FoveaAnnotations {
    /// Ground-truth image filenames, in scoring order.
    pub filenames: Vec<String>,
    /// Fovea center per image.
    pub points: Vec<Point>,
}

/// Everything the evaluators need from the ground-truth package, loaded
/// once per run.
#[derive(Debug, Clone)]
pub struct GroundTruth {
    /// Root of the ground-truth package.
    pub folder: PathBuf,
    /// On-disk layout.
    pub layout: GroundTruthLayout,
    /// Classification labels.
    pub classification: ClassificationLabels,
    /// Fovea annotations.
    pub fovea: FoveaAnnotations,
}

impl GroundTruth {
    /// Load labels and annotations and verify the mask folder exists.
    pub fn load(folder: &Path, layout: GroundTruthLayout) -> Result<Self> {
        let masks = folder.join(DISC_CUP_MASKS_DIR);
        if !masks.is_dir() {
            return Err(Error::MissingFile { path: masks });
        }
        Ok(Self {
            folder: folder.to_path_buf(),
            layout,
            classification: classification_labels(folder, layout)?,
            fovea: fovea_annotations(folder)?,
        })
    }

    /// The disc/cup mask folder of this package.
    #[must_use]
    pub fn mask_folder(&self) -> PathBuf {
        self.folder.join(DISC_CUP_MASKS_DIR)
    }
}

/// Load binary glaucoma labels for the given layout.
///
/// Evaluation reads `GT.xlsx` (first worksheet, header row, columns
/// filename and label). Training lists the Glaucoma / Non-Glaucoma mask
/// subfolders and labels each file by membership.
pub fn classification_labels(
    gt_folder: &Path,
    layout: GroundTruthLayout,
) -> Result<ClassificationLabels> {
    match layout {
        GroundTruthLayout::Evaluation => {
            let path = gt_folder.join(CLASSIFICATION_GT_FILE);
            let mut filenames = Vec::new();
            let mut labels = Vec::new();
            for row in read_sheet_rows(&path)? {
                let Some(filename) = cell_string(row.first()) else {
                    continue;
                };
                let label = cell_f64(row.get(1)).ok_or_else(|| Error::Spreadsheet {
                    path: path.clone(),
                    reason: format!("non-numeric label for {filename}"),
                })?;
                filenames.push(filename);
                labels.push(label != 0.0);
            }
            Ok(ClassificationLabels { filenames, labels })
        }
        GroundTruthLayout::Training => {
            let masks = gt_folder.join(DISC_CUP_MASKS_DIR);
            let mut entries: Vec<(String, bool)> = Vec::new();
            for (subdir, label) in [(GLAUCOMA_DIR, true), (NON_GLAUCOMA_DIR, false)] {
                for filename in list_mask_files(&masks.join(subdir))? {
                    entries.push((filename, label));
                }
            }
            entries.sort();
            let (filenames, labels) = entries.into_iter().unzip();
            Ok(ClassificationLabels { filenames, labels })
        }
    }
}

/// Load fovea annotations from `Fovea_location.xlsx` (first worksheet,
/// header row, columns filename, x, y).
pub fn fovea_annotations(gt_folder: &Path) -> Result<FoveaAnnotations> {
    let path = gt_folder.join(FOVEA_GT_FILE);
    let mut filenames = Vec::new();
    let mut points = Vec::new();
    for row in read_sheet_rows(&path)? {
        let Some(filename) = cell_string(row.first()) else {
            continue;
        };
        let x = cell_f64(row.get(1));
        let y = cell_f64(row.get(2));
        let (Some(x), Some(y)) = (x, y) else {
            return Err(Error::Spreadsheet {
                path: path.clone(),
                reason: format!("non-numeric fovea coordinates for {filename}"),
            });
        };
        filenames.push(filename);
        points.push(Point::new(x, y));
    }
    Ok(FoveaAnnotations { filenames, points })
}

/// List the ground-truth mask filenames to score, sorted for determinism.
pub fn list_gt_mask_filenames(masks_folder: &Path, layout: GroundTruthLayout) -> Result<Vec<String>> {
    let mut filenames = match layout {
        GroundTruthLayout::Evaluation => list_mask_files(masks_folder)?,
        GroundTruthLayout::Training => {
            let mut all = list_mask_files(&masks_folder.join(GLAUCOMA_DIR))?;
            all.extend(list_mask_files(&masks_folder.join(NON_GLAUCOMA_DIR))?);
            all
        }
    };
    filenames.sort();
    Ok(filenames)
}

/// Resolve a ground-truth mask path for `filename`, tolerating extension
/// differences (a `.jpg`-named annotation row matches a `.bmp` mask).
///
/// In the training layout the Glaucoma folder is consulted first, then
/// Non-Glaucoma. Fails with [`Error::MissingFile`] when no candidate exists.
pub fn find_gt_mask(
    masks_folder: &Path,
    layout: GroundTruthLayout,
    filename: &str,
) -> Result<PathBuf> {
    let candidates = match layout {
        GroundTruthLayout::Evaluation => vec![masks_folder.to_path_buf()],
        GroundTruthLayout::Training => vec![
            masks_folder.join(GLAUCOMA_DIR),
            masks_folder.join(NON_GLAUCOMA_DIR),
        ],
    };
    for dir in &candidates {
        if let Some(path) = find_by_stem(dir, filename)? {
            return Ok(path);
        }
    }
    Err(Error::MissingFile {
        path: masks_folder.join(filename),
    })
}

/// Find a mask file in `dir` whose stem matches `filename`'s stem.
pub fn find_by_stem(dir: &Path, filename: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let target = stem_of(filename);
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !has_mask_extension(&path) {
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| stem_of(name) == target)
        {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Load an 8-bit grayscale label mask from disk.
pub fn load_mask(path: &Path) -> Result<LabelMask> {
    let img = image::open(path).map_err(|e| Error::MaskLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let gray = img.to_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    LabelMask::new(width, height, gray.into_raw())
}

/// Filename without its final extension.
pub fn stem_of(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

fn has_mask_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MASK_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn list_mask_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(Error::MissingFile {
            path: dir.to_path_buf(),
        });
    }
    let mut filenames = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_mask_extension(&path) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                filenames.push(name.to_string());
            }
        }
    }
    Ok(filenames)
}

fn read_sheet_rows(path: &Path) -> Result<Vec<Vec<Data>>> {
    if !path.exists() {
        return Err(Error::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::Spreadsheet {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Spreadsheet {
            path: path.to_path_buf(),
            reason: "workbook has no worksheets".to_string(),
        })?
        .map_err(|e| Error::Spreadsheet {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    // Skip the header row.
    Ok(range.rows().skip(1).map(<[Data]>::to_vec).collect())
}

fn cell_string(cell: Option<&Data>) -> Option<String> {
    let cell = cell?;
    if cell.is_empty() {
        return None;
    }
    cell.as_string().filter(|s| !s.trim().is_empty())
}

fn cell_f64(cell: Option<&Data>) -> Option<f64> {
    cell?.as_f64()
}
