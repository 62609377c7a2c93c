//! Reference-baseline commands.

use std::path::Path;

use anyhow::Result;
use fundus_eval::baseline;
use fundus_eval::{GroundTruth, GroundTruthLayout};

pub fn run_vcdr(gt_folder: &Path, output_folder: &Path, is_training: bool) -> Result<()> {
    let gt = GroundTruth::load(gt_folder, GroundTruthLayout::from_training_flag(is_training))?;
    let performance = baseline::evaluate_vcdr_baseline(&gt, output_folder)?;

    println!("vCDR baseline");
    println!("  AUC: {:.4}", performance.auc);
    println!("  Reference sensitivity: {:.4}", performance.reference_sensitivity);
    Ok(())
}

pub fn run_ensemble(
    ensemble_folder: &Path,
    gt_folder: &Path,
    output_folder: &Path,
    is_training: bool,
) -> Result<()> {
    let gt = GroundTruth::load(gt_folder, GroundTruthLayout::from_training_flag(is_training))?;
    let performance = baseline::evaluate_ensemble(ensemble_folder, &gt, output_folder)?;

    println!("Ensemble baseline");
    println!("  AUC: {:.4}", performance.auc);
    println!("  Reference sensitivity: {:.4}", performance.reference_sensitivity);
    Ok(())
}
