//! Batch evaluation command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use fundus_eval::submission::{BatchEvaluator, RESULTS_TABLE_FILE, TaskStatus};
use fundus_eval::{GroundTruth, GroundTruthLayout};

pub fn run(
    submissions_folder: &Path,
    gt_folder: &Path,
    staging_folder: PathBuf,
    output_folder: PathBuf,
    is_training: bool,
    export_table: bool,
) -> Result<()> {
    let gt = GroundTruth::load(gt_folder, GroundTruthLayout::from_training_flag(is_training))?;

    let evaluator = BatchEvaluator::new(gt, staging_folder, output_folder.clone(), export_table);
    let (table, report) = evaluator.run(submissions_folder)?;

    let failed_tasks: usize = report
        .teams
        .iter()
        .map(|t| {
            [&t.segmentation, &t.classification, &t.fovea_location]
                .iter()
                .filter(|s| matches!(s, TaskStatus::Failed { .. }))
                .count()
        })
        .sum();

    println!("Evaluated {} submissions", table.len());
    if failed_tasks > 0 {
        println!("{failed_tasks} task evaluations failed; see the batch report for details");
    }
    println!(
        "Results table: {}",
        output_folder.join(RESULTS_TABLE_FILE).display()
    );

    Ok(())
}
