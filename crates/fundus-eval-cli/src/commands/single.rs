//! Single-submission evaluation command.

use std::path::Path;

use anyhow::Result;
use fundus_eval::submission::{self, TaskStatus};
use fundus_eval::{ExportOptions, GroundTruth, GroundTruthLayout};

pub fn run(
    results_folder: &Path,
    gt_folder: &Path,
    output_folder: Option<&Path>,
    export_table: bool,
    is_training: bool,
) -> Result<()> {
    let gt = GroundTruth::load(gt_folder, GroundTruthLayout::from_training_flag(is_training))?;
    let root = submission::effective_root(results_folder)?;

    let team = results_folder
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("submission");
    let options = ExportOptions {
        output_dir: output_folder.map(Path::to_path_buf),
        export_table,
    };

    let (row, report) = submission::evaluate_submission(team, &root, &gt, &options);

    println!("{team}");
    println!("{:-<40}", "");
    print_task("Segmentation", &report.segmentation);
    if matches!(report.segmentation, TaskStatus::Ok) {
        println!("  Mean optic cup Dice:  {:.4}", row[0]);
        println!("  Mean optic disc Dice: {:.4}", row[1]);
        println!("  MAE cup to disc ratio: {:.4}", row[2]);
    }
    print_task("Classification", &report.classification);
    if matches!(report.classification, TaskStatus::Ok) {
        println!("  AUC: {:.4}", row[3]);
        println!("  Reference sensitivity: {:.4}", row[4]);
    }
    print_task("Fovea location", &report.fovea_location);
    if matches!(report.fovea_location, TaskStatus::Ok) {
        println!("  Mean Euclidean distance: {:.2}", row[5]);
    }

    Ok(())
}

fn print_task(name: &str, status: &TaskStatus) {
    match status {
        TaskStatus::Ok => println!("{name}:"),
        TaskStatus::Failed { message } => println!("{name}: not scored ({message})"),
    }
}
