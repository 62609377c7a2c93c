//! fundus-eval CLI - challenge submission scoring tool

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Parse the literal strings `True` / `False`, case-insensitively.
///
/// Kept for compatibility with existing scoring scripts that pass
/// `--is_training True` rather than a bare switch.
fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("expected True or False, got {raw:?}")),
    }
}

/// Challenge submission evaluation and leaderboard tool.
#[derive(Parser)]
#[command(name = "fundus-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one already-extracted submission
    Single {
        /// Full path to the submitted results
        results_folder: PathBuf,

        /// Full path to the ground truth files
        gt_folder: PathBuf,

        /// Folder where the results will be saved; not saved if omitted
        #[arg(long = "output_folder")]
        output_folder: Option<PathBuf>,

        /// Whether the per-image table will be exported or not
        #[arg(long = "export_table", value_parser = parse_flag, default_value = "False")]
        export_table: bool,

        /// Whether the evaluation is performed on training data or not
        #[arg(long = "is_training", value_parser = parse_flag, default_value = "False")]
        is_training: bool,
    },

    /// Evaluate a folder of submission archives and write the results table
    Batch {
        /// Full path to the folder with the submitted zip files
        submissions_folder: PathBuf,

        /// Full path to the ground truth files
        gt_folder: PathBuf,

        /// Scratch folder for uncompressed submissions (wiped per run)
        staging_folder: PathBuf,

        /// Folder where the results will be saved
        output_folder: PathBuf,

        /// Whether the evaluation is performed on training data or not
        #[arg(long = "is_training", value_parser = parse_flag, default_value = "False")]
        is_training: bool,

        /// Whether the per-image tables will be exported or not
        #[arg(long = "export_table", value_parser = parse_flag, default_value = "True")]
        export_table: bool,
    },

    /// Generate the four leaderboards from a results table
    Leaderboards {
        /// Full path and filename of the results table CSV
        results_table: PathBuf,

        /// Folder where the leaderboard CSVs will be saved
        output_folder: PathBuf,
    },

    /// Score the ground-truth vertical cup-to-disc ratio as a classifier
    VcdrBaseline {
        /// Full path to the ground truth files
        gt_folder: PathBuf,

        /// Folder where the baseline results will be saved
        output_folder: PathBuf,

        /// Whether the evaluation is performed on training data or not
        #[arg(long = "is_training", value_parser = parse_flag, default_value = "False")]
        is_training: bool,
    },

    /// Score an ensemble of top-ranked teams' classification results
    Ensemble {
        /// Folder with one subfolder of classification results per team
        ensemble_folder: PathBuf,

        /// Full path to the ground truth files
        gt_folder: PathBuf,

        /// Folder where the ensemble results will be saved
        output_folder: PathBuf,

        /// Whether the evaluation is performed on training data or not
        #[arg(long = "is_training", value_parser = parse_flag, default_value = "False")]
        is_training: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Single {
            results_folder,
            gt_folder,
            output_folder,
            export_table,
            is_training,
        } => commands::single::run(
            &results_folder,
            &gt_folder,
            output_folder.as_deref(),
            export_table,
            is_training,
        ),
        Commands::Batch {
            submissions_folder,
            gt_folder,
            staging_folder,
            output_folder,
            is_training,
            export_table,
        } => commands::batch::run(
            &submissions_folder,
            &gt_folder,
            staging_folder,
            output_folder,
            is_training,
            export_table,
        ),
        Commands::Leaderboards {
            results_table,
            output_folder,
        } => commands::leaderboards::run(&results_table, &output_folder),
        Commands::VcdrBaseline {
            gt_folder,
            output_folder,
            is_training,
        } => commands::baselines::run_vcdr(&gt_folder, &output_folder, is_training),
        Commands::Ensemble {
            ensemble_folder,
            gt_folder,
            output_folder,
            is_training,
        } => commands::baselines::run_ensemble(
            &ensemble_folder,
            &gt_folder,
            &output_folder,
            is_training,
        ),
    }
}
