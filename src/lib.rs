//! # fundus-eval
//!
//! Evaluation and leaderboard engine for a retinal fundus image analysis
//! challenge with three tasks: optic disc/cup segmentation, glaucoma
//! classification, and fovea localization.
//!
//! The library compares algorithm outputs against ground-truth annotations,
//! computes per-task metrics, aggregates them into a cross-team results
//! table, and generates weighted leaderboards. It only scores externally
//! produced predictions; no model is trained or run here.
//!
//! ## Pipeline
//!
//! ```rust,ignore
//! use fundus_eval::{BatchEvaluator, GroundTruth, GroundTruthLayout, leaderboard};
//!
//! let gt = GroundTruth::load(gt_folder, GroundTruthLayout::Evaluation)?;
//! let evaluator = BatchEvaluator::new(gt, staging_folder, output_folder, true);
//! let (table, _report) = evaluator.run(submissions_folder)?;
//!
//! for kind in leaderboard::LeaderboardKind::ALL {
//!     let board = leaderboard::generate(kind, &table)?;
//!     board.write_csv(output_folder.join(kind.output_filename()))?;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`metrics`]: Pure metric primitives (Dice, vCDR, ROC/AUC, distance)
//! - [`gt`]: Ground-truth loading for both package layouts
//! - [`eval`]: Per-task evaluators and report writers
//! - [`submission`]: Archive extraction, normalization, batch evaluation
//! - [`table`]: The cross-team results table
//! - [`leaderboard`]: Ranking and leaderboard generation
//! - [`baseline`]: Reference baselines (score ensembling, ground-truth vCDR)

pub mod baseline;
pub mod error;
pub mod eval;
pub mod gt;
pub mod leaderboard;
pub mod metrics;
pub mod submission;
pub mod table;

// Re-export commonly used types
pub use error::{Error, Result};
pub use eval::{
    ClassificationPerformance, ExportOptions, FoveaPerformance, SegmentationPerformance,
};
pub use gt::{GroundTruth, GroundTruthLayout};
pub use leaderboard::{Leaderboard, LeaderboardKind};
pub use submission::{BatchEvaluator, BatchReport, TaskStatus, TeamReport};
pub use table::ResultsTable;
