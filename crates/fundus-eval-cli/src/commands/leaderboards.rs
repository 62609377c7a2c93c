//! Leaderboard generation command.

use std::path::Path;

use anyhow::{Result, bail};
use fundus_eval::leaderboard::{self, LeaderboardKind};
use fundus_eval::table::ResultsTable;

pub fn run(results_table: &Path, output_folder: &Path) -> Result<()> {
    let table = ResultsTable::read_csv(results_table)?;
    std::fs::create_dir_all(output_folder)?;

    // The four leaderboards are generated independently: one failing does
    // not block the others.
    let mut failures = Vec::new();
    for kind in LeaderboardKind::ALL {
        let filename = kind.output_filename();
        match leaderboard::generate(kind, &table) {
            Ok(board) => {
                board.write_csv(output_folder.join(filename))?;
                println!("{filename}: {} teams", board.teams.len());
            }
            Err(e) => {
                tracing::error!(leaderboard = filename, error = %e, "leaderboard failed");
                failures.push(filename);
            }
        }
    }

    if !failures.is_empty() {
        bail!("failed to generate: {}", failures.join(", "));
    }
    Ok(())
}
