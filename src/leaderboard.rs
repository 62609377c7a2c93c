//! Leaderboard engine.
//!
//! Each leaderboard is a pure function of a serialized [`ResultsTable`]:
//! generation reads the table back from disk and holds no memory of the
//! batch run that produced it. Teams with NaN in a ranking metric are
//! dropped from that leaderboard entirely, not ranked last; they remain in
//! the table and may still appear on leaderboards keyed on other metrics.
//!
//! Ranks are 1-based. Ties are broken alphabetically by team name, so a
//! leaderboard is a deterministic function of the table contents regardless
//! of row order.

use std::cmp::Ordering;
use std::path::Path;

use crate::error::{Error, Result};
use crate::table::{ResultsTable, columns};

/// Weight of the optic-cup Dice rank in the segmentation composite.
pub const CUP_DICE_WEIGHT: f64 = 0.35;
/// Weight of the optic-disc Dice rank in the segmentation composite.
pub const DISC_DICE_WEIGHT: f64 = 0.25;
/// Weight of the vCDR error rank in the segmentation composite.
pub const CDR_MAE_WEIGHT: f64 = 0.40;

/// Weight of the segmentation position in the final leaderboard.
pub const SEGMENTATION_WEIGHT: f64 = 0.6;
/// Weight of the classification position in the final leaderboard.
pub const CLASSIFICATION_WEIGHT: f64 = 0.4;

/// The four leaderboards of the challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardKind {
    /// Weighted composite of cup Dice, disc Dice and vCDR error ranks.
    Segmentation,
    /// AUC, highest first.
    Classification,
    /// Mean Euclidean distance, lowest first.
    FoveaLocation,
    /// Weighted combination of the segmentation and classification
    /// leaderboard positions.
    Final,
}

impl LeaderboardKind {
    /// All four kinds, in the order they are conventionally generated.
    pub const ALL: [Self; 4] = [
        Self::Segmentation,
        Self::Classification,
        Self::FoveaLocation,
        Self::Final,
    ];

    /// Conventional output filename for this leaderboard.
    #[must_use]
    pub fn output_filename(self) -> &'static str {
        match self {
            Self::Segmentation => "segmentation_leaderboard.csv",
            Self::Classification => "classification_leaderboard.csv",
            Self::FoveaLocation => "fovea_location_leaderboard.csv",
            Self::Final => "final_leaderboard.csv",
        }
    }
}

/// A ranked team list under one scoring criterion.
///
/// Produced fresh per generation and never mutated in place. `rows[i]`
/// holds the score columns for `teams[i]`, matching `header[1..]`.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    /// Column names, starting with `Team`.
    pub header: Vec<String>,
    /// Teams in leaderboard order, best first.
    pub teams: Vec<String>,
    /// Score columns per team.
    pub rows: Vec<Vec<f64>>,
}

impl Leaderboard {
    /// 1-based position of a team, if ranked.
    #[must_use]
    pub fn position(&self, team: &str) -> Option<usize> {
        self.teams.iter().position(|t| t == team).map(|i| i + 1)
    }

    /// Write the leaderboard as CSV.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        writer.write_record(&self.header)?;
        for (team, row) in self.teams.iter().zip(&self.rows) {
            let mut record = vec![team.clone()];
            record.extend(row.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Generate one leaderboard from a results table.
pub fn generate(kind: LeaderboardKind, table: &ResultsTable) -> Result<Leaderboard> {
    match kind {
        LeaderboardKind::Segmentation => segmentation_leaderboard(table),
        LeaderboardKind::Classification => classification_leaderboard(table),
        LeaderboardKind::FoveaLocation => fovea_location_leaderboard(table),
        LeaderboardKind::Final => final_leaderboard(table),
    }
}

/// One team's values restricted to the columns a leaderboard ranks on.
struct Contender {
    team: String,
    values: Vec<f64>,
}

/// Pull the named columns out of the table and drop every team with NaN in
/// any of them.
fn contenders(table: &ResultsTable, metric_names: &[&str]) -> Result<Vec<Contender>> {
    let columns: Vec<Vec<f64>> = metric_names
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<_>>()?;

    Ok(table
        .teams()
        .iter()
        .enumerate()
        .filter_map(|(i, team)| {
            let values: Vec<f64> = columns.iter().map(|col| col[i]).collect();
            if values.iter().any(|v| v.is_nan()) {
                None
            } else {
                Some(Contender {
                    team: team.clone(),
                    values,
                })
            }
        })
        .collect())
}

/// Sort direction for one ranking criterion.
#[derive(Clone, Copy)]
enum Direction {
    /// Lower values rank first.
    BestIsLowest,
    /// Higher values rank first.
    BestIsHighest,
}

/// 1-based ranks for `contenders`, aligned with their input order, ranking
/// on value column `column`. Equal values rank in alphabetical team order.
fn rank(contenders: &[Contender], column: usize, direction: Direction) -> Vec<f64> {
    let mut order: Vec<usize> = (0..contenders.len()).collect();
    order.sort_by(|&a, &b| {
        let (va, vb) = (contenders[a].values[column], contenders[b].values[column]);
        let by_value = match direction {
            Direction::BestIsLowest => va.partial_cmp(&vb),
            Direction::BestIsHighest => vb.partial_cmp(&va),
        };
        by_value
            .unwrap_or(Ordering::Equal)
            .then_with(|| contenders[a].team.cmp(&contenders[b].team))
    });

    let mut ranks = vec![0.0; contenders.len()];
    for (position, idx) in order.into_iter().enumerate() {
        ranks[idx] = (position + 1) as f64;
    }
    ranks
}

/// Sort contender indices by ascending score, ties alphabetical.
fn order_by_score(contenders: &[Contender], scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..contenders.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(Ordering::Equal)
            .then_with(|| contenders[a].team.cmp(&contenders[b].team))
    });
    order
}

/// Segmentation leaderboard: weighted sum of the three sub-ranks, lower
/// composite first. Raw metric values are carried alongside the ranks.
pub fn segmentation_leaderboard(table: &ResultsTable) -> Result<Leaderboard> {
    let contenders = contenders(
        table,
        &[columns::CUP_DICE, columns::DISC_DICE, columns::CDR_MAE],
    )?;

    let cup_ranks = rank(&contenders, 0, Direction::BestIsHighest);
    let disc_ranks = rank(&contenders, 1, Direction::BestIsHighest);
    let cdr_ranks = rank(&contenders, 2, Direction::BestIsLowest);

    let scores: Vec<f64> = (0..contenders.len())
        .map(|i| {
            CUP_DICE_WEIGHT * cup_ranks[i]
                + DISC_DICE_WEIGHT * disc_ranks[i]
                + CDR_MAE_WEIGHT * cdr_ranks[i]
        })
        .collect();

    let order = order_by_score(&contenders, &scores);
    let mut teams = Vec::with_capacity(order.len());
    let mut rows = Vec::with_capacity(order.len());
    for i in order {
        teams.push(contenders[i].team.clone());
        rows.push(vec![
            scores[i],
            cup_ranks[i],
            disc_ranks[i],
            cdr_ranks[i],
            contenders[i].values[0],
            contenders[i].values[1],
            contenders[i].values[2],
        ]);
    }

    Ok(Leaderboard {
        header: [
            "Team",
            "Score",
            "Optic cup rank",
            "Optic disc rank",
            "CDR rank",
            columns::CUP_DICE,
            columns::DISC_DICE,
            columns::CDR_MAE,
        ]
        .map(String::from)
        .to_vec(),
        teams,
        rows,
    })
}

/// Classification leaderboard: AUC descending, with each team's reference
/// sensitivity carried alongside.
pub fn classification_leaderboard(table: &ResultsTable) -> Result<Leaderboard> {
    let contenders = contenders(table, &[columns::AUC, columns::REFERENCE_SENSITIVITY])?;
    let ranks = rank(&contenders, 0, Direction::BestIsHighest);
    let order = order_by_score(&contenders, &ranks);

    let mut teams = Vec::with_capacity(order.len());
    let mut rows = Vec::with_capacity(order.len());
    for i in order {
        teams.push(contenders[i].team.clone());
        rows.push(vec![contenders[i].values[0], contenders[i].values[1]]);
    }

    Ok(Leaderboard {
        header: ["Team", columns::AUC, columns::REFERENCE_SENSITIVITY]
            .map(String::from)
            .to_vec(),
        teams,
        rows,
    })
}

/// Fovea-location leaderboard: mean Euclidean distance ascending.
pub fn fovea_location_leaderboard(table: &ResultsTable) -> Result<Leaderboard> {
    let contenders = contenders(table, &[columns::MEAN_DISTANCE])?;
    let ranks = rank(&contenders, 0, Direction::BestIsLowest);
    let order = order_by_score(&contenders, &ranks);

    let mut teams = Vec::with_capacity(order.len());
    let mut rows = Vec::with_capacity(order.len());
    for i in order {
        teams.push(contenders[i].team.clone());
        rows.push(vec![contenders[i].values[0]]);
    }

    Ok(Leaderboard {
        header: ["Team", columns::MEAN_DISTANCE].map(String::from).to_vec(),
        teams,
        rows,
    })
}

/// Final leaderboard: weighted combination of the segmentation and
/// classification leaderboard positions (1-based), lower first.
///
/// Only teams present on both sub-leaderboards are ranked; whichever team
/// set is larger is truncated to the intersection, and absent teams are
/// dropped, never imputed.
pub fn final_leaderboard(table: &ResultsTable) -> Result<Leaderboard> {
    let segmentation = segmentation_leaderboard(table)?;
    let classification = classification_leaderboard(table)?;

    struct Entry {
        team: String,
        score: f64,
        segmentation_rank: usize,
        classification_rank: usize,
    }

    let mut entries: Vec<Entry> = segmentation
        .teams
        .iter()
        .enumerate()
        .filter_map(|(i, team)| {
            let classification_rank = classification.position(team)?;
            let segmentation_rank = i + 1;
            Some(Entry {
                team: team.clone(),
                score: SEGMENTATION_WEIGHT * segmentation_rank as f64
                    + CLASSIFICATION_WEIGHT * classification_rank as f64,
                segmentation_rank,
                classification_rank,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.team.cmp(&b.team))
    });

    Ok(Leaderboard {
        header: ["Team", "Score", "Segmentation rank", "Classification rank"]
            .map(String::from)
            .to_vec(),
        teams: entries.iter().map(|e| e.team.clone()).collect(),
        rows: entries
            .iter()
            .map(|e| {
                vec![
                    e.score,
                    e.segmentation_rank as f64,
                    e.classification_rank as f64,
                ]
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(
        table: &mut ResultsTable,
        team: &str,
        cup: f64,
        disc: f64,
        cdr: f64,
        auc: f64,
        sens: f64,
        dist: f64,
    ) {
        table
            .push_row(team, vec![cup, disc, cdr, auc, sens, dist])
            .unwrap();
    }

    #[test]
    fn test_segmentation_composite_is_the_literal_weighted_sum() {
        let mut table = ResultsTable::standard();
        push(&mut table, "team_a", 0.9, 0.90, 0.05, 0.9, 0.8, 10.0);
        push(&mut table, "team_b", 0.8, 0.95, 0.02, 0.8, 0.7, 12.0);

        let board = segmentation_leaderboard(&table).unwrap();

        // team_a leads cup Dice (weight 0.35) but team_b takes disc Dice
        // (0.25) and vCDR error (0.40):
        //   team_a: 0.35*1 + 0.25*2 + 0.40*2 = 1.65
        //   team_b: 0.35*2 + 0.25*1 + 0.40*1 = 1.35
        assert_eq!(board.teams, vec!["team_b", "team_a"]);
        assert!((board.rows[0][0] - 1.35).abs() < 1e-12);
        assert!((board.rows[1][0] - 1.65).abs() < 1e-12);

        // Raw metric values ride along with the ranks.
        assert_eq!(board.rows[0][4], 0.8);
        assert_eq!(board.rows[1][6], 0.05);
    }

    #[test]
    fn test_composite_is_order_independent() {
        let mut forward = ResultsTable::standard();
        push(&mut forward, "team_a", 0.9, 0.90, 0.05, 0.9, 0.8, 10.0);
        push(&mut forward, "team_b", 0.8, 0.95, 0.02, 0.8, 0.7, 12.0);
        push(&mut forward, "team_c", 0.7, 0.80, 0.09, 0.7, 0.6, 14.0);

        let mut permuted = ResultsTable::standard();
        push(&mut permuted, "team_c", 0.7, 0.80, 0.09, 0.7, 0.6, 14.0);
        push(&mut permuted, "team_a", 0.9, 0.90, 0.05, 0.9, 0.8, 10.0);
        push(&mut permuted, "team_b", 0.8, 0.95, 0.02, 0.8, 0.7, 12.0);

        let a = segmentation_leaderboard(&forward).unwrap();
        let b = segmentation_leaderboard(&permuted).unwrap();
        assert_eq!(a.teams, b.teams);
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn test_nan_teams_are_dropped_not_ranked_last() {
        let mut table = ResultsTable::standard();
        push(&mut table, "team_a", 0.9, 0.9, 0.05, 0.9, 0.8, 10.0);
        push(&mut table, "team_b", f64::NAN, f64::NAN, f64::NAN, 0.8, 0.7, 12.0);
        push(&mut table, "team_c", 0.7, 0.8, 0.09, f64::NAN, f64::NAN, 14.0);

        let segmentation = segmentation_leaderboard(&table).unwrap();
        assert_eq!(segmentation.teams, vec!["team_a", "team_c"]);
        assert_eq!(segmentation.teams.len(), table.len() - 1);

        // team_b still ranks on boards keyed on metrics it does have.
        let fovea = fovea_location_leaderboard(&table).unwrap();
        assert_eq!(fovea.teams, vec!["team_a", "team_b", "team_c"]);
    }

    #[test]
    fn ties_break_alphabetically() {
        let mut table = ResultsTable::standard();
        push(&mut table, "zebra", 0.9, 0.9, 0.05, 0.9, 0.8, 10.0);
        push(&mut table, "aardvark", 0.9, 0.9, 0.05, 0.9, 0.8, 10.0);

        let board = segmentation_leaderboard(&table).unwrap();
        assert_eq!(board.teams, vec!["aardvark", "zebra"]);

        let classification = classification_leaderboard(&table).unwrap();
        assert_eq!(classification.teams, vec!["aardvark", "zebra"]);
    }

    #[test]
    fn test_classification_carries_reference_sensitivity() {
        let mut table = ResultsTable::standard();
        push(&mut table, "team_a", 0.9, 0.9, 0.05, 0.85, 0.70, 10.0);
        push(&mut table, "team_b", 0.8, 0.95, 0.02, 0.95, 0.90, 12.0);

        let board = classification_leaderboard(&table).unwrap();
        assert_eq!(board.teams, vec!["team_b", "team_a"]);
        assert_eq!(board.rows[0], vec![0.95, 0.90]);
        assert_eq!(board.rows[1], vec![0.85, 0.70]);
    }

    #[test]
    fn test_final_ranks_only_the_intersection() {
        let mut table = ResultsTable::standard();
        // team_c never submitted classification results.
        push(&mut table, "team_a", 0.9, 0.90, 0.05, 0.9, 0.8, 10.0);
        push(&mut table, "team_b", 0.8, 0.95, 0.02, 0.8, 0.7, 12.0);
        push(&mut table, "team_c", 0.95, 0.99, 0.01, f64::NAN, f64::NAN, 9.0);

        let board = final_leaderboard(&table).unwrap();
        let mut ranked = board.teams.clone();
        ranked.sort();
        assert_eq!(ranked, vec!["team_a", "team_b"]);

        // Segmentation board is {team_c, team_b, team_a}; classification is
        // {team_a, team_b}. Final positions use the full segmentation board:
        //   team_a: 0.6*3 + 0.4*1 = 2.2
        //   team_b: 0.6*2 + 0.4*2 = 2.0
        assert_eq!(board.teams, vec!["team_b", "team_a"]);
        assert!((board.rows[0][0] - 2.0).abs() < 1e-12);
        assert!((board.rows[1][0] - 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_missing_metric_column_is_fatal_to_that_board() {
        let table = ResultsTable::new(vec!["AUC".to_string()]);
        assert!(matches!(
            segmentation_leaderboard(&table),
            Err(Error::MissingMetric { .. })
        ));
    }

    #[test]
    fn test_generate_dispatch_and_csv_export() {
        let mut table = ResultsTable::standard();
        push(&mut table, "team_a", 0.9, 0.9, 0.05, 0.9, 0.8, 10.0);
        push(&mut table, "team_b", 0.8, 0.95, 0.02, 0.8, 0.7, 12.0);

        let dir = tempfile::tempdir().unwrap();
        for kind in LeaderboardKind::ALL {
            let board = generate(kind, &table).unwrap();
            let path = dir.path().join(kind.output_filename());
            board.write_csv(&path).unwrap();
            assert!(path.exists());
        }
    }
}
