//! Cross-team results table (teams × metrics).
//!
//! The table is append-only: the metric columns are fixed at construction
//! and evaluation adds one row per team. A failed or not-attempted
//! evaluation is stored as NaN, never by omitting the row, so every team
//! that submitted stays visible in the table. Leaderboard generation reads
//! the table back from its CSV serialization and shares no in-process state
//! with the batch run that produced it.

use std::path::Path;

use crate::error::{Error, Result};

/// Column names used by the challenge results table.
pub mod columns {
    /// Mean Dice coefficient for the optic cup.
    pub const CUP_DICE: &str = "Mean optic cup Dice";
    /// Mean Dice coefficient for the optic disc.
    pub const DISC_DICE: &str = "Mean optic disc Dice";
    /// Mean absolute error of the vertical cup-to-disc ratio.
    pub const CDR_MAE: &str = "MAE cup to disc ratio";
    /// Area under the ROC curve.
    pub const AUC: &str = "AUC";
    /// Sensitivity at the reference specificity.
    pub const REFERENCE_SENSITIVITY: &str = "Reference sensitivity";
    /// Mean Euclidean distance to the ground-truth fovea.
    pub const MEAN_DISTANCE: &str = "Mean Euclidean distance";
}

/// Header cell for the team-name column.
const TEAM_HEADER: &str = "Team";

/// An append-only table of evaluation results, one row per team.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    metrics: Vec<String>,
    teams: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ResultsTable {
    /// Create an empty table with the given metric columns.
    #[must_use]
    pub fn new(metrics: Vec<String>) -> Self {
        Self {
            metrics,
            teams: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Create an empty table with the six challenge metric columns.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            columns::CUP_DICE.to_string(),
            columns::DISC_DICE.to_string(),
            columns::CDR_MAE.to_string(),
            columns::AUC.to_string(),
            columns::REFERENCE_SENSITIVITY.to_string(),
            columns::MEAN_DISTANCE.to_string(),
        ])
    }

    /// Metric column names, in column order.
    #[must_use]
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Team names, in row order.
    #[must_use]
    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    /// Number of team rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Append one team's results.
    ///
    /// Fails with [`Error::ShapeMismatch`] when `values` does not have one
    /// cell per metric column, and with [`Error::DegenerateInput`] when the
    /// team already has a row (team names are unique).
    pub fn push_row(&mut self, team: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let team = team.into();
        if values.len() != self.metrics.len() {
            return Err(Error::ShapeMismatch {
                expected: self.metrics.len(),
                actual: values.len(),
            });
        }
        if self.teams.contains(&team) {
            return Err(Error::DegenerateInput(format!(
                "duplicate team in results table: {team}"
            )));
        }
        self.teams.push(team);
        self.rows.push(values);
        Ok(())
    }

    /// Index of a metric column by name.
    pub fn metric_index(&self, name: &str) -> Result<usize> {
        self.metrics
            .iter()
            .position(|m| m == name)
            .ok_or_else(|| Error::MissingMetric {
                name: name.to_string(),
            })
    }

    /// Copy of a metric column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.metric_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// One team's row of values.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    /// Write the table as CSV with a `Team` column followed by one column
    /// per metric. NaN cells are written as the literal `NaN`.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;

        let mut header = vec![TEAM_HEADER.to_string()];
        header.extend(self.metrics.iter().cloned());
        writer.write_record(&header)?;

        for (team, row) in self.teams.iter().zip(&self.rows) {
            let mut record = vec![team.clone()];
            record.extend(row.iter().map(|v| format_cell(*v)));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a table previously written by [`ResultsTable::write_csv`].
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingFile {
                path: path.to_path_buf(),
            });
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let metrics: Vec<String> = headers.iter().skip(1).map(String::from).collect();

        let mut table = Self::new(metrics);
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let team = record.get(0).unwrap_or("").to_string();
            let values: Vec<f64> = record.iter().skip(1).map(parse_cell).collect();
            if values.len() != table.metrics.len() {
                return Err(Error::MalformedRow {
                    path: path.to_path_buf(),
                    line: line + 2,
                    reason: format!(
                        "expected {} metric cells, got {}",
                        table.metrics.len(),
                        values.len()
                    ),
                });
            }
            table.push_row(team, values)?;
        }
        Ok(table)
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value}")
    }
}

fn parse_cell(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> ResultsTable {
        let mut table = ResultsTable::new(vec!["AUC".to_string(), "Score".to_string()]);
        table.push_row("alpha", vec![0.9, 1.0]).unwrap();
        table.push_row("beta", vec![f64::NAN, 2.0]).unwrap();
        table
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut table = ResultsTable::new(vec!["AUC".to_string()]);
        assert!(matches!(
            table.push_row("alpha", vec![1.0, 2.0]),
            Err(Error::ShapeMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_duplicate_team_rejected() {
        let mut table = ResultsTable::new(vec!["AUC".to_string()]);
        table.push_row("alpha", vec![1.0]).unwrap();
        assert!(table.push_row("alpha", vec![0.5]).is_err());
    }

    #[test]
    fn test_missing_metric() {
        let table = sample_table();
        assert!(matches!(
            table.column("Dice"),
            Err(Error::MissingMetric { .. })
        ));
    }

    #[test]
    fn test_csv_round_trip_preserves_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table_of_results.csv");

        sample_table().write_csv(&path).unwrap();
        let restored = ResultsTable::read_csv(&path).unwrap();

        assert_eq!(restored.teams(), &["alpha".to_string(), "beta".to_string()]);
        assert_eq!(restored.metrics(), &["AUC".to_string(), "Score".to_string()]);
        assert_eq!(restored.row(0), &[0.9, 1.0]);
        assert!(restored.row(1)[0].is_nan());
        assert_eq!(restored.row(1)[1], 2.0);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(matches!(
            ResultsTable::read_csv("/nonexistent/table.csv"),
            Err(Error::MissingFile { .. })
        ));
    }
}
