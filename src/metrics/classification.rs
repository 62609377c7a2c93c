//! Glaucoma classification metrics: ROC curve, AUC and reference sensitivity.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Specificity at which the reference sensitivity is reported.
pub const REFERENCE_SPECIFICITY: f64 = 0.95;

/// A ROC curve as produced by [`roc_curve`].
///
/// Operating points are ordered by decreasing decision threshold, so both
/// `sensitivity` and `false_positive_rate` are non-decreasing. The first
/// point is always the all-negative operating point `(0, 0)` and the last
/// the all-positive one `(1, 1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocCurve {
    /// True-positive rate at each operating point.
    pub sensitivity: Vec<f64>,
    /// False-positive rate at each operating point.
    pub false_positive_rate: Vec<f64>,
    /// Area under the curve, computed by trapezoidal integration.
    pub auc: f64,
}

impl RocCurve {
    /// Specificity (1 − FPR) at each operating point.
    #[must_use]
    pub fn specificity(&self) -> Vec<f64> {
        self.false_positive_rate.iter().map(|fpr| 1.0 - fpr).collect()
    }
}

/// Compute a ROC curve by sweeping a decision threshold over all distinct
/// score values, in descending order.
///
/// `labels[i]` is true when image `i` has glaucoma. Fails with
/// [`Error::DegenerateInput`] when the labels contain only one class and
/// with [`Error::ShapeMismatch`] when the slices have different lengths.
pub fn roc_curve(scores: &[f64], labels: &[bool]) -> Result<RocCurve> {
    if scores.len() != labels.len() {
        return Err(Error::ShapeMismatch {
            expected: labels.len(),
            actual: scores.len(),
        });
    }

    let positives = labels.iter().filter(|l| **l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(Error::DegenerateInput(format!(
            "ROC requires both classes, got {positives} positive and {negatives} negative labels"
        )));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // All-negative operating point (threshold above every score).
    let mut sensitivity = vec![0.0];
    let mut false_positive_rate = vec![0.0];

    let mut true_positives = 0usize;
    let mut false_positives = 0usize;
    for (rank, &idx) in order.iter().enumerate() {
        if labels[idx] {
            true_positives += 1;
        } else {
            false_positives += 1;
        }
        // Only emit a point once every sample sharing this score is counted.
        let last_of_run = match order.get(rank + 1) {
            Some(&next) => scores[next] < scores[idx],
            None => true,
        };
        if last_of_run {
            sensitivity.push(true_positives as f64 / positives as f64);
            false_positive_rate.push(false_positives as f64 / negatives as f64);
        }
    }

    let auc = trapezoidal_area(&false_positive_rate, &sensitivity);

    Ok(RocCurve {
        sensitivity,
        false_positive_rate,
        auc,
    })
}

/// Report the sensitivity at a target specificity, linearly interpolating
/// between the two bracketing operating points.
///
/// When the target coincides with a run of operating points at the same
/// specificity, the highest sensitivity among them is returned. Fails with
/// [`Error::ShapeMismatch`] on unequal lengths and
/// [`Error::DegenerateInput`] on an empty curve.
pub fn sensitivity_at_specificity(
    sensitivity: &[f64],
    specificity: &[f64],
    target: f64,
) -> Result<f64> {
    if sensitivity.len() != specificity.len() {
        return Err(Error::ShapeMismatch {
            expected: specificity.len(),
            actual: sensitivity.len(),
        });
    }
    if sensitivity.is_empty() {
        return Err(Error::DegenerateInput("empty ROC curve".to_string()));
    }

    // Specificity decreases along the curve. Find the last point still at or
    // above the target; everything after it is below.
    let last_at_or_above = specificity.iter().rposition(|&s| s >= target);
    let Some(i) = last_at_or_above else {
        // Every point is below the target; report the most specific one.
        return Ok(sensitivity[0]);
    };

    if specificity[i] == target || i + 1 == specificity.len() {
        return Ok(sensitivity[i]);
    }

    let (s0, s1) = (specificity[i], specificity[i + 1]);
    let frac = (s0 - target) / (s0 - s1);
    Ok(sensitivity[i] + frac * (sensitivity[i + 1] - sensitivity[i]))
}

/// Trapezoidal integration of y over x.
fn trapezoidal_area(x: &[f64], y: &[f64]) -> f64 {
    let mut area = 0.0;
    for i in 1..x.len() {
        area += (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0;
    }
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation() {
        let scores = [0.9, 0.1, 0.8];
        let labels = [true, false, true];
        let curve = roc_curve(&scores, &labels).unwrap();

        assert_eq!(curve.auc, 1.0);
        let at_full_specificity =
            sensitivity_at_specificity(&curve.sensitivity, &curve.specificity(), 1.0).unwrap();
        assert_eq!(at_full_specificity, 1.0);
    }

    #[test]
    fn test_curve_is_monotone() {
        let scores = [0.1, 0.4, 0.35, 0.8, 0.65, 0.2];
        let labels = [false, true, false, true, true, false];
        let curve = roc_curve(&scores, &labels).unwrap();

        for w in curve.sensitivity.windows(2) {
            assert!(w[1] >= w[0]);
        }
        for w in curve.false_positive_rate.windows(2) {
            assert!(w[1] >= w[0]);
        }
        assert!(curve.auc >= 0.0 && curve.auc <= 1.0);
        assert_eq!(*curve.sensitivity.first().unwrap(), 0.0);
        assert_eq!(*curve.sensitivity.last().unwrap(), 1.0);
        assert_eq!(*curve.false_positive_rate.last().unwrap(), 1.0);
    }

    #[test]
    fn test_constant_scores_are_uninformative() {
        // One distinct threshold: the curve jumps straight from (0,0) to
        // (1,1) and the AUC is exactly chance level.
        let scores = [0.7, 0.7, 0.7, 0.7];
        let labels = [true, false, true, false];
        let curve = roc_curve(&scores, &labels).unwrap();
        assert_eq!(curve.auc, 0.5);
    }

    #[test]
    fn test_inverted_scores_score_zero() {
        let scores = [0.1, 0.9, 0.2, 0.8];
        let labels = [true, false, true, false];
        let curve = roc_curve(&scores, &labels).unwrap();
        assert_eq!(curve.auc, 0.0);
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let scores = [0.3, 0.6];
        assert!(matches!(
            roc_curve(&scores, &[true, true]),
            Err(Error::DegenerateInput(_))
        ));
        assert!(matches!(
            roc_curve(&scores, &[false, false]),
            Err(Error::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_tied_scores_emit_one_point() {
        let scores = [0.5, 0.5, 0.2];
        let labels = [true, false, false];
        let curve = roc_curve(&scores, &labels).unwrap();
        // (0,0), both 0.5-scores at once, then the 0.2 score.
        assert_eq!(curve.sensitivity, vec![0.0, 1.0, 1.0]);
        assert_eq!(curve.false_positive_rate, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn interpolates_between_operating_points() {
        let sensitivity = [0.2, 0.8];
        let specificity = [1.0, 0.5];
        let mid = sensitivity_at_specificity(&sensitivity, &specificity, 0.75).unwrap();
        assert!((mid - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_exact_specificity_takes_highest_sensitivity() {
        let sensitivity = [0.0, 0.5, 1.0, 1.0];
        let specificity = [1.0, 1.0, 1.0, 0.0];
        let s = sensitivity_at_specificity(&sensitivity, &specificity, 1.0).unwrap();
        assert_eq!(s, 1.0);
    }
}
