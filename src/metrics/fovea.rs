//! Fovea localization metrics.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A 2D image coordinate, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Column coordinate.
    pub x: f64,
    /// Row coordinate.
    pub y: f64,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Per-row L2 distance between two equal-length coordinate sequences.
///
/// Fails with [`Error::ShapeMismatch`] if the sequences have different
/// lengths.
///
/// # Example
///
/// ```
/// use fundus_eval::metrics::{Point, euclidean_distances};
///
/// let gt = [Point::new(0.0, 0.0)];
/// let predicted = [Point::new(3.0, 4.0)];
/// assert_eq!(euclidean_distances(&gt, &predicted).unwrap(), vec![5.0]);
/// ```
pub fn euclidean_distances(reference: &[Point], predicted: &[Point]) -> Result<Vec<f64>> {
    if reference.len() != predicted.len() {
        return Err(Error::ShapeMismatch {
            expected: reference.len(),
            actual: predicted.len(),
        });
    }

    Ok(reference
        .iter()
        .zip(predicted)
        .map(|(r, p)| ((r.x - p.x).powi(2) + (r.y - p.y).powi(2)).sqrt())
        .collect())
}
