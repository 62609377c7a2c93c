//! Optic disc/cup segmentation metrics.
//!
//! Ground truth and predictions are 8-bit grayscale label masks encoding
//! three classes: optic cup (0), optic disc (128), background (255). The
//! disc region is understood to contain the cup, so the binary disc mask is
//! the union of both labels.

use crate::error::{Error, Result};

/// Label value for optic cup pixels.
pub const CUP_LABEL: u8 = 0;
/// Label value for optic disc pixels.
pub const DISC_LABEL: u8 = 128;
/// Label value for background pixels.
pub const BACKGROUND_LABEL: u8 = 255;

// Binarization thresholds. Midpoints between the label values, so masks that
// went through lossy resampling still binarize correctly.
const CUP_THRESHOLD: u8 = 64;
const DISC_THRESHOLD: u8 = 192;

/// An 8-bit disc/cup label mask, stored row-major.
#[derive(Debug, Clone)]
pub struct LabelMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl LabelMask {
    /// Create a mask from row-major label data.
    ///
    /// Fails with [`Error::ShapeMismatch`] if `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(Error::ShapeMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Mask width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Binary mask of the optic cup region.
    #[must_use]
    pub fn cup_region(&self) -> Vec<bool> {
        self.region(CUP_THRESHOLD)
    }

    /// Binary mask of the optic disc region (disc plus cup).
    #[must_use]
    pub fn disc_region(&self) -> Vec<bool> {
        self.region(DISC_THRESHOLD)
    }

    fn region(&self, threshold: u8) -> Vec<bool> {
        self.data.iter().map(|&v| v < threshold).collect()
    }
}

/// Compute the Dice coefficient between two binary masks.
///
/// Defined as `2 * |A ∩ B| / (|A| + |B|)`, in `[0, 1]`. When both masks are
/// empty there is no object and none was predicted, which counts as perfect
/// agreement: the result is 1.0.
///
/// Fails with [`Error::ShapeMismatch`] if the masks have different lengths.
///
/// # Example
///
/// ```
/// use fundus_eval::metrics::dice;
///
/// let a = [true, true, false, false];
/// let b = [true, false, true, false];
/// assert!((dice(&a, &b).unwrap() - 0.5).abs() < 1e-12);
/// ```
pub fn dice(predicted: &[bool], reference: &[bool]) -> Result<f64> {
    if predicted.len() != reference.len() {
        return Err(Error::ShapeMismatch {
            expected: reference.len(),
            actual: predicted.len(),
        });
    }

    let intersection = predicted
        .iter()
        .zip(reference)
        .filter(|(p, r)| **p && **r)
        .count();
    let total = predicted.iter().filter(|p| **p).count() + reference.iter().filter(|r| **r).count();

    if total == 0 {
        return Ok(1.0);
    }
    Ok(2.0 * intersection as f64 / total as f64)
}

/// Compute the vertical cup-to-disc ratio of a label mask.
///
/// The vertical diameter of a region is the maximum, over all columns, of
/// the number of in-region pixels in that column. The vCDR is the cup
/// diameter divided by the disc diameter, or 0.0 when the disc region is
/// empty.
#[must_use]
pub fn vertical_cup_to_disc_ratio(mask: &LabelMask) -> f64 {
    let cup = vertical_diameter(&mask.cup_region(), mask.width());
    let disc = vertical_diameter(&mask.disc_region(), mask.width());
    if disc == 0 {
        return 0.0;
    }
    cup as f64 / disc as f64
}

/// Maximum per-column pixel count of a binary region.
fn vertical_diameter(region: &[bool], width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    let mut counts = vec![0usize; width];
    for (i, &inside) in region.iter().enumerate() {
        if inside {
            counts[i % width] += 1;
        }
    }
    counts.into_iter().max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&[u8]]) -> LabelMask {
        let width = rows[0].len();
        let data: Vec<u8> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        LabelMask::new(width, rows.len(), data).unwrap()
    }

    #[test]
    fn test_dice_identity() {
        let a = [true, false, true, true];
        assert_eq!(dice(&a, &a).unwrap(), 1.0);
    }

    #[test]
    fn test_dice_symmetry() {
        let a = [true, true, false, false, true];
        let b = [false, true, true, false, true];
        assert_eq!(dice(&a, &b).unwrap(), dice(&b, &a).unwrap());
    }

    #[test]
    fn test_dice_disjoint() {
        let a = [true, true, false, false];
        let b = [false, false, true, true];
        assert_eq!(dice(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_dice_both_empty_is_perfect() {
        // Convention: no object and none predicted counts as agreement.
        let empty = [false, false, false];
        assert_eq!(dice(&empty, &empty).unwrap(), 1.0);
    }

    #[test]
    fn test_dice_shape_mismatch() {
        let a = [true, false];
        let b = [true, false, true];
        assert!(matches!(
            dice(&a, &b),
            Err(Error::ShapeMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_regions_tolerate_resampling_noise() {
        let mask = LabelMask::new(2, 2, vec![3, 130, 120, 250]).unwrap();
        assert_eq!(mask.cup_region(), vec![true, false, false, false]);
        assert_eq!(mask.disc_region(), vec![true, true, true, false]);
    }

    #[test]
    fn test_vertical_cup_to_disc_ratio() {
        // Disc spans 4 rows in its tallest column, cup spans 2.
        let mask = mask_from_rows(&[
            &[255, 128, 255],
            &[128, 0, 255],
            &[128, 0, 255],
            &[255, 128, 255],
        ]);
        assert!((vertical_cup_to_disc_ratio(&mask) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_vcdr_empty_disc_is_zero() {
        let mask = mask_from_rows(&[&[255, 255], &[255, 255]]);
        assert_eq!(vertical_cup_to_disc_ratio(&mask), 0.0);
    }

    #[test]
    fn test_label_mask_rejects_wrong_length() {
        assert!(matches!(
            LabelMask::new(2, 2, vec![0, 128, 255]),
            Err(Error::ShapeMismatch { expected: 4, actual: 3 })
        ));
    }
}
