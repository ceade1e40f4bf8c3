//! Bilinear corner addressing shared by the forward and backward kernels.
//!
//! A shift `s` is split into `floor(s)` and `s - floor(s) ∈ [0, 1)`. Sampling
//! position `(h + alpha, w + beta)` then sits inside the cell whose top-left
//! corner is `(h + floor(alpha), w + floor(beta))`, and each of the cell's four
//! corners is weighted by the product of its row and column interpolation
//! weights. Corners outside the feature map are reported as `None`.

use crate::float::Float;

/// One shift component split into its integer and fractional parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split<T> {
    /// `floor(shift)`, saturated to the `i64` range.
    pub whole: i64,
    /// `shift - floor(shift)`, in `[0, 1)`.
    pub frac: T,
}

impl<T: Float> Split<T> {
    /// Splits a finite shift.
    pub fn new(shift: T) -> Self {
        let floor = shift.floor();
        let frac = shift - floor;
        // tiny negative shifts round `shift - floor` up to exactly 1
        if frac >= T::ONE {
            return Self {
                whole: floor.to_i64().saturating_add(1),
                frac: T::ZERO,
            };
        }
        Self {
            whole: floor.to_i64(),
            frac,
        }
    }

    /// Interpolation weights of the `+0` and `+1` neighbours.
    #[inline]
    fn weights(self) -> [T; 2] {
        [T::ONE - self.frac, self.frac]
    }
}

/// Per-channel shift: rows by `alpha`, columns by `beta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelShift<T> {
    /// Row component.
    pub alpha: Split<T>,
    /// Column component.
    pub beta: Split<T>,
}

impl<T: Float> ChannelShift<T> {
    /// Splits both components.
    pub fn new(alpha: T, beta: T) -> Self {
        Self {
            alpha: Split::new(alpha),
            beta: Split::new(beta),
        }
    }

    /// The four corners sampled by output location `(h, w)` of an
    /// `height × width` map, in the order `00, 01, 10, 11` (row offset,
    /// column offset). Out-of-map corners are `None`.
    #[inline]
    pub fn corners(&self, h: usize, w: usize, height: usize, width: usize) -> [Option<Corner<T>>; 4] {
        let [r0, r1] = self.alpha.weights();
        let [c0, c1] = self.beta.weights();
        let row = |dr| offset(h, self.alpha.whole, dr, height);
        let col = |dc| offset(w, self.beta.whole, dc, width);

        let corner = |dr, dc, weight| {
            Some(Corner {
                row: row(dr)?,
                col: col(dc)?,
                weight,
            })
        };

        [
            corner(0, 0, r0 * c0),
            corner(0, 1, r0 * c1),
            corner(1, 0, r1 * c0),
            corner(1, 1, r1 * c1),
        ]
    }
}

/// An in-bounds sample location and its bilinear weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner<T> {
    /// Row in the feature map.
    pub row: usize,
    /// Column in the feature map.
    pub col: usize,
    /// Bilinear weight.
    pub weight: T,
}

/// `base + whole + step` if it lands in `[0, extent)`.
#[inline]
fn offset(base: usize, whole: i64, step: i64, extent: usize) -> Option<usize> {
    let pos = i64::try_from(base)
        .ok()?
        .checked_add(whole)?
        .checked_add(step)?;
    usize::try_from(pos).ok().filter(|&p| p < extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_weight(corners: &[Option<Corner<f64>>; 4]) -> f64 {
        corners.iter().flatten().map(|c| c.weight).sum()
    }

    #[test]
    fn split_keeps_fraction_in_unit_interval() {
        let s = Split::new(-1.25_f64);
        assert_eq!(s.whole, -2);
        assert_eq!(s.frac, 0.75);

        let s = Split::new(3.0_f32);
        assert_eq!(s.whole, 3);
        assert_eq!(s.frac, 0.0);
    }

    #[test]
    fn tiny_negative_shifts_round_to_zero() {
        let s = Split::new(-1e-10_f32);
        assert_eq!((s.whole, s.frac), (0, 0.0));

        let s = Split::new(-1e-20_f64);
        assert_eq!((s.whole, s.frac), (0, 0.0));

        let s = Split::new(-1e-3_f64);
        assert_eq!(s.whole, -1);
        assert!(s.frac < 1.0);
    }

    #[test]
    fn interior_weights_sum_to_one() {
        let shift = ChannelShift::new(0.3_f64, -0.6);
        let corners = shift.corners(2, 2, 5, 5);
        assert!(corners.iter().all(Option::is_some));
        assert!((total_weight(&corners) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn corners_are_distinct_and_ordered() {
        let shift = ChannelShift::new(0.25_f64, 0.5);
        let [c00, c01, c10, c11] = shift.corners(1, 1, 4, 4).map(Option::unwrap);
        assert_eq!((c00.row, c00.col), (1, 1));
        assert_eq!((c01.row, c01.col), (1, 2));
        assert_eq!((c10.row, c10.col), (2, 1));
        assert_eq!((c11.row, c11.col), (2, 2));
        assert_eq!(c00.weight, 0.75 * 0.5);
        assert_eq!(c01.weight, 0.75 * 0.5);
        assert_eq!(c10.weight, 0.25 * 0.5);
        assert_eq!(c11.weight, 0.25 * 0.5);
    }

    #[test]
    fn row_fraction_weights_the_next_row() {
        let shift = ChannelShift::new(0.25_f64, 0.0);
        let [c00, _, c10, _] = shift.corners(0, 0, 2, 2).map(Option::unwrap);
        assert_eq!(c00.weight, 0.75);
        assert_eq!((c10.row, c10.col, c10.weight), (1, 0, 0.25));
    }

    #[test]
    fn negative_and_far_corners_are_dropped() {
        let shift = ChannelShift::new(-1.5_f64, 0.0);
        let corners = shift.corners(0, 0, 3, 3);
        // rows -2 and -1 are both outside
        assert!(corners.iter().all(Option::is_none));

        let shift = ChannelShift::new(1.5_f64, 1.5);
        let corners = shift.corners(0, 0, 2, 2);
        assert_eq!(
            corners,
            [
                Some(Corner {
                    row: 1,
                    col: 1,
                    weight: 0.25
                }),
                None,
                None,
                None
            ]
        );
    }

    #[test]
    fn saturated_shifts_do_not_overflow() {
        let shift = ChannelShift::new(f64::MAX, f64::MIN);
        assert!(shift.corners(3, 3, 8, 8).iter().all(Option::is_none));
    }
}
