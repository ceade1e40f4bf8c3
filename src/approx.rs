//! Approximate comparisons for floating-point results.
//!
//! Used to check identities that only hold up to rounding, such as the
//! adjoint relation `⟨backward(g), x⟩ = ⟨g, forward(x)⟩`.

use crate::float::Float;
use crate::tensors::Tensor;

/// The max epsilon accepted on `f32`s.
pub const F32_MAX_ERROR: f32 = 1e-3;

/// The best expected epsilon accepted on `f32`s.
pub const F32_MIN_ERROR: f32 = 1e-6;

/// The max epsilon accepted on `f64`s.
pub const F64_MAX_ERROR: f64 = 1e-6;

/// The best expected epsilon accepted on `f64`s.
pub const F64_MIN_ERROR: f64 = 1e-12;

/// Tolerances matching the precision of an element type.
pub trait Tolerance: Float {
    /// Relative error accepted after long reductions.
    const LOOSE: f64;
    /// Relative error accepted for a handful of operations.
    const TIGHT: f64;
}

impl Tolerance for f32 {
    const LOOSE: f64 = F32_MAX_ERROR as f64;
    const TIGHT: f64 = F32_MIN_ERROR as f64;
}

impl Tolerance for f64 {
    const LOOSE: f64 = F64_MAX_ERROR;
    const TIGHT: f64 = F64_MIN_ERROR;
}

/// `|a - b| <= tol * max(1, |a|, |b|)`.
pub fn rel_close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * 1f64.max(a.abs()).max(b.abs())
}

/// Element-wise [`rel_close`] on two tensors of the same shape.
pub fn approx_eq<T: Float>(a: &Tensor<T>, b: &Tensor<T>, tol: f64) -> bool {
    a.shape() == b.shape()
        && a
            .to_vec()
            .into_iter()
            .zip(b.to_vec())
            .all(|(x, y)| rel_close(x.into_f64(), y.into_f64(), tol))
}

/// Inner product of two tensors' logical elements, accumulated in `f64`.
///
/// # Panics
/// Panics if the shapes differ.
pub fn dot<T: Float>(a: &Tensor<T>, b: &Tensor<T>) -> f64 {
    assert_eq!(a.shape(), b.shape(), "dot product of mismatched shapes");
    a.to_vec()
        .into_iter()
        .zip(b.to_vec())
        .map(|(x, y)| x.into_f64() * y.into_f64())
        .sum()
}
