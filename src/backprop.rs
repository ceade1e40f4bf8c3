//! Differentiable Active Shift.
//!
//! Each channel of an `[N, C, H, W]` feature map is translated by its own,
//! possibly fractional, offset `(alpha, beta)` taken from a `[C, 2]` shift
//! table, using bilinear interpolation with zero padding outside the map.
//!
//! ## Autograd Pattern
//!
//! [`active_shift`] follows the usual pattern of this crate:
//! 1. **Inputs** are a `WithGrad` feature map and a plain shift table.
//! 2. **Forward Pass** computes the shifted output.
//! 3. **Backward Pass** is a closure borrowing the inputs that maps
//!    `dL/d(out)` to `dL/d(input)`.
//!
//! The shift table is treated as a constant: no gradient flows into it.
//!
//! ## Usage Guidelines
//!
//! - Shape errors are returned, never panicked on, and are reported before
//!   any work is done.
//! - The backward closure implements `Fn` and may be called repeatedly.

use crate::error::Result;
use crate::float::Float;
use crate::tensors::{Tensor, WithGrad};

/// Shifts every channel of `input` by its `(alpha, beta)` row/column offset.
///
/// # Errors
/// Returns an error if `input` is not 4-D, `theta` is not `[C, ≥2]`, or a
/// shift is not finite.
///
/// # Example
/// ```rust
/// use active_shift::{backprop::forward, tensor};
///
/// let input = tensor!([[[[1.0, 2.0], [3.0, 4.0]]]]);
/// let theta = tensor!([[0.0, 0.0]]);
/// assert_eq!(forward(&input, &theta).unwrap(), input);
/// ```
///
/// # Performance
/// Batch elements are processed in parallel on the current rayon pool unless
/// the [`Serial`](crate::backend::Backend::Serial) backend is selected.
pub fn forward<T: Float>(input: &Tensor<T>, theta: &Tensor<T>) -> Result<Tensor<T>> {
    crate::ops::dispatch::forward(input, theta)
}

/// Gradient of [`forward`] with respect to `input`, given `dL/d(out)`.
///
/// # Errors
/// As [`forward`], plus a shape error if `out_grad` does not match `input`.
pub fn backward<T: Float>(out_grad: &Tensor<T>, input: &Tensor<T>, theta: &Tensor<T>) -> Result<Tensor<T>> {
    crate::ops::dispatch::backward(out_grad, input, theta)
}

/// Applies the shift and returns the output with its backward closure.
///
/// # Returns
/// - `out`: shifted feature map.
/// - `back`: closure mapping `dL/d(out)` to `dL/d(input)`.
///
/// # Errors
/// As [`forward`]. The closure fails only if handed a gradient of the wrong shape.
///
/// # Example
/// ```rust
/// use active_shift::backprop::active_shift;
/// use active_shift::tensors::{Tensor, WithGrad};
///
/// let mut x = WithGrad::new(Tensor::new(vec![1, 1, 1, 3], vec![1.0, 2.0, 3.0]));
/// let theta = Tensor::new(vec![1, 2], vec![0.0, 0.5]);
/// let (out, back) = active_shift(&x, &theta).unwrap();
/// assert_eq!(out.to_vec(), vec![1.5, 2.5, 1.5]);
///
/// let grad = back(&Tensor::new(vec![1, 1, 1, 3], vec![1.0; 3])).unwrap();
/// drop(back);
/// x.accumulate(&grad).unwrap();
/// assert_eq!(x.grad.to_vec(), vec![0.5, 1.0, 1.0]);
/// ```
pub fn active_shift<'a, T: Float>(
    input: &'a WithGrad<Tensor<T>>,
    theta: &'a Tensor<T>,
) -> Result<(Tensor<T>, impl Fn(&Tensor<T>) -> Result<Tensor<T>> + 'a)> {
    let out = forward(&input.value, theta)?;
    let back = move |grad_output: &Tensor<T>| backward(grad_output, &input.value, theta);
    Ok((out, back))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_closure_is_reusable() {
        let x = WithGrad::new(Tensor::new(vec![1, 1, 2, 2], vec![1.0_f32, 2.0, 3.0, 4.0]));
        let theta = Tensor::new(vec![1, 2], vec![0.5_f32, 0.5]);
        let (out, back) = active_shift(&x, &theta).unwrap();
        assert_eq!(out.shape(), &[1, 1, 2, 2]);

        let g = Tensor::new(vec![1, 1, 2, 2], vec![1.0; 4]);
        let first = back(&g).unwrap();
        let second = back(&g).unwrap();
        assert_eq!(first, second);
        assert!(back(&Tensor::zeros(vec![1, 1, 2, 3])).is_err());
    }
}
