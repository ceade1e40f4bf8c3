//! Parallel CPU shift kernels.
//!
//! Both kernels split the work by batch element through a
//! [`BatchScheduler`]. Every task owns the output slab of its batch range, and
//! within a slab channels are visited in order by a single task, so the
//! floating-point summation order (and therefore every bit of the result) is
//! independent of the number of threads.
//!
//! Inputs are read through their strides; outputs are freshly allocated,
//! zeroed and row-major.
//!
//! Shapes are validated by [`super::dispatch`]; these functions assume a 4-D
//! input `[N, C, H, W]`, a `[C, ≥2]` shift table with finite entries and (for
//! the backward pass) an upstream gradient of the input's shape.

use crate::backend::BatchScheduler;
use crate::float::Float;
use crate::ops::corner::ChannelShift;
use crate::tensors::{Tensor, View4};

/// Per-channel shifts read once per call.
///
/// `theta` must be `[C, ≥2]`; a missing entry is an indexing bug and panics.
pub(crate) fn channel_shifts<T: Float>(theta: &Tensor<T>) -> Vec<ChannelShift<T>> {
    debug_assert!(theta.rank() == 2 && theta.shape()[1] >= 2, "shift table {:?}", theta.shape());
    let channels = theta.shape()[0];
    (0..channels)
        .map(|c| ChannelShift::new(theta[[c, 0]], theta[[c, 1]]))
        .collect()
}

fn dims<T>(t: &Tensor<T>) -> [usize; 4] {
    let s = t.shape();
    [s[0], s[1], s[2], s[3]]
}

/// Forward sampling: `out[n,c,h,w] = Σ weight · input[n,c,row,col]` over the
/// in-bounds corners of channel `c`'s shifted sampling position.
///
/// Corners outside the map contribute zero.
pub fn forward<T, S>(input: &Tensor<T>, theta: &Tensor<T>, sched: &S) -> Tensor<T>
where
    T: Float,
    S: BatchScheduler,
{
    let [n, c, h, w] = dims(input);
    let shifts = channel_shifts(theta);
    let mut out = vec![T::ZERO; n * c * h * w];
    let Some(src) = input.view4() else {
        return Tensor::new(vec![n, c, h, w], out);
    };
    let plane = h * w;

    sched.for_each_batch(&mut out, c * plane, |batches, slab| {
        for (bi, b) in batches.enumerate() {
            let batch_slab = &mut slab[bi * c * plane..(bi + 1) * c * plane];
            for (ci, shift) in shifts.iter().enumerate() {
                let dst = &mut batch_slab[ci * plane..(ci + 1) * plane];
                sample_channel(&src, b, ci, shift, h, w, dst);
            }
        }
    });

    Tensor::new(vec![n, c, h, w], out)
}

#[allow(clippy::float_cmp)]
fn sample_channel<T: Float>(
    src: &View4<'_, T>,
    b: usize,
    ch: usize,
    shift: &ChannelShift<T>,
    height: usize,
    width: usize,
    dst: &mut [T],
) {
    for (row, dst_row) in dst.chunks_exact_mut(width).enumerate() {
        for (col, y) in dst_row.iter_mut().enumerate() {
            let mut acc = T::ZERO;
            for corner in shift.corners(row, col, height, width).into_iter().flatten() {
                if corner.weight == T::ZERO {
                    continue;
                }
                acc += corner.weight * src.at(b, ch, corner.row, corner.col);
            }
            *y = acc;
        }
    }
}

/// Gradient of [`forward`] with respect to its input.
///
/// The transpose of the forward gather: each upstream gradient value is
/// scatter-added into the input-gradient cells of its in-bounds corners,
/// weighted exactly as in the forward pass. Cells referenced by several
/// output locations receive the sum of all their contributions.
///
/// The shift table is treated as a constant.
pub fn backward<T, S>(out_grad: &Tensor<T>, theta: &Tensor<T>, sched: &S) -> Tensor<T>
where
    T: Float,
    S: BatchScheduler,
{
    let [n, c, h, w] = dims(out_grad);
    let shifts = channel_shifts(theta);
    let mut in_grad = vec![T::ZERO; n * c * h * w];
    let Some(grad) = out_grad.view4() else {
        return Tensor::new(vec![n, c, h, w], in_grad);
    };
    let plane = h * w;

    sched.for_each_batch(&mut in_grad, c * plane, |batches, slab| {
        for (bi, b) in batches.enumerate() {
            let batch_slab = &mut slab[bi * c * plane..(bi + 1) * c * plane];
            for (ci, shift) in shifts.iter().enumerate() {
                let dst = &mut batch_slab[ci * plane..(ci + 1) * plane];
                scatter_channel(&grad, b, ci, shift, h, w, dst);
            }
        }
    });

    Tensor::new(vec![n, c, h, w], in_grad)
}

#[allow(clippy::float_cmp)]
fn scatter_channel<T: Float>(
    grad: &View4<'_, T>,
    b: usize,
    ch: usize,
    shift: &ChannelShift<T>,
    height: usize,
    width: usize,
    dst: &mut [T],
) {
    for row in 0..height {
        for col in 0..width {
            let g = grad.at(b, ch, row, col);
            for corner in shift.corners(row, col, height, width).into_iter().flatten() {
                if corner.weight == T::ZERO {
                    continue;
                }
                dst[corner.row * width + corner.col] += corner.weight * g;
            }
        }
    }
}
