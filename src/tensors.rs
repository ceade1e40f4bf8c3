//! Strided tensors and gradient holders.
//!
//! # Layout
//!
//! A [`Tensor`] is a shape, a stride per dimension (counted in elements), a
//! starting offset and a flat storage vector. The element at index `idx`
//! lives at `offset + Σ idx[d] * strides[d]`. Tensors built with
//! [`Tensor::new`] are row-major; [`Tensor::from_strided`] and
//! [`Tensor::permute`] produce arbitrary (possibly non-contiguous) layouts,
//! which the kernels read through the strides without copying.
//!
//! ## Example
//!
//! ```rust
//! use active_shift::tensors::Tensor;
//! let t = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(t.shape(), &[2, 3]);
//! assert_eq!(t.strides(), &[3, 1]);
//!
//! let tt = t.permute(&[1, 0]).unwrap();
//! assert_eq!(tt.get(&[2, 1]), Some(6.0));
//! assert!(!tt.is_contiguous());
//! ```

use core::ops::Index;

use crate::error::{Result, ShiftError};
use crate::float::Float;

/// N-dimensional tensor addressed through explicit strides.
#[derive(Debug, Clone)]
pub struct Tensor<T> {
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    data: Vec<T>,
}

/// Row-major strides for `shape`.
pub fn contiguous_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1].max(1);
    }
    strides
}

impl<T> Tensor<T> {
    /// Creates a row-major tensor with the given shape and flat data.
    ///
    /// # Panics
    /// Panics if the number of elements in `data` does not match the shape product.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Self {
        let shape = shape.into();
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {:?} is incompatible with {} data elements",
            shape,
            data.len()
        );
        let strides = contiguous_strides(&shape);
        Self {
            shape,
            strides,
            offset: 0,
            data,
        }
    }

    /// Creates a tensor over `data` with explicit strides and offset.
    ///
    /// Strides may alias (a stride of zero broadcasts), but every reachable
    /// element must lie inside `data`.
    ///
    /// # Errors
    /// [`ShiftError::Layout`] if the stride count differs from the rank or the
    /// layout addresses past the end of `data`.
    pub fn from_strided(
        shape: impl Into<Vec<usize>>,
        strides: impl Into<Vec<usize>>,
        offset: usize,
        data: Vec<T>,
    ) -> Result<Self> {
        let shape = shape.into();
        let strides = strides.into();
        if shape.len() != strides.len() {
            return Err(ShiftError::Layout {
                reason: format!(
                    "{} strides given for a {}-D shape {:?}",
                    strides.len(),
                    shape.len(),
                    shape
                ),
            });
        }

        if shape.iter().all(|&d| d > 0) {
            let last = shape
                .iter()
                .zip(&strides)
                .try_fold(offset, |acc, (&d, &s)| {
                    (d - 1).checked_mul(s).and_then(|step| acc.checked_add(step))
                });
            match last {
                Some(last) if last < data.len() => {}
                _ => {
                    return Err(ShiftError::Layout {
                        reason: format!(
                            "shape {shape:?} with strides {strides:?} and offset {offset} \
                             exceeds storage of {} elements",
                            data.len()
                        ),
                    });
                }
            }
        }

        Ok(Self {
            shape,
            strides,
            offset,
            data,
        })
    }

    /// Extent of every dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Stride of every dimension, in elements.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Storage index of the first element.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// `true` if any extent is zero.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw backing storage, in storage order.
    pub fn storage(&self) -> &[T] {
        &self.data
    }

    /// `true` if the tensor is row-major with no offset and no padding.
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0
            && self.data.len() == self.len()
            && self
                .shape
                .iter()
                .zip(self.strides.iter().zip(contiguous_strides(&self.shape)))
                .all(|(&d, (&s, c))| d <= 1 || s == c)
    }

    /// Storage index of `idx`, or `None` if it is out of bounds or of the wrong rank.
    pub fn index_of(&self, idx: &[usize]) -> Option<usize> {
        if idx.len() != self.rank() {
            return None;
        }
        idx.iter()
            .zip(&self.shape)
            .zip(&self.strides)
            .try_fold(self.offset, |acc, ((&i, &d), &s)| {
                (i < d).then_some(acc + i * s)
            })
    }

    /// Same storage viewed with its axes reordered: axis `d` of the result is
    /// axis `axes[d]` of `self`.
    ///
    /// # Errors
    /// [`ShiftError::Layout`] if `axes` is not a permutation of `0..rank`.
    pub fn permute(self, axes: &[usize]) -> Result<Self> {
        let mut seen = vec![false; self.rank()];
        let valid = axes.len() == self.rank()
            && axes
                .iter()
                .all(|&a| a < seen.len() && !std::mem::replace(&mut seen[a], true));
        if !valid {
            return Err(ShiftError::Layout {
                reason: format!(
                    "axes {axes:?} are not a permutation of 0..{}",
                    self.rank()
                ),
            });
        }

        Ok(Self {
            shape: axes.iter().map(|&a| self.shape[a]).collect(),
            strides: axes.iter().map(|&a| self.strides[a]).collect(),
            offset: self.offset,
            data: self.data,
        })
    }

    /// Borrowed 4-D view, or `None` if the tensor is not 4-D.
    pub(crate) fn view4(&self) -> Option<View4<'_, T>> {
        if self.rank() != 4 {
            return None;
        }
        Some(View4 {
            data: &self.data,
            offset: self.offset,
            strides: [self.strides[0], self.strides[1], self.strides[2], self.strides[3]],
        })
    }
}

impl<T: Copy> Tensor<T> {
    /// Element at `idx`, or `None` if out of bounds.
    pub fn get(&self, idx: &[usize]) -> Option<T> {
        self.index_of(idx).map(|i| self.data[i])
    }

    /// Logical elements in row-major order, regardless of layout.
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        if self.is_empty() {
            return out;
        }
        let mut idx = vec![0; self.rank()];
        loop {
            let at = idx
                .iter()
                .zip(&self.strides)
                .fold(self.offset, |acc, (&i, &s)| acc + i * s);
            out.push(self.data[at]);

            // odometer increment, last axis fastest
            let mut d = self.rank();
            loop {
                if d == 0 {
                    return out;
                }
                d -= 1;
                idx[d] += 1;
                if idx[d] < self.shape[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
    }

    /// Row-major copy of this tensor.
    #[must_use]
    pub fn to_contiguous(&self) -> Self {
        Self::new(self.shape.clone(), self.to_vec())
    }
}

impl<T: Float> Tensor<T> {
    /// Row-major tensor of zeros.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let len = shape.iter().product();
        Self::new(shape, vec![T::ZERO; len])
    }
}

/// Logical equality: same shape and same elements, whatever the layouts.
impl<T: Copy + PartialEq> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.to_vec() == other.to_vec()
    }
}

/// Panics if `idx` is out of bounds or of the wrong rank; see [`Tensor::get`]
/// for the checked form.
impl<T, const N: usize> Index<[usize; N]> for Tensor<T> {
    type Output = T;

    fn index(&self, idx: [usize; N]) -> &T {
        match self.index_of(&idx) {
            Some(i) => &self.data[i],
            None => panic!("index {idx:?} out of bounds for shape {:?}", self.shape),
        }
    }
}

/// Read-only 4-D addressing used by the kernels.
#[derive(Debug, Clone, Copy)]
pub(crate) struct View4<'a, T> {
    data: &'a [T],
    offset: usize,
    strides: [usize; 4],
}

impl<T: Copy> View4<'_, T> {
    /// Element at `(n, c, h, w)`; the caller guarantees the index is in bounds.
    #[inline]
    pub(crate) fn at(&self, n: usize, c: usize, h: usize, w: usize) -> T {
        let [sn, sc, sh, sw] = self.strides;
        self.data[self.offset + n * sn + c * sc + h * sh + w * sw]
    }
}

/// A value paired with its gradient (used in autograd).
///
/// Typically used as `WithGrad<Tensor<f32>>`.
#[derive(Debug, Clone)]
pub struct WithGrad<T> {
    /// The value.
    pub value: T,
    /// Gradient accumulated for `value`.
    pub grad: T,
}

impl<T: Float> WithGrad<Tensor<T>> {
    /// Wraps `value` with a zero gradient of the same shape.
    pub fn new(value: Tensor<T>) -> Self {
        let grad = Tensor::zeros(value.shape().to_vec());
        Self { value, grad }
    }

    /// Adds `grad` into the stored gradient.
    ///
    /// # Errors
    /// [`ShiftError::ShapeMismatch`] if `grad` does not have the value's shape.
    pub fn accumulate(&mut self, grad: &Tensor<T>) -> Result<()> {
        if grad.shape() != self.grad.shape() {
            return Err(ShiftError::ShapeMismatch {
                op: "accumulate",
                operand: "grad",
                expected: self.grad.shape().to_vec(),
                found: grad.shape().to_vec(),
            });
        }
        let incoming = grad.to_vec();
        let mut current = self.grad.to_vec();
        for (g, d) in current.iter_mut().zip(incoming) {
            *g += d;
        }
        self.grad = Tensor::new(self.grad.shape().to_vec(), current);
        Ok(())
    }

    /// Resets the stored gradient to zero.
    pub fn zero_grad(&mut self) {
        self.grad = Tensor::zeros(self.value.shape().to_vec());
    }
}

/// Defines a row-major tensor from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in shape.
///
/// # Example
/// ```
/// use active_shift::tensor;
/// let t = tensor!([[[[1.0, 2.0], [3.0, 4.0]]]]);
/// assert_eq!(t.shape(), &[1, 1, 2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ($lit:literal) => {
        $crate::tensors::Tensor::new(Vec::<usize>::new(), vec![$lit])
    };

    ([ $( [ $( $inner:tt )* ] ),+ $(,)? ]) => {{
        let children = vec![ $( $crate::tensor!([ $( $inner )* ]) ),+ ];
        let first_shape = children[0].shape().to_vec();
        assert!(children.iter().all(|c| c.shape() == first_shape.as_slice()),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(&first_shape);
        let mut data = Vec::with_capacity(children.len() * children[0].len());
        for c in &children { data.extend(c.to_vec()); }
        $crate::tensors::Tensor::new(shape, data)
    }};

    // innermost row; `expr` also takes negative scalars, which are two tokens
    ([ $( $x:expr ),+ $(,)? ]) => {{
        let data = vec![ $( $x ),+ ];
        $crate::tensors::Tensor::new(vec![data.len()], data)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "incompatible with 3 data elements")]
    fn new_panics_on_element_count_mismatch() {
        let _ = Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn new_is_row_major() {
        let t = Tensor::new(vec![2, 3, 4], vec![0.0_f32; 24]);
        assert_eq!(t.strides(), &[12, 4, 1]);
        assert!(t.is_contiguous());
        assert_eq!(t.index_of(&[1, 2, 3]), Some(23));
        assert_eq!(t.index_of(&[2, 0, 0]), None);
        assert_eq!(t.index_of(&[0, 0]), None);
    }

    #[test]
    fn permute_reads_through_strides() {
        let t = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let tt = t.permute(&[1, 0]).unwrap();
        assert_eq!(tt.shape(), &[3, 2]);
        assert_eq!(tt.strides(), &[1, 3]);
        assert_eq!(tt.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(tt.to_contiguous().strides(), &[2, 1]);
    }

    #[test]
    fn permute_rejects_repeated_axes() {
        let t = Tensor::new(vec![2, 3], vec![0.0; 6]);
        assert!(matches!(
            t.permute(&[0, 0]),
            Err(ShiftError::Layout { .. })
        ));
    }

    #[test]
    fn from_strided_with_offset_and_padding() {
        // 2x2 window starting at (1, 1) of a 3x4 buffer
        let data: Vec<f64> = (0..12).map(f64::from).collect();
        let t = Tensor::from_strided(vec![2, 2], vec![4, 1], 5, data).unwrap();
        assert_eq!(t.to_vec(), vec![5.0, 6.0, 9.0, 10.0]);
        assert!(!t.is_contiguous());
    }

    #[test]
    fn from_strided_rejects_out_of_storage_layouts() {
        let err = Tensor::from_strided(vec![2, 2], vec![4, 1], 7, vec![0.0; 12]).unwrap_err();
        assert!(err.to_string().contains("exceeds storage"));

        let err = Tensor::from_strided(vec![2, 2], vec![1], 0, vec![0.0; 4]).unwrap_err();
        assert!(matches!(err, ShiftError::Layout { .. }));
    }

    #[test]
    fn empty_tensors_have_no_elements() {
        let t = Tensor::<f32>::zeros(vec![2, 0, 3]);
        assert!(t.is_empty());
        assert!(t.to_vec().is_empty());
        let s = Tensor::from_strided(vec![0, 5], vec![5, 1], 0, Vec::<f32>::new()).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn equality_ignores_layout() {
        let a = Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        let b = Tensor::from_strided(vec![2, 2], vec![1, 2], 0, vec![1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tensor_macro_builds_nested_shapes() {
        let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn index_reads_through_strides() {
        let t = Tensor::new(vec![2, 3], vec![1, 2, 3, 4, 5, 6]).permute(&[1, 0]).unwrap();
        assert_eq!(t[[2, 1]], 6);
        assert_eq!(t[[0, 1]], 4);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn index_panics_outside_the_shape() {
        let t = Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(t[[0, 2]], 0.0);
    }

    #[test]
    fn tensor_macro_accepts_negative_entries() {
        let t = tensor!([[0.3, -1.7], [-0.45, 0.8]]);
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.to_vec(), vec![0.3, -1.7, -0.45, 0.8]);

        let t = tensor!([[[-1.0, 2.0]], [[3.0, -4.0]]]);
        assert_eq!(t.shape(), &[2, 1, 2]);
        assert_eq!(t.to_vec(), vec![-1.0, 2.0, 3.0, -4.0]);

        assert_eq!(tensor!(-2.5).to_vec(), vec![-2.5]);
    }

    #[test]
    fn accumulate_sums_and_checks_shape() {
        let mut p = WithGrad::new(Tensor::new(vec![2], vec![1.0_f64, 2.0]));
        p.accumulate(&Tensor::new(vec![2], vec![0.5, 0.25])).unwrap();
        p.accumulate(&Tensor::new(vec![2], vec![0.5, 0.25])).unwrap();
        assert_eq!(p.grad.to_vec(), vec![1.0, 0.5]);

        assert!(p.accumulate(&Tensor::new(vec![3], vec![0.0; 3])).is_err());

        p.zero_grad();
        assert_eq!(p.grad.to_vec(), vec![0.0, 0.0]);
    }
}
