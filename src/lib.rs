//! # `active_shift`
//!
//! Differentiable per-channel spatial shift ("Active Shift") for 4-D feature
//! maps. Every channel of an `[N, C, H, W]` tensor is translated by a learned,
//! possibly fractional, `(row, column)` offset using bilinear interpolation,
//! and the matching gradient operator carries the upstream error back to the
//! input.
//!
//! ## Features
//!
//! - **Tensors**: strided N-dimensional arrays; non-contiguous inputs are read
//!   in place through their strides
//! - **Autograd**: functional-style forward pass returning a backward closure
//! - **Parallelism**: batch elements fanned out over a rayon pool, with
//!   bit-identical results for any thread count
//! - **Element types**: `f32` and `f64`, plus a type-erased entry point
//!
//! ## Example
//!
//! ```rust
//! use active_shift::backprop::{backward, forward};
//! use active_shift::tensors::Tensor;
//!
//! let input = Tensor::new(vec![1, 1, 2, 2], vec![1.0, 2.0, 3.0, 4.0]);
//! let theta = Tensor::new(vec![1, 2], vec![0.5, 0.0]);
//!
//! let out = forward(&input, &theta).unwrap();
//! assert_eq!(out.to_vec(), vec![2.0, 3.0, 1.5, 2.0]);
//!
//! let grad = backward(&Tensor::new(vec![1, 1, 2, 2], vec![1.0; 4]), &input, &theta).unwrap();
//! assert_eq!(grad.shape(), input.shape());
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::many_single_char_names,
    clippy::similar_names,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_panics_doc
)]
#![deny(unsafe_code)]
#![forbid(missing_docs)]

pub mod approx;
pub mod backend;
pub mod backprop;
pub mod error;
pub mod float;
pub mod ops;
pub mod tensors;

pub use error::{Result, ShiftError};
pub use float::{DType, Float};
pub use tensors::{Tensor, WithGrad};
