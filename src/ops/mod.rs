//! # Shift kernels
//!
//! ## Submodules
//!
//! - [`corner`] — bilinear corner addressing shared by both passes
//! - [`cpu`] — forward sampler and gradient propagator over a [`BatchScheduler`](crate::backend::BatchScheduler)
//! - [`dispatch`] — precondition checks, backend selection and element-type dispatch
//!
//! ## Notes
//!
//! - The kernels in [`cpu`] assume validated operands; call through
//!   [`dispatch`] (or [`crate::backprop`]) unless the shapes are already known
//!   to be correct.
//! - Out-of-map corners are zero in both directions.

pub mod corner;
pub mod cpu;
pub mod dispatch;
