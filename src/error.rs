//! Error taxonomy for the shift kernels.
//!
//! Every precondition is checked before a kernel allocates its output, so an
//! `Err` always means nothing was computed. Out-of-range sampling is never an
//! error: corners that fall outside the feature map read (and receive) zero.

use thiserror::Error;

/// Errors surfaced by tensor construction and the shift operators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShiftError {
    /// An operand has the wrong number of dimensions.
    #[error("{op}: `{operand}` must be {expected}-D, got shape {shape:?}")]
    Rank {
        /// Operation that rejected the operand.
        op: &'static str,
        /// Operand name.
        operand: &'static str,
        /// Required rank.
        expected: usize,
        /// Shape that was supplied.
        shape: Vec<usize>,
    },

    /// The shift table does not have one row per input channel.
    #[error("{op}: shift table has {found} channels but the input has {expected}")]
    ChannelMismatch {
        /// Operation that rejected the operand.
        op: &'static str,
        /// Channel extent of the input.
        expected: usize,
        /// Channel extent of the shift table.
        found: usize,
    },

    /// The shift table carries fewer than two components per channel.
    #[error("{op}: shift table needs at least 2 components per channel, got {found}")]
    ShiftComponents {
        /// Operation that rejected the operand.
        op: &'static str,
        /// Second extent of the shift table.
        found: usize,
    },

    /// A volume that must share the input's shape does not.
    #[error("{op}: `{operand}` has shape {found:?} but the input has shape {expected:?}")]
    ShapeMismatch {
        /// Operation that rejected the operand.
        op: &'static str,
        /// Operand name.
        operand: &'static str,
        /// Input shape.
        expected: Vec<usize>,
        /// Operand shape.
        found: Vec<usize>,
    },

    /// A shift parameter is NaN or infinite.
    #[error("{op}: shift component {component} of channel {channel} is not finite")]
    NonFiniteShift {
        /// Operation that rejected the operand.
        op: &'static str,
        /// Channel index.
        channel: usize,
        /// 0 for the row shift, 1 for the column shift.
        component: usize,
    },

    /// Strides, offset or permutation do not describe a valid tensor.
    #[error("invalid tensor layout: {reason}")]
    Layout {
        /// What is wrong with the layout.
        reason: String,
    },

    /// An element type outside the supported floating-point set.
    #[error("unsupported element type `{name}` (expected f32 or f64)")]
    UnsupportedDType {
        /// Name as supplied by the caller.
        name: String,
    },

    /// Operands of a type-erased call disagree on element type.
    #[error("{op}: `{operand}` is {found} but the input is {expected}")]
    DTypeMismatch {
        /// Operation that rejected the operand.
        op: &'static str,
        /// Operand name.
        operand: &'static str,
        /// Element type of the input.
        expected: crate::float::DType,
        /// Element type of the operand.
        found: crate::float::DType,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = ShiftError> = core::result::Result<T, E>;
