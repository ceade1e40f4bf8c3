//! Operation dispatch layer.
//!
//! Checks every precondition before a kernel runs, then hands the call to the
//! scheduler selected by the global [`Backend`](crate::backend::Backend) (or an
//! explicit one via [`forward_on`] / [`backward_on`]).
//!
//! [`DynTensor`] is the type-erased boundary: [`forward_dyn`] and
//! [`backward_dyn`] pick the `f32` or `f64` kernel from the input's element
//! type and reject operands of another type.

use tracing::{debug, debug_span};

use super::cpu;
use crate::backend::{get_backend, Backend, BatchScheduler, Rayon, Serial};
use crate::error::{Result, ShiftError};
use crate::float::{DType, Float};
use crate::tensors::Tensor;

const FORWARD: &str = "active_shift_forward";
const BACKWARD: &str = "active_shift_backward";

fn check_rank<T>(op: &'static str, operand: &'static str, t: &Tensor<T>, expected: usize) -> Result<()> {
    if t.rank() == expected {
        Ok(())
    } else {
        Err(ShiftError::Rank {
            op,
            operand,
            expected,
            shape: t.shape().to_vec(),
        })
    }
}

/// Validates `input` `[N, C, H, W]` against `theta` `[C, ≥2]` with finite entries.
fn check_input_and_theta<T: Float>(op: &'static str, input: &Tensor<T>, theta: &Tensor<T>) -> Result<()> {
    check_rank(op, "input", input, 4)?;
    check_rank(op, "theta", theta, 2)?;

    let channels = input.shape()[1];
    if theta.shape()[0] != channels {
        return Err(ShiftError::ChannelMismatch {
            op,
            expected: channels,
            found: theta.shape()[0],
        });
    }
    if theta.shape()[1] < 2 {
        return Err(ShiftError::ShiftComponents {
            op,
            found: theta.shape()[1],
        });
    }

    for channel in 0..channels {
        for component in 0..2 {
            let finite = theta
                .get(&[channel, component])
                .is_some_and(Float::is_finite);
            if !finite {
                return Err(ShiftError::NonFiniteShift {
                    op,
                    channel,
                    component,
                });
            }
        }
    }
    Ok(())
}

fn check_forward<T: Float>(input: &Tensor<T>, theta: &Tensor<T>) -> Result<()> {
    check_input_and_theta(FORWARD, input, theta).inspect_err(|e| debug!(error = %e, "rejected"))
}

fn check_backward<T: Float>(out_grad: &Tensor<T>, input: &Tensor<T>, theta: &Tensor<T>) -> Result<()> {
    check_input_and_theta(BACKWARD, input, theta)
        .and_then(|()| {
            if out_grad.shape() == input.shape() {
                Ok(())
            } else {
                Err(ShiftError::ShapeMismatch {
                    op: BACKWARD,
                    operand: "out_grad",
                    expected: input.shape().to_vec(),
                    found: out_grad.shape().to_vec(),
                })
            }
        })
        .inspect_err(|e| debug!(error = %e, "rejected"))
}

/// Forward sampling on an explicit scheduler.
///
/// # Errors
/// Any shape or shift-table precondition violation; nothing is computed then.
pub fn forward_on<T, S>(input: &Tensor<T>, theta: &Tensor<T>, sched: &S) -> Result<Tensor<T>>
where
    T: Float,
    S: BatchScheduler,
{
    check_forward(input, theta)?;
    let s = input.shape();
    let _span = debug_span!(
        "active_shift_forward",
        n = s[0],
        c = s[1],
        h = s[2],
        w = s[3],
        dtype = T::DTYPE.name(),
        scheduler = sched.name()
    )
    .entered();
    Ok(cpu::forward(input, theta, sched))
}

/// Input gradient on an explicit scheduler.
///
/// # Errors
/// Any shape or shift-table precondition violation, including an `out_grad`
/// whose shape differs from `input`'s.
pub fn backward_on<T, S>(
    out_grad: &Tensor<T>,
    input: &Tensor<T>,
    theta: &Tensor<T>,
    sched: &S,
) -> Result<Tensor<T>>
where
    T: Float,
    S: BatchScheduler,
{
    check_backward(out_grad, input, theta)?;
    let s = input.shape();
    let _span = debug_span!(
        "active_shift_backward",
        n = s[0],
        c = s[1],
        h = s[2],
        w = s[3],
        dtype = T::DTYPE.name(),
        scheduler = sched.name()
    )
    .entered();
    Ok(cpu::backward(out_grad, theta, sched))
}

/// Forward sampling on the globally selected backend.
///
/// # Errors
/// See [`forward_on`].
pub fn forward<T: Float>(input: &Tensor<T>, theta: &Tensor<T>) -> Result<Tensor<T>> {
    match get_backend() {
        Backend::Cpu => forward_on(input, theta, &Rayon),
        Backend::Serial => forward_on(input, theta, &Serial),
    }
}

/// Input gradient on the globally selected backend.
///
/// # Errors
/// See [`backward_on`].
pub fn backward<T: Float>(out_grad: &Tensor<T>, input: &Tensor<T>, theta: &Tensor<T>) -> Result<Tensor<T>> {
    match get_backend() {
        Backend::Cpu => backward_on(out_grad, input, theta, &Rayon),
        Backend::Serial => backward_on(out_grad, input, theta, &Serial),
    }
}

/// Tensor whose element type is only known at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DynTensor {
    /// Single precision.
    F32(Tensor<f32>),
    /// Double precision.
    F64(Tensor<f64>),
}

impl DynTensor {
    /// Element type.
    pub fn dtype(&self) -> DType {
        match self {
            Self::F32(_) => DType::F32,
            Self::F64(_) => DType::F64,
        }
    }

    /// Extents.
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::F32(t) => t.shape(),
            Self::F64(t) => t.shape(),
        }
    }
}

impl From<Tensor<f32>> for DynTensor {
    fn from(t: Tensor<f32>) -> Self {
        Self::F32(t)
    }
}

impl From<Tensor<f64>> for DynTensor {
    fn from(t: Tensor<f64>) -> Self {
        Self::F64(t)
    }
}

fn mismatch(op: &'static str, operand: &'static str, input: &DynTensor, other: &DynTensor) -> ShiftError {
    let err = ShiftError::DTypeMismatch {
        op,
        operand,
        expected: input.dtype(),
        found: other.dtype(),
    };
    debug!(error = %err, "rejected");
    err
}

/// [`forward`] on type-erased operands.
///
/// # Errors
/// [`ShiftError::DTypeMismatch`] if `theta`'s element type differs from
/// `input`'s, otherwise as [`forward`].
pub fn forward_dyn(input: &DynTensor, theta: &DynTensor) -> Result<DynTensor> {
    match (input, theta) {
        (DynTensor::F32(x), DynTensor::F32(t)) => forward(x, t).map(DynTensor::F32),
        (DynTensor::F64(x), DynTensor::F64(t)) => forward(x, t).map(DynTensor::F64),
        _ => Err(mismatch(FORWARD, "theta", input, theta)),
    }
}

/// [`backward`] on type-erased operands.
///
/// # Errors
/// [`ShiftError::DTypeMismatch`] if `out_grad` or `theta` differ from
/// `input`'s element type, otherwise as [`backward`].
pub fn backward_dyn(out_grad: &DynTensor, input: &DynTensor, theta: &DynTensor) -> Result<DynTensor> {
    match (out_grad, input, theta) {
        (DynTensor::F32(g), DynTensor::F32(x), DynTensor::F32(t)) => backward(g, x, t).map(DynTensor::F32),
        (DynTensor::F64(g), DynTensor::F64(x), DynTensor::F64(t)) => backward(g, x, t).map(DynTensor::F64),
        _ if out_grad.dtype() != input.dtype() => Err(mismatch(BACKWARD, "out_grad", input, out_grad)),
        _ => Err(mismatch(BACKWARD, "theta", input, theta)),
    }
}
