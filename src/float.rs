//! Element types accepted by the shift kernels.
//!
//! Only single and double precision are supported. The kernels are generic
//! over [`Float`]; [`DType`] names the element type at the type-erased
//! boundary (see [`crate::ops::dispatch::DynTensor`]).

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Sub};
use core::str::FromStr;

use crate::error::ShiftError;

/// Floating-point element usable by the kernels.
pub trait Float:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + 'static
{
    /// Additive identity.
    const ZERO: Self;
    /// Multiplicative identity.
    const ONE: Self;
    /// Runtime tag of this type.
    const DTYPE: DType;

    /// Largest integer not greater than `self`.
    fn floor(self) -> Self;

    /// `false` for NaN and the infinities.
    fn is_finite(self) -> bool;

    /// Truncating conversion of an integral value; saturates at the `i64` range.
    fn to_i64(self) -> i64;

    /// Convert to `f64`.
    fn into_f64(self) -> f64;

    /// Convert from `f64`.
    fn from_f64(x: f64) -> Self;
}

impl Float for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const DTYPE: DType = DType::F32;

    fn floor(self) -> Self {
        f32::floor(self)
    }

    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_i64(self) -> i64 {
        self as i64
    }

    fn into_f64(self) -> f64 {
        f64::from(self)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(x: f64) -> Self {
        x as Self
    }
}

impl Float for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const DTYPE: DType = DType::F64;

    fn floor(self) -> Self {
        f64::floor(self)
    }

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_i64(self) -> i64 {
        self as i64
    }

    fn into_f64(self) -> f64 {
        self
    }

    fn from_f64(x: f64) -> Self {
        x
    }
}

/// Runtime element type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// `f32`.
    F32,
    /// `f64`.
    F64,
}

impl DType {
    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = ShiftError;

    /// Accepts the spellings host frameworks commonly use for the two
    /// supported types; anything else is an [`ShiftError::UnsupportedDType`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f32" | "float32" | "float" => Ok(Self::F32),
            "f64" | "float64" | "double" => Ok(Self::F64),
            _ => Err(ShiftError::UnsupportedDType { name: s.to_owned() }),
        }
    }
}
