//! DType dispatch utilities
//!
//! This module provides the `dispatch_float_complex!` macro for runtime type
//! dispatch: it takes a `DType` value and executes a code block with `T`
//! bound to the corresponding Rust type, for the closed set of element types
//! the multiply-accumulate operation supports.
//!
//! # Usage
//!
//! ```ignore
//! fn my_operation(dtype: DType) -> Result<()> {
//!     dispatch_float_complex!(dtype, T => {
//!         // T is now a concrete type (f32, f64, Complex64, ...)
//!         run::<T>()
//!     }, "my_operation")
//! }
//! ```
//!
//! # Supported Types
//!
//! - `F64` -> `f64`
//! - `F32` -> `f32`
//! - `F16` -> `half::f16` (requires "f16" feature)
//! - `BF16` -> `half::bf16` (requires "f16" feature)
//! - `Complex64` -> `crate::dtype::Complex64`
//! - `Complex128` -> `crate::dtype::Complex128`
//!
//! Every other dtype returns an `UnsupportedDType` error from the enclosing
//! function, before any device work is issued.

/// Internal helper macro to dispatch types requiring the "f16" feature.
/// Parameterized by type to avoid duplicating the macro for F16 vs BF16.
#[macro_export]
#[doc(hidden)]
macro_rules! dispatch_half_type {
    ($T:ident, $body:block, $dtype:expr, $error_op:expr, $type:ty) => {{
        #[cfg(feature = "f16")]
        {
            type $T = $type;
            $body
        }
        #[cfg(not(feature = "f16"))]
        {
            return Err($crate::error::Error::FeatureRequired {
                dtype: $dtype,
                feature: "f16",
            });
        }
    }};
}

/// Macro for runtime dtype dispatch over the supported element types
///
/// Executes `$body` with `$T` bound to the concrete Rust type matching
/// `$dtype`. Unsupported dtypes (integers, bool) make the enclosing
/// function return `UnsupportedDType` immediately.
#[macro_export]
macro_rules! dispatch_float_complex {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                $crate::dispatch_half_type!($T, $body, $dtype, $error_op, half::f16)
            }
            $crate::dtype::DType::BF16 => {
                $crate::dispatch_half_type!($T, $body, $dtype, $error_op, half::bf16)
            }
            $crate::dtype::DType::Complex64 => {
                type $T = $crate::dtype::Complex64;
                $body
            }
            $crate::dtype::DType::Complex128 => {
                type $T = $crate::dtype::Complex128;
                $body
            }
            other => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: other,
                    op: $error_op,
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::dtype::DType;
    use crate::error::{Error, Result};

    fn size_of_dtype(dtype: DType) -> Result<usize> {
        dispatch_float_complex!(dtype, T => {
            Ok(std::mem::size_of::<T>())
        }, "size_of_dtype")
    }

    #[test]
    fn test_dispatch_supported_types() {
        assert_eq!(size_of_dtype(DType::F64).unwrap(), 8);
        assert_eq!(size_of_dtype(DType::F32).unwrap(), 4);
        assert_eq!(size_of_dtype(DType::Complex64).unwrap(), 8);
        assert_eq!(size_of_dtype(DType::Complex128).unwrap(), 16);
        #[cfg(feature = "f16")]
        {
            assert_eq!(size_of_dtype(DType::F16).unwrap(), 2);
            assert_eq!(size_of_dtype(DType::BF16).unwrap(), 2);
        }
    }

    #[test]
    fn test_dispatch_rejects_unsupported_types() {
        for dtype in [DType::I64, DType::I32, DType::U8, DType::Bool] {
            match size_of_dtype(dtype) {
                Err(Error::UnsupportedDType { dtype: got, op }) => {
                    assert_eq!(got, dtype);
                    assert_eq!(op, "size_of_dtype");
                }
                other => panic!("expected UnsupportedDType, got {:?}", other),
            }
        }
    }
}
