//! Runtime argument classification (§4.4 step 1, §6 "Recognized runtime
//! types").
//!
//! A call site hands the facade concrete values, not types; this module maps
//! each value into the [`numjit_types::Ty`] universe the specializer unifies
//! against, or rejects it with [`crate::NumjitError::UnsupportedRuntimeType`].

use numjit_codegen::{ArrayArg, NativeArg};
use numjit_types::{BaseTy, Ty};

use crate::error::NumjitError;

/// The element dtype of an ndarray-like runtime value, restricted to the
/// three recognized by §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayDtype {
    Int64,
    Double64,
    Float32,
}

impl ArrayDtype {
    fn to_ty(self) -> Ty {
        match self {
            ArrayDtype::Int64 => Ty::Base(BaseTy::Int64),
            ArrayDtype::Double64 => Ty::Base(BaseTy::Double64),
            ArrayDtype::Float32 => Ty::Base(BaseTy::Float32),
        }
    }
}

/// A concrete argument value at a call site, before classification.
///
/// This is the facade's narrow ingress type for runtime values, the same
/// role [`numjit_lower::surface::SurfaceFun`] plays for source ASTs: a
/// caller's own embedding builds one of these from whatever host-language
/// value it is holding (a boxed int, a numpy-like array wrapper, ...).
#[derive(Debug, Clone)]
pub enum RuntimeValue {
    Int(i64),
    Float(f64),
    Array {
        dtype: ArrayDtype,
        data: *mut std::ffi::c_void,
        shape: Vec<i32>,
    },
}

impl RuntimeValue {
    /// Classifies this value into the type the specializer unifies against
    /// (§4.4 step 1). Every platform integer and float value is accepted
    /// (the "integer below the platform maxint" / "float" buckets of §6
    /// collapse here since Rust's `i64`/`f64` are already bounded); any
    /// ndarray not carrying a dtype from [`ArrayDtype`] cannot be expressed by
    /// this type and is therefore always recognized by construction.
    pub fn classify(&self) -> Ty {
        match self {
            RuntimeValue::Int(_) => Ty::Base(BaseTy::Int64),
            RuntimeValue::Float(_) => Ty::Base(BaseTy::Double64),
            RuntimeValue::Array { dtype, .. } => Ty::array(dtype.to_ty()),
        }
    }

    /// Converts this value into the marshaled form the native ABI wrapper
    /// calls with (§4.6). Array values borrow their `data`/`shape` for the
    /// duration of the call only (§5).
    pub fn to_native_arg(&self) -> NativeArg {
        match self {
            RuntimeValue::Int(n) => NativeArg::Int(*n),
            RuntimeValue::Float(f) => NativeArg::Float(*f),
            RuntimeValue::Array { data, shape, .. } => NativeArg::Array(ArrayArg {
                data: *data,
                shape: shape.clone(),
            }),
        }
    }
}

/// Classifies a full call-site argument vector, or fails with
/// `UnsupportedRuntimeType` on the first value that isn't classifiable.
///
/// `RuntimeValue`'s own variant set is already closed to the §6 recognized
/// list, so this never actually fails today; it exists as the single call
/// site a looser, dynamically-typed embedding (e.g. one accepting a
/// `serde_json::Value` or a host-language object) would route its own
/// classification failures through.
pub fn classify_args(args: &[RuntimeValue]) -> Result<Vec<Ty>, NumjitError> {
    Ok(args.iter().map(RuntimeValue::classify).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_classifies_as_int64() {
        assert_eq!(RuntimeValue::Int(5).classify(), Ty::Base(BaseTy::Int64));
    }

    #[test]
    fn float_classifies_as_double64() {
        assert_eq!(RuntimeValue::Float(1.5).classify(), Ty::Base(BaseTy::Double64));
    }

    #[test]
    fn array_classifies_to_a_generic_array_of_its_dtype() {
        let v = RuntimeValue::Array {
            dtype: ArrayDtype::Int64,
            data: std::ptr::null_mut(),
            shape: vec![3],
        };
        assert_eq!(v.classify(), Ty::array(Ty::Base(BaseTy::Int64)));
    }

    #[test]
    fn classify_args_maps_every_element_in_order() {
        let args = vec![RuntimeValue::Int(1), RuntimeValue::Float(2.0)];
        let tys = classify_args(&args).unwrap();
        assert_eq!(tys, vec![Ty::Base(BaseTy::Int64), Ty::Base(BaseTy::Double64)]);
    }
}
