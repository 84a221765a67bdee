//! The native ABI wrapper: dynamically builds a call signature for a
//! compiled function's raw address and marshals runtime arguments into it
//! (§4.6).
//!
//! `type_mapping.py`'s `wrap_type` dispatches on the *LLVM* type (inspecting
//! `ir.PointerType.pointee`) to recover the ctypes signature. LLVM 21's
//! fully opaque pointers carry no pointee at the type level, so that
//! dispatch is rebuilt here on the ground `Ty` vector that codegen already
//! specialized against -- the same information, read one stage earlier.

use std::ffi::c_void;

use libffi::middle::{Arg, Cif, CodePtr, Type};

use numjit_types::{BaseTy, Ty};

use crate::error::CodegenError;

/// The three-field array-ABI record passed by pointer for every
/// array-typed argument (§3, §4.5, §4.6).
#[repr(C)]
pub struct ArrayAbiRecord {
    pub data: *mut c_void,
    pub dims: i32,
    pub shape: *mut i32,
}

/// Borrowed array storage handed to a compiled call. The compiled function
/// must not retain `data` past the call returns (§5).
pub struct ArrayArg {
    pub data: *mut c_void,
    pub shape: Vec<i32>,
}

/// A single runtime argument to a specialized function.
pub enum NativeArg {
    Int(i64),
    Float(f64),
    Array(ArrayArg),
}

/// A specialized function's return value, tagged by its native kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeResult {
    Int(i64),
    Float(f64),
    Void,
}

#[derive(Debug, Clone, Copy)]
enum RetKind {
    Int,
    Float,
    Void,
}

/// Maps a ground type to its libffi signature element, mirroring
/// `wrap_type`'s case split: integer widths map by bit-width, doubles and
/// floats map directly, and the array ABI maps to a pointer (its fields are
/// read back out of the pointee by the callee, not by libffi itself).
fn native_type(ty: &Ty) -> Result<Type, CodegenError> {
    match ty {
        Ty::Base(BaseTy::Int32) => Ok(Type::i32()),
        Ty::Base(BaseTy::Int64) | Ty::Base(BaseTy::Bool) => Ok(Type::i64()),
        Ty::Base(BaseTy::Float32) => Ok(Type::f32()),
        Ty::Base(BaseTy::Double64) => Ok(Type::f64()),
        Ty::Base(BaseTy::Void) => Ok(Type::void()),
        Ty::Generic(BaseTy::Array, _) => Ok(Type::pointer()),
        other => Err(CodegenError::CodegenFailure(format!(
            "no native ABI mapping for type `{other}`"
        ))),
    }
}

fn ret_kind(ty: &Ty) -> Result<RetKind, CodegenError> {
    match ty {
        Ty::Base(BaseTy::Void) => Ok(RetKind::Void),
        Ty::Base(BaseTy::Float32) | Ty::Base(BaseTy::Double64) => Ok(RetKind::Float),
        Ty::Base(BaseTy::Int32) | Ty::Base(BaseTy::Int64) | Ty::Base(BaseTy::Bool) => {
            Ok(RetKind::Int)
        }
        other => Err(CodegenError::CodegenFailure(format!(
            "unsupported native return type `{other}`"
        ))),
    }
}

/// A callable handle to one specialized, compiled function: its raw code
/// address plus the dynamically built call signature needed to invoke it
/// with runtime-typed arguments -- the JIT analogue of `wrap_function`.
pub struct NativeFunction {
    cif: Cif,
    code: CodePtr,
    arity: usize,
    ret_kind: RetKind,
}

impl NativeFunction {
    pub fn new(address: usize, arg_types: &[Ty], ret_type: &Ty) -> Result<Self, CodegenError> {
        let ffi_args = arg_types
            .iter()
            .map(native_type)
            .collect::<Result<Vec<_>, _>>()?;
        let ffi_ret = native_type(ret_type)?;
        let cif = Cif::new(ffi_args, ffi_ret);
        let code = CodePtr::from_ptr(address as *const c_void);
        Ok(NativeFunction {
            cif,
            code,
            arity: arg_types.len(),
            ret_kind: ret_kind(ret_type)?,
        })
    }

    /// Marshals `args` (extracting each array's data pointer, dimension
    /// count, and shape vector into a pointer-passed record; scalars pass
    /// through unchanged) and invokes the compiled function.
    ///
    /// # Safety
    /// The caller must ensure `address` still refers to a live, compiled
    /// function whose signature matches `arg_types`/`ret_type` exactly, and
    /// that every `ArrayArg`'s `data` pointer remains valid for the call.
    pub unsafe fn call(&self, args: &[NativeArg]) -> Result<NativeResult, CodegenError> {
        if args.len() != self.arity {
            return Err(CodegenError::CodegenFailure(format!(
                "arity mismatch: expected {}, got {}",
                self.arity,
                args.len()
            )));
        }

        let records: Vec<ArrayAbiRecord> = args
            .iter()
            .filter_map(|a| match a {
                NativeArg::Array(arr) => Some(ArrayAbiRecord {
                    data: arr.data,
                    dims: arr.shape.len() as i32,
                    shape: arr.shape.as_ptr() as *mut i32,
                }),
                _ => None,
            })
            .collect();

        let mut ffi_args = Vec::with_capacity(args.len());
        let mut record_idx = 0;
        for a in args {
            match a {
                NativeArg::Int(n) => ffi_args.push(Arg::new(n)),
                NativeArg::Float(f) => ffi_args.push(Arg::new(f)),
                NativeArg::Array(_) => {
                    ffi_args.push(Arg::new(&records[record_idx]));
                    record_idx += 1;
                }
            }
        }

        Ok(match self.ret_kind {
            RetKind::Int => NativeResult::Int(self.cif.call::<i64>(self.code, &ffi_args)),
            RetKind::Float => NativeResult::Float(self.cif.call::<f64>(self.code, &ffi_args)),
            RetKind::Void => {
                self.cif.call::<()>(self.code, &ffi_args);
                NativeResult::Void
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numjit_types::{BOOL, DOUBLE64, INT64, VOID};

    #[test]
    fn scalar_types_map_to_their_bit_width() {
        assert!(native_type(&INT64).is_ok());
        assert!(native_type(&DOUBLE64).is_ok());
    }

    #[test]
    fn bool_shares_int64s_native_width() {
        assert!(matches!(ret_kind(&BOOL).unwrap(), RetKind::Int));
        assert!(matches!(ret_kind(&INT64).unwrap(), RetKind::Int));
    }

    #[test]
    fn void_return_has_no_result_payload() {
        assert!(matches!(ret_kind(&VOID).unwrap(), RetKind::Void));
    }

    #[test]
    fn array_type_maps_to_a_pointer() {
        let t = Ty::array(INT64);
        assert!(native_type(&t).is_ok());
    }

    #[test]
    fn function_types_have_no_native_mapping() {
        let t = Ty::func(vec![INT64], INT64);
        assert!(native_type(&t).is_err());
    }
}
