//! Mapping from the fully-specialized type universe to LLVM IR types, and
//! the array ABI struct layout (§3, §4.5, §4.6).

use inkwell::context::Context;
use inkwell::types::{BasicType, BasicTypeEnum, StructType};
use inkwell::AddressSpace;

use numjit_types::{ftv, BaseTy, Ty};

use crate::error::CodegenError;

/// The on-wire array ABI struct: `{ element*, i32 dims, i32* shape }`
/// (§4.5, §6). Built fresh per call since it's cheap and its element type
/// varies with the specialization.
pub fn array_abi_struct<'ctx>(
    context: &'ctx Context,
    elem: BasicTypeEnum<'ctx>,
) -> StructType<'ctx> {
    let ptr = context.ptr_type(AddressSpace::default());
    let _ = elem;
    context.struct_type(
        &[
            ptr.into(),                // data pointer
            context.i32_type().into(), // dims
            ptr.into(),                // shape pointer (i32*)
        ],
        false,
    )
}

/// Converts a fully-determined (ground) type term into its LLVM
/// representation. Fails with `NotDetermined` if a free type variable
/// remains -- codegen must never be invoked on a polymorphic type, only on
/// the output of the specializer.
pub fn ty_to_llvm<'ctx>(
    context: &'ctx Context,
    ty: &Ty,
) -> Result<BasicTypeEnum<'ctx>, CodegenError> {
    if !ftv(ty).is_empty() {
        return Err(CodegenError::NotDetermined(ty.to_string()));
    }
    match ty {
        Ty::Base(BaseTy::Int32) => Ok(context.i32_type().into()),
        Ty::Base(BaseTy::Int64) => Ok(context.i64_type().into()),
        Ty::Base(BaseTy::Float32) => Ok(context.f32_type().into()),
        Ty::Base(BaseTy::Double64) => Ok(context.f64_type().into()),
        // Bool is Int64-width in this dialect (§9 redesign flag).
        Ty::Base(BaseTy::Bool) => Ok(context.i64_type().into()),
        Ty::Base(BaseTy::Void) => Err(CodegenError::CodegenFailure(
            "Void is not a value type".to_string(),
        )),
        Ty::Base(BaseTy::Array) => Err(CodegenError::CodegenFailure(
            "Array is only valid as the head of a Generic(Array, elem) type".to_string(),
        )),
        Ty::Generic(BaseTy::Array, elem) => {
            let elem_ty = ty_to_llvm(context, elem)?;
            Ok(array_abi_struct(context, elem_ty).into())
        }
        Ty::Generic(head, _) => Err(CodegenError::CodegenFailure(format!(
            "unsupported generic constructor head `{head}`"
        ))),
        Ty::Func(..) => Err(CodegenError::CodegenFailure(
            "function types are not a codegen value type".to_string(),
        )),
        Ty::Var(v) => Err(CodegenError::NotDetermined(v.clone())),
    }
}

/// `true` when a (ground) type is the array ABI's `Generic(Array, _)` shape.
pub fn is_array_ty(ty: &Ty) -> bool {
    ty.is_array()
}

/// The element type of an array type, or `None` if `ty` is not an array.
pub fn array_elem_ty(ty: &Ty) -> Option<&Ty> {
    match ty {
        Ty::Generic(BaseTy::Array, elem) => Some(elem),
        _ => None,
    }
}
