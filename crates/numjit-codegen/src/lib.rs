//! LLVM code generation and the native ABI wrapper for a single specialized
//! function (§4.5, §4.6).

pub mod abi;
pub mod codegen;
pub mod error;
pub mod host;
pub mod mangle;
pub mod types;

pub use abi::{ArrayAbiRecord, ArrayArg, NativeArg, NativeFunction, NativeResult};
pub use codegen::compile_fun;
pub use error::CodegenError;
pub use host::{parse_host_annotation, HostFunction, HostRegistry, HostTy};
pub use mangle::{mangle, stable_hash};
pub use types::{array_abi_struct, array_elem_ty, is_array_ty, ty_to_llvm};
