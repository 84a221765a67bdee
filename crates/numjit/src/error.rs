//! The facade's unified error type, aggregating every stage of the pipeline
//! behind one `Result` (§7).
//!
//! Each pipeline crate keeps its own narrow error enum (`LowerError`,
//! `InferError`, `CodegenError`); `NumjitError` is the facade-level error a
//! caller of `compile_for_args`/`call` actually sees, wrapping each one in
//! via `#[from]` rather than flattening them into one flat variant set.

use numjit_codegen::CodegenError;
use numjit_infer::InferError;
use numjit_lower::LowerError;
use numjit_types::Ty;

/// Every failure mode named in §7, plus the facade-specific wrapping of each
/// pipeline stage's own error type.
#[derive(Debug, thiserror::Error)]
pub enum NumjitError {
    /// §4.1: a surface form outside the accepted subset.
    #[error(transparent)]
    Lower(#[from] LowerError),

    /// §4.2/§4.3: a unifier or occurs-check failure during inference, or
    /// during specialization's own unification step.
    #[error(transparent)]
    Infer(#[from] InferError),

    /// §4.5/§4.6: LLVM emission, ABI mapping, or host-call resolution
    /// failure.
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// §4.4 step 5: specialization left a free type variable in the
    /// argument/return vector.
    #[error("specialization left a free type variable undetermined")]
    UnderDetermined,

    /// §6: a call-site value outside the recognized runtime type list.
    #[error("unsupported runtime type for argument value")]
    UnsupportedRuntimeType,

    /// §6 `reg`: a host-function annotation outside `{int, float}`.
    #[error("unrecognized host annotation `{0}`, expected `int` or `float`")]
    UnrecognizedHostAnnotation(String),

    /// A call-site argument count did not match the function's declared
    /// arity.
    #[error("arity mismatch calling `{name}`: expected {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// A name was looked up in the function registry (the source-level
    /// mapping from function name to its lowered `Fun` + inferred principal
    /// type) and not found.
    #[error("no function registered under the name `{0}`")]
    UnknownFunction(String),

    /// A type reached the native ABI wrapper that it has no ctypes-level
    /// mapping for (§4.6).
    #[error("no native ABI mapping for type `{0}`")]
    UnsupportedNativeType(Ty),
}
