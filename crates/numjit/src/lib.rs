//! `numjit`: a just-in-time compiler for a numeric subset of a
//! dynamically-scoped scripting language. A function is lowered, its
//! principal type inferred once, and then specialized and compiled lazily
//! per call-site argument-type signature rather than ahead of time against
//! fixed source-level annotations.
//!
//! The pipeline, front to back:
//! 1. [`numjit_lower`] lowers a narrow surface AST into [`numjit_core::Fun`].
//! 2. [`numjit_infer`] infers a principal, possibly polymorphic type.
//! 3. [`specialize`] unifies that principal type against one call site's
//!    classified runtime argument types, producing a ground signature.
//! 4. [`numjit_codegen`] emits and JITs that one monomorphic variant.
//! 5. [`cache`] remembers it so the next call under the same signature skips
//!    straight to step 5's compiled entry.
//!
//! [`JitContext`] is the single value holding all of this state; a caller
//! builds one, [`JitContext::register`]s every source function up front, and
//! then drives calls through [`JitContext::compile_for_args`].

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod runtime;
pub mod specialize;

pub use cache::CompilationCache;
pub use config::{CompileOptions, OptLevel};
pub use context::JitContext;
pub use error::NumjitError;
pub use runtime::{classify_args, ArrayDtype, RuntimeValue};
pub use specialize::{specialize, Specialized};

pub use numjit_codegen::{HostTy, NativeArg, NativeResult};
pub use numjit_core::Fun;
pub use numjit_lower::lower_fun;
pub use numjit_lower::surface::{
    Annotation, AugOp, BinOp, CompareOp, RangeCall, SurfaceExpr, SurfaceFun, SurfaceParam,
    SurfaceStmt,
};
pub use numjit_types::Ty;
