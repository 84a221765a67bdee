//! Surface lowering: turns a narrow, host-language-agnostic surface tree
//! into the Core IR `Fun` node that inference and codegen consume.
//!
//! The pipeline must never bind to a specific host-language AST (a Python
//! `ast` module, a JavaScript ESTree, ...); [`surface`] defines the minimal
//! vocabulary this crate is willing to accept instead, and a caller's own
//! parser is responsible for producing it.

pub mod error;
pub mod lower;
pub mod surface;

pub use error::LowerError;
pub use lower::lower_fun;
pub use surface::{
    Annotation, AugOp, BinOp, CompareOp, RangeCall, SurfaceExpr, SurfaceFun, SurfaceParam,
    SurfaceStmt,
};
