//! The numjit Core IR: typed tree nodes for the numeric dialect subset.
//!
//! Produced by `numjit-lower` from a host-language AST and consumed by
//! `numjit-infer` (type inference) and `numjit-codegen` (LLVM emission).
//! Trees are immutable after lowering except for the inferred-type
//! annotation slot a handful of node kinds carry (§3 invariant i/ii).

pub mod node;

pub use node::{
    CmpOp, Const, Expr, Fun, Param, PrimOp, ARITHMETIC_OPS, COMPARISON_OPS,
};
