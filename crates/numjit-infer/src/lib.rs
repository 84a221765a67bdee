//! Hindley-Milner type inference over the Core IR, and the constraint
//! solver it relies on.
//!
//! [`infer_fun`] walks a lowered [`numjit_core::Fun`], generating equality
//! constraints per §4.2's visitor rules and stamping a fresh type variable
//! onto every node that carries a type slot. [`unify::solve`] discharges the
//! accumulated constraints into a most-general unifier.

pub mod error;
pub mod fresh;
pub mod infer;
pub mod subst;
pub mod unify;

pub use error::InferError;
pub use fresh::FreshVarGen;
pub use infer::{infer_fun, Env, Inferred};
pub use subst::{apply, apply_constraints, compose, Subst};
pub use unify::{bind, solve, unify};
