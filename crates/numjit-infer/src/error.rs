use numjit_types::Ty;
use thiserror::Error;

/// Failures raised by the constraint solver and the inference visitor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferError {
    /// The unifier reached two structurally incompatible type terms.
    #[error("type mismatch: given `{0}`, expected `{1}`")]
    TypeMismatch(Ty, Ty),
    /// An occurs-check violation: a type variable would have to unify with a
    /// type term that contains itself.
    #[error("infinite type: `{0}` occurs in `{1}`")]
    InfiniteType(String, Ty),
}
