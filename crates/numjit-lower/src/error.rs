use thiserror::Error;

/// Failures raised while lowering a [`crate::surface::SurfaceFun`] into Core
/// IR. Every variant corresponds to a rejection rule in §4.1: the lowering
/// pass either produces a `Fun` node or fails outright, it never produces a
/// partial one.
#[derive(Debug, Error, PartialEq)]
pub enum LowerError {
    /// A construct outside the accepted surface subset (an augmented op
    /// other than `+=`/`*=`, an attribute other than `.shape`, a store-context
    /// subscript, a `for` loop whose iterable isn't `range`/`xrange`, ...).
    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

impl LowerError {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        LowerError::Unsupported(construct.into())
    }
}
