//! The narrow ingress type the lowering pass consumes.
//!
//! This is deliberately not a wrapper around any particular host language's
//! parser output. A caller builds a [`SurfaceFun`] however it likes (from its
//! own parser, from a hand-rolled AST, from a test fixture) and hands it to
//! [`crate::lower_fun`]. Surface lowering is the only place in the pipeline
//! that speaks this vocabulary; everything downstream only ever sees
//! `numjit_core::Expr`.

/// A recognized parameter type annotation spelling. Synonyms collapse onto
/// the same base type: `Int`/`Int64` both pin `Int64`, and `Bool` pins
/// `Int64` too, matching the dialect's Int64-width booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    Int,
    Int64,
    Float,
    Bool,
}

#[derive(Debug, Clone)]
pub struct SurfaceParam {
    pub id: String,
    pub annotation: Option<Annotation>,
}

impl SurfaceParam {
    pub fn new(id: impl Into<String>) -> Self {
        SurfaceParam {
            id: id.into(),
            annotation: None,
        }
    }

    pub fn annotated(id: impl Into<String>, annotation: Annotation) -> Self {
        SurfaceParam {
            id: id.into(),
            annotation: Some(annotation),
        }
    }
}

/// A binary operator spelling, named the way a surface parser would spell
/// its operator node kinds (`Add`, `Sub`, ...) rather than by Core IR tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    Pow,
    Mod,
    BoolAnd,
    BoolOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

/// The augmented-assignment operators the subset recognizes. Anything else
/// (`-=`, `/=`, ...) is not representable here -- a caller building a
/// surface tree for an unsupported augmented op has no variant to reach for,
/// which is deliberate: the lowering's `Unsupported` path is for constructs
/// that exist in the surface grammar but fall outside this enum's reach, not
/// for augmented operators at all (see [`SurfaceStmt::AugAssign`] docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugOp {
    Add,
    Mult,
}

#[derive(Debug, Clone)]
pub enum SurfaceExpr {
    Name(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    BinOp {
        op: BinOp,
        left: Box<SurfaceExpr>,
        right: Box<SurfaceExpr>,
    },
    Compare {
        left: Box<SurfaceExpr>,
        op: CompareOp,
        right: Box<SurfaceExpr>,
    },
    /// `.shape` attribute access. Any other attribute name is rejected by
    /// the lowering pass with `Unsupported`.
    ShapeAttr(Box<SurfaceExpr>),
    /// Subscripting in load context (`value[ix]`).
    Subscript {
        value: Box<SurfaceExpr>,
        index: Box<SurfaceExpr>,
    },
    /// A call to another named function (the host-call bridge target, or a
    /// recursive self-call).
    Call {
        callee: String,
        args: Vec<SurfaceExpr>,
    },
}

#[derive(Debug, Clone)]
pub enum SurfaceStmt {
    Expr(SurfaceExpr),
    Assign {
        target: String,
        value: SurfaceExpr,
    },
    /// An augmented assignment (`target op= value`). Only [`AugOp::Add`] and
    /// [`AugOp::Mult`] are representable; lowering any other augmented
    /// operator a caller's own parser recognizes must be rejected by that
    /// caller before reaching this type, or modeled by the caller as a plain
    /// `Assign` wrapping the equivalent `BinOp` (which the lowering will then
    /// reject via `Unsupported` only if the op itself isn't in the fixed
    /// table of §4.1).
    AugAssign {
        target: String,
        op: AugOp,
        value: SurfaceExpr,
    },
    Return(Option<SurfaceExpr>),
    /// `for target in range(...)` / `for target in xrange(...)`, `iterable`
    /// carries the range-call arguments in source order.
    For {
        target: String,
        iterable: RangeCall,
        body: Vec<SurfaceStmt>,
    },
    If {
        test: SurfaceExpr,
        body: Vec<SurfaceStmt>,
        orelse: Vec<SurfaceStmt>,
    },
    Pass,
    Break,
}

/// The callee of a `for` loop's iterable, restricted by construction to
/// `range`/`xrange` with one, two, or three arguments -- surface parsers
/// build this directly instead of producing an arbitrary `Call` that
/// lowering would then have to pattern-match back apart.
#[derive(Debug, Clone)]
pub struct RangeCall {
    pub callee: String,
    pub args: Vec<SurfaceExpr>,
}

#[derive(Debug, Clone)]
pub struct SurfaceFun {
    pub name: String,
    pub params: Vec<SurfaceParam>,
    pub body: Vec<SurfaceStmt>,
}
