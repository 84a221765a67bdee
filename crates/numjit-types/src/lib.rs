//! The numjit type system: the universe of type terms shared by every stage
//! of the compilation pipeline -- base types, type variables, the unary
//! generic array constructor, and function types.
//!
//! The variant set is closed (§3 of the design): a [`Ty`] is always one of
//! [`Ty::Base`], [`Ty::Var`], [`Ty::Generic`], or [`Ty::Func`]. Equality is
//! structural, matching the source dialect's `__eq__` overrides on its four
//! type-term classes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Base (nullary) type constants.
///
/// `Array` is a sentinel: it is never used as a standalone value type, only
/// as the head of a [`Ty::Generic`] constructor (`Generic(Array, element)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseTy {
    Int32,
    Int64,
    Float32,
    Double64,
    Bool,
    Void,
    Array,
}

impl fmt::Display for BaseTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BaseTy::Int32 => "Int32",
            BaseTy::Int64 => "Int64",
            BaseTy::Float32 => "Float32",
            BaseTy::Double64 => "Double64",
            BaseTy::Bool => "Bool",
            BaseTy::Void => "Void",
            BaseTy::Array => "Array",
        };
        write!(f, "{s}")
    }
}

/// A type term: the closed variant set described by §3 of the design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ty {
    /// A nullary base type.
    Base(BaseTy),
    /// A type variable, identified by name.
    Var(String),
    /// A unary parametric constructor. Only `Generic(Array, _)` is produced
    /// by this pipeline, but the shape is kept general to match the source
    /// dialect's `GenericType(a, b)`.
    Generic(BaseTy, Box<Ty>),
    /// An n-ary function type.
    Func(Vec<Ty>, Box<Ty>),
}

impl Ty {
    /// Shorthand for `Generic(Array, element)`.
    pub fn array(element: Ty) -> Ty {
        Ty::Generic(BaseTy::Array, Box::new(element))
    }

    /// `true` for any `Generic(Array, _)` type.
    pub fn is_array(&self) -> bool {
        matches!(self, Ty::Generic(BaseTy::Array, _))
    }

    pub fn var(name: impl Into<String>) -> Ty {
        Ty::Var(name.into())
    }

    pub fn func(args: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Func(args, Box::new(ret))
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Base(b) => write!(f, "{b}"),
            Ty::Var(v) => write!(f, "{v}"),
            Ty::Generic(head, arg) => write!(f, "{head} {arg}"),
            Ty::Func(args, ret) => {
                write!(f, "(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}

/// Well-known base-type constants, for reaching for a ground type without
/// constructing `Ty::Base(BaseTy::...)` at every call site.
pub const INT32: Ty = Ty::Base(BaseTy::Int32);
pub const INT64: Ty = Ty::Base(BaseTy::Int64);
pub const FLOAT32: Ty = Ty::Base(BaseTy::Float32);
pub const DOUBLE64: Ty = Ty::Base(BaseTy::Double64);
pub const BOOL: Ty = Ty::Base(BaseTy::Bool);
pub const VOID: Ty = Ty::Base(BaseTy::Void);

/// Free type variables of a type term (`ftv` in the source dialect).
pub fn ftv(ty: &Ty) -> BTreeSet<String> {
    match ty {
        Ty::Base(_) => BTreeSet::new(),
        Ty::Var(v) => BTreeSet::from([v.clone()]),
        Ty::Generic(_, arg) => ftv(arg),
        Ty::Func(args, ret) => {
            let mut s = BTreeSet::new();
            for a in args {
                s.extend(ftv(a));
            }
            s.extend(ftv(ret));
            s
        }
    }
}

/// `true` once a type term contains no free type variables -- the condition
/// a specialized argument/return type must satisfy before codegen can run.
pub fn is_determined(ty: &Ty) -> bool {
    ftv(ty).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_types_have_no_free_vars() {
        assert!(ftv(&INT64).is_empty());
        assert!(ftv(&VOID).is_empty());
    }

    #[test]
    fn var_is_its_own_free_var() {
        let t = Ty::var("a");
        assert_eq!(ftv(&t), BTreeSet::from(["a".to_string()]));
    }

    #[test]
    fn generic_propagates_free_vars_from_element() {
        let t = Ty::array(Ty::var("e"));
        assert_eq!(ftv(&t), BTreeSet::from(["e".to_string()]));
        assert!(t.is_array());
    }

    #[test]
    fn func_unions_free_vars_of_args_and_return() {
        let t = Ty::func(vec![Ty::var("a"), Ty::var("b")], Ty::var("r"));
        assert_eq!(
            ftv(&t),
            BTreeSet::from(["a".to_string(), "b".to_string(), "r".to_string()])
        );
    }

    #[test]
    fn determined_requires_no_free_vars() {
        let mono = Ty::func(vec![INT64, INT64], DOUBLE64);
        assert!(is_determined(&mono));

        let poly = Ty::func(vec![Ty::var("a")], Ty::var("a"));
        assert!(!is_determined(&poly));
    }

    #[test]
    fn display_matches_source_dialect_shape() {
        assert_eq!(format!("{}", Ty::array(INT64)), "Array Int64");
        assert_eq!(
            format!("{}", Ty::func(vec![INT64, INT64], DOUBLE64)),
            "(Int64, Int64) -> Double64"
        );
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Ty::array(INT64), Ty::array(INT64));
        assert_ne!(Ty::array(INT64), Ty::array(DOUBLE64));
        assert_eq!(Ty::var("a"), Ty::var("a"));
        assert_ne!(Ty::var("a"), Ty::var("b"));
    }
}
