use std::collections::BTreeMap;

use numjit_types::Ty;

/// A substitution: a mapping from type-variable name to type term.
///
/// Kept as a `BTreeMap` rather than a `HashMap` so that two substitutions
/// built from the same constraints compare and iterate deterministically --
/// useful for the mangled cache key, and for reproducing test failures.
pub type Subst = BTreeMap<String, Ty>;

/// Applies a substitution to a type term, recursively.
pub fn apply(s: &Subst, t: &Ty) -> Ty {
    match t {
        Ty::Base(_) => t.clone(),
        Ty::Var(v) => s.get(v).cloned().unwrap_or_else(|| t.clone()),
        Ty::Generic(head, arg) => Ty::Generic(*head, Box::new(apply(s, arg))),
        Ty::Func(args, ret) => Ty::Func(
            args.iter().map(|a| apply(s, a)).collect(),
            Box::new(apply(s, ret)),
        ),
    }
}

/// Applies a substitution across both sides of every pending constraint.
pub fn apply_constraints(s: &Subst, cs: &[(Ty, Ty)]) -> Vec<(Ty, Ty)> {
    cs.iter().map(|(a, b)| (apply(s, a), apply(s, b))).collect()
}

/// `compose(s1, s2)`: apply `s1` across all images of `s2`, then union,
/// with `s1`'s entries overriding `s2`'s on key conflict.
pub fn compose(s1: &Subst, s2: &Subst) -> Subst {
    let mut s3: Subst = s2.iter().map(|(k, v)| (k.clone(), apply(s1, v))).collect();
    for (k, v) in s1 {
        s3.insert(k.clone(), v.clone());
    }
    s3
}

#[cfg(test)]
mod tests {
    use super::*;
    use numjit_types::{BaseTy, DOUBLE64, INT64};

    #[test]
    fn apply_substitutes_bound_vars_and_leaves_others() {
        let mut s = Subst::new();
        s.insert("a".to_string(), INT64);
        assert_eq!(apply(&s, &Ty::var("a")), INT64);
        assert_eq!(apply(&s, &Ty::var("b")), Ty::var("b"));
        assert_eq!(apply(&s, &INT64), INT64);
    }

    #[test]
    fn apply_recurses_into_generic_and_func() {
        let mut s = Subst::new();
        s.insert("e".to_string(), DOUBLE64);
        assert_eq!(apply(&s, &Ty::array(Ty::var("e"))), Ty::array(DOUBLE64));

        let f = Ty::func(vec![Ty::var("e"), INT64], Ty::var("e"));
        assert_eq!(apply(&s, &f), Ty::func(vec![DOUBLE64, INT64], DOUBLE64));
    }

    #[test]
    fn compose_overrides_s2_with_s1_on_conflict() {
        let mut s1 = Subst::new();
        s1.insert("a".to_string(), INT64);
        let mut s2 = Subst::new();
        s2.insert("a".to_string(), DOUBLE64);
        s2.insert("b".to_string(), Ty::var("a"));

        let s3 = compose(&s1, &s2);
        assert_eq!(s3.get("a"), Some(&INT64));
        // s2's binding for "b" (Var("a")) is rewritten through s1.
        assert_eq!(s3.get("b"), Some(&INT64));
    }

    #[test]
    fn compose_is_associative_in_application() {
        let mut s1 = Subst::new();
        s1.insert("x".to_string(), INT64);
        let mut s2 = Subst::new();
        s2.insert("y".to_string(), Ty::var("x"));

        let composed = compose(&s1, &s2);
        let direct = apply(&s1, &apply(&s2, &Ty::var("y")));
        assert_eq!(apply(&composed, &Ty::var("y")), direct);
    }

    #[test]
    fn generic_head_is_copy() {
        // BaseTy must stay Copy for Generic's head to clone cheaply.
        let _: BaseTy = BaseTy::Array;
    }
}
