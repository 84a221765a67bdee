use std::collections::VecDeque;

use numjit_types::{ftv, Ty};

use crate::error::InferError;
use crate::subst::{apply, apply_constraints, compose, Subst};

/// Binds a type variable to a type term, failing the occurs-check if the
/// variable appears free within the term itself.
pub fn bind(v: &str, t: &Ty) -> Result<Subst, InferError> {
    if *t == Ty::Var(v.to_string()) {
        return Ok(Subst::new());
    }
    if ftv(t).contains(v) {
        return Err(InferError::InfiniteType(v.to_string(), t.clone()));
    }
    let mut s = Subst::new();
    s.insert(v.to_string(), t.clone());
    Ok(s)
}

/// Unifies two type terms, returning the substitution that makes them
/// equal, or a `TypeMismatch`/`InfiniteType` failure.
pub fn unify(x: &Ty, y: &Ty) -> Result<Subst, InferError> {
    match (x, y) {
        (Ty::Generic(hx, ax), Ty::Generic(hy, ay)) if hx == hy => {
            let s1 = unify(ax, ay)?;
            let s2 = unify(&apply(&s1, ax), &apply(&s1, ay))?;
            Ok(compose(&s2, &s1))
        }
        (Ty::Base(a), Ty::Base(b)) if a == b => Ok(Subst::new()),
        (Ty::Func(xargs, xret), Ty::Func(yargs, yret)) => {
            if xargs.len() != yargs.len() {
                return Err(InferError::TypeMismatch(x.clone(), y.clone()));
            }
            let pairs: Vec<(Ty, Ty)> = xargs.iter().cloned().zip(yargs.iter().cloned()).collect();
            let s1 = solve(pairs)?;
            let s2 = unify(&apply(&s1, xret), &apply(&s1, yret))?;
            Ok(compose(&s2, &s1))
        }
        (Ty::Var(v), other) => bind(v, other),
        (other, Ty::Var(v)) => bind(v, other),
        _ => Err(InferError::TypeMismatch(x.clone(), y.clone())),
    }
}

/// Solves an ordered collection of equality constraints, returning the
/// most-general unifier. Pops from the back (matching the source dialect's
/// `deque.pop()`), composing each step's substitution into the running MGU
/// and re-applying it to the remaining constraints.
pub fn solve(constraints: Vec<(Ty, Ty)>) -> Result<Subst, InferError> {
    let mut mgu = Subst::new();
    let mut cs: VecDeque<(Ty, Ty)> = constraints.into();
    while let Some((a, b)) = cs.pop_back() {
        let s = unify(&a, &b)?;
        mgu = compose(&s, &mgu);
        cs = apply_constraints(&s, &Vec::from(cs)).into();
    }
    Ok(mgu)
}
