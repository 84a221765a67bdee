use std::collections::HashMap;

use std::collections::BTreeSet;

use numjit_core::{Const, Expr, Fun, PrimOp};
use numjit_types::{ftv, BaseTy, Ty, BOOL, DOUBLE64, INT64, VOID};

use crate::error::InferError;
use crate::fresh::FreshVarGen;
use crate::subst::{apply, compose};
use crate::unify::{bind, solve};

/// The binding environment: a mapping from a name in scope to its inferred
/// type term.
pub type Env = HashMap<String, Ty>;

/// The result of inferring a function: its principal (possibly polymorphic)
/// type, and the most-general unifier produced by solving every constraint
/// generated while walking its body.
pub struct Inferred {
    pub func_ty: Ty,
    pub mgu: crate::subst::Subst,
}

struct Inferencer {
    constraints: Vec<(Ty, Ty)>,
    env: Env,
    fresh: FreshVarGen,
    return_var: Ty,
    /// The function currently being inferred, and the fresh type variables
    /// stamped onto its parameters -- needed to recognize a self-recursive
    /// `CallFunc` and tie its argument/return types back to the enclosing
    /// function's own signature (mirroring codegen's own
    /// `callee == original_name` check, one stage earlier).
    fun_name: String,
    arg_vars: Vec<Ty>,
    /// Every fresh variable stamped onto a `LitInt`/`LitFloat` node, paired
    /// with the base type it defaults to if it is still free after solving.
    /// A bare numeric literal with nothing else to pin its type (most
    /// commonly the base case of a recursive function) behaves like an
    /// unconstrained integer literal in Rust itself: it defaults rather than
    /// staying ambiguous.
    literal_defaults: Vec<(String, Ty)>,
}

/// Infers the principal type of a lowered `Fun`, stamping a fresh type
/// variable onto every `Var`/`LitInt`/`LitFloat`/`Assign` node it visits
/// (§4.2) and solving the accumulated constraint set (§4.3).
///
/// Node type slots are left holding their *raw* inferred type (possibly a
/// free variable); the specializer resolves them against the returned MGU
/// composed with a call site's runtime classification, rather than this
/// pass rewriting the tree a second time.
pub fn infer_fun(f: &Fun) -> Result<Inferred, InferError> {
    let mut inf = Inferencer {
        constraints: Vec::new(),
        env: Env::new(),
        fresh: FreshVarGen::new(),
        return_var: Ty::var("$return_var"),
        fun_name: f.name.clone(),
        arg_vars: Vec::new(),
        literal_defaults: Vec::new(),
    };

    let mut arg_types = Vec::with_capacity(f.params.len());
    for p in &f.params {
        let ty = match p.annotation {
            Some(BaseTy::Int64) => INT64,
            Some(BaseTy::Double64) => DOUBLE64,
            Some(other) => Ty::Base(other),
            None => Ty::var(inf.fresh.next_name()),
        };
        inf.env.insert(p.id.clone(), ty.clone());
        arg_types.push(ty);
    }
    inf.arg_vars = arg_types.clone();

    for stmt in &f.body {
        inf.visit(stmt)?;
    }

    let func_ty = Ty::func(arg_types.clone(), inf.return_var.clone());
    let mut mgu = solve(std::mem::take(&mut inf.constraints))?;

    // A literal's fresh variable only defaults if call-site specialization
    // could never pin it down: if it is still reachable from a parameter's
    // (post-mgu) type, leave it free so specialization resolves it from the
    // actual argument classified at the call site (e.g. `dot`'s running sum,
    // unified with its array parameters' element type).
    let param_vars: BTreeSet<String> = arg_types
        .iter()
        .flat_map(|t| ftv(&apply(&mgu, t)))
        .collect();
    for (var, default) in &inf.literal_defaults {
        if let Ty::Var(rv) = apply(&mgu, &Ty::var(var.clone())) {
            if !param_vars.contains(&rv) {
                let binding = bind(&rv, default)?;
                mgu = compose(&binding, &mgu);
            }
        }
    }

    // The returned principal type must already be mgu-applied, not the raw
    // skeleton of fresh parameter/return variables: a caller (the
    // specializer) unifies this type directly against a call-site spec, and
    // unifying the raw skeleton never decomposes a parameter var that the
    // mgu resolved to a `Generic`/`Func` shape (e.g. an array parameter's
    // element variable), leaving it unconstrained. Mirrors the ground truth
    // (`infer_ty = apply(mgu, ty)` before `unify(infer_ty, spec_ty)`).
    let func_ty = apply(&mgu, &func_ty);

    Ok(Inferred { func_ty, mgu })
}

impl Inferencer {
    fn visit(&mut self, e: &Expr) -> Result<Ty, InferError> {
        match e {
            Expr::Var { id, ty } => {
                let t = self
                    .env
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| Ty::var(self.fresh.next_name()));
                *ty.borrow_mut() = Some(t.clone());
                Ok(t)
            }
            Expr::LitInt { ty, .. } => {
                let name = self.fresh.next_name();
                self.literal_defaults.push((name.clone(), INT64));
                let t = Ty::var(name);
                *ty.borrow_mut() = Some(t.clone());
                Ok(t)
            }
            Expr::LitFloat { ty, .. } => {
                let name = self.fresh.next_name();
                self.literal_defaults.push((name.clone(), DOUBLE64));
                let t = Ty::var(name);
                *ty.borrow_mut() = Some(t.clone());
                Ok(t)
            }
            Expr::LitBool(_) => Ok(BOOL),
            Expr::Const(c) => Ok(match c {
                Const::Int(_) => INT64,
                Const::Float(_) => DOUBLE64,
                Const::Bool(_) => BOOL,
            }),
            Expr::Assign {
                ref_name,
                value,
                ty,
            } => {
                let value_ty = self.visit(value)?;
                if let Some(existing) = self.env.get(ref_name) {
                    self.constraints.push((value_ty.clone(), existing.clone()));
                }
                self.env.insert(ref_name.clone(), value_ty.clone());
                *ty.borrow_mut() = Some(value_ty);
                Ok(VOID)
            }
            Expr::Return(value) => {
                let t = self.visit(value)?;
                self.constraints.push((t, self.return_var.clone()));
                Ok(VOID)
            }
            Expr::Loop {
                var,
                begin,
                end,
                step,
                body,
            } => {
                self.env.insert(var.clone(), INT64);
                let begin_ty = self.visit(begin)?;
                let end_ty = self.visit(end)?;
                let step_ty = self.visit(step)?;
                self.constraints.push((begin_ty, INT64));
                self.constraints.push((end_ty, INT64));
                self.constraints.push((step_ty, INT64));
                for s in body {
                    self.visit(s)?;
                }
                Ok(VOID)
            }
            Expr::If { test, body, orelse } => {
                // The test's type is discarded: this dialect has no
                // Bool-typing constraint on conditions (§9 open question ii).
                self.visit(test)?;
                for s in body {
                    self.visit(s)?;
                }
                for s in orelse {
                    self.visit(s)?;
                }
                Ok(VOID)
            }
            Expr::Compare {
                left,
                comparators,
                ..
            } => {
                let t = self.visit(left)?;
                for c in comparators {
                    self.visit(c)?;
                }
                Ok(t)
            }
            Expr::Prim { op, args } => self.visit_prim(*op, args),
            Expr::Index { value, ix } => {
                let elem = Ty::var(self.fresh.next_name());
                let value_ty = self.visit(value)?;
                let ix_ty = self.visit(ix)?;
                self.constraints.push((value_ty, Ty::array(elem.clone())));
                self.constraints.push((ix_ty, INT64));
                Ok(elem)
            }
            Expr::CallFunc { callee, args } => {
                let arg_tys = args
                    .iter()
                    .map(|a| self.visit(a))
                    .collect::<Result<Vec<_>, _>>()?;
                if *callee == self.fun_name {
                    // A recursive self-call shares the enclosing function's
                    // own signature: each argument's type is constrained to
                    // the matching parameter, and the call's own type is the
                    // function's return variable, exactly as codegen treats
                    // it as a direct call on the function under construction
                    // rather than a host lookup.
                    for (arg_ty, param_ty) in arg_tys.iter().zip(&self.arg_vars) {
                        self.constraints.push((arg_ty.clone(), param_ty.clone()));
                    }
                    Ok(self.return_var.clone())
                } else {
                    // Any other callee resolves through the host-function
                    // table at codegen time; its signature isn't known here.
                    Ok(Ty::var(self.fresh.next_name()))
                }
            }
            Expr::Noop | Expr::Break => Ok(VOID),
        }
    }

    fn visit_prim(&mut self, op: PrimOp, args: &[Expr]) -> Result<Ty, InferError> {
        if matches!(op, PrimOp::Shape) {
            let inner = self.visit(&args[0])?;
            let _ = inner;
            return Ok(Ty::array(INT64));
        }
        let a = self.visit(&args[0])?;
        let b = self.visit(&args[1])?;
        self.constraints.push((a, b.clone()));
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subst::apply;
    use numjit_core::Param;

    fn add_fun() -> Fun {
        Fun {
            name: "add".to_string(),
            params: vec![Param::new("a"), Param::new("b")],
            body: vec![Expr::Return(Box::new(Expr::Prim {
                op: PrimOp::Add,
                args: vec![Expr::var("a"), Expr::var("b")],
            }))],
        }
    }

    #[test]
    fn add_infers_to_a_single_polymorphic_argument_type() {
        let inferred = infer_fun(&add_fun()).unwrap();
        match &inferred.func_ty {
            Ty::Func(args, ret) => {
                let a = apply(&inferred.mgu, &args[0]);
                let b = apply(&inferred.mgu, &args[1]);
                let r = apply(&inferred.mgu, ret);
                assert_eq!(a, b);
                assert_eq!(b, r);
            }
            other => panic!("expected Func, got {other:?}"),
        }
    }

    #[test]
    fn annotated_param_pins_its_argument_type() {
        let f = Fun {
            name: "id".to_string(),
            params: vec![Param::with_annotation("n", BaseTy::Int64)],
            body: vec![Expr::Return(Box::new(Expr::var("n")))],
        };
        let inferred = infer_fun(&f).unwrap();
        match &inferred.func_ty {
            Ty::Func(args, _) => assert_eq!(args[0], INT64),
            other => panic!("expected Func, got {other:?}"),
        }
    }

    #[test]
    fn loop_pins_counter_and_bounds_to_int64() {
        let f = Fun {
            name: "countdown".to_string(),
            params: vec![Param::new("n")],
            body: vec![Expr::Loop {
                var: "i".to_string(),
                begin: Box::new(Expr::const_int(0)),
                end: Box::new(Expr::var("n")),
                step: Box::new(Expr::const_int(1)),
                body: vec![],
            }],
        };
        let inferred = infer_fun(&f).unwrap();
        match &inferred.func_ty {
            Ty::Func(args, _) => {
                assert_eq!(apply(&inferred.mgu, &args[0]), INT64);
            }
            other => panic!("expected Func, got {other:?}"),
        }
    }

    #[test]
    fn index_constrains_value_to_an_array_of_the_element_type() {
        let f = Fun {
            name: "first".to_string(),
            params: vec![Param::new("a")],
            body: vec![Expr::Return(Box::new(Expr::Index {
                value: Box::new(Expr::var("a")),
                ix: Box::new(Expr::const_int(0)),
            }))],
        };
        let inferred = infer_fun(&f).unwrap();
        match &inferred.func_ty {
            Ty::Func(args, ret) => {
                let a = apply(&inferred.mgu, &args[0]);
                assert!(a.is_array());
                assert_eq!(a, Ty::array(apply(&inferred.mgu, ret)));
            }
            other => panic!("expected Func, got {other:?}"),
        }
    }

    #[test]
    fn shape_returns_array_of_int64_regardless_of_element_type() {
        let f = Fun {
            name: "dims".to_string(),
            params: vec![Param::new("a")],
            body: vec![Expr::Return(Box::new(Expr::Prim {
                op: PrimOp::Shape,
                args: vec![Expr::var("a")],
            }))],
        };
        let inferred = infer_fun(&f).unwrap();
        match &inferred.func_ty {
            Ty::Func(_, ret) => {
                assert_eq!(apply(&inferred.mgu, ret), Ty::array(INT64));
            }
            other => panic!("expected Func, got {other:?}"),
        }
    }

    #[test]
    fn self_recursive_call_ties_its_type_to_the_enclosing_signature() {
        // def fib(x): if x < 3: return 1; return fib(x-1) + fib(x-2)
        let f = Fun {
            name: "fib".to_string(),
            params: vec![Param::new("x")],
            body: vec![
                Expr::If {
                    test: Box::new(Expr::Compare {
                        left: Box::new(Expr::var("x")),
                        ops: vec![CmpOp::Lt],
                        comparators: vec![Expr::lit_int(3)],
                    }),
                    body: vec![Expr::Return(Box::new(Expr::lit_int(1)))],
                    orelse: vec![],
                },
                Expr::Return(Box::new(Expr::Prim {
                    op: PrimOp::Add,
                    args: vec![
                        Expr::CallFunc {
                            callee: "fib".to_string(),
                            args: vec![Expr::Prim {
                                op: PrimOp::Sub,
                                args: vec![Expr::var("x"), Expr::lit_int(1)],
                            }],
                        },
                        Expr::CallFunc {
                            callee: "fib".to_string(),
                            args: vec![Expr::Prim {
                                op: PrimOp::Sub,
                                args: vec![Expr::var("x"), Expr::lit_int(2)],
                            }],
                        },
                    ],
                })),
            ],
        };
        let inferred = infer_fun(&f).unwrap();
        match &inferred.func_ty {
            Ty::Func(args, ret) => {
                assert_eq!(apply(&inferred.mgu, &args[0]), INT64);
                assert_eq!(apply(&inferred.mgu, ret), INT64);
            }
            other => panic!("expected Func, got {other:?}"),
        }
    }

    #[test]
    fn running_sum_literal_stays_polymorphic_with_its_array_element_type() {
        // def sum_of(a): c = 0; for i in range(a.shape[0]): c += a[i]; return c
        let f = Fun {
            name: "sum_of".to_string(),
            params: vec![Param::new("a")],
            body: vec![
                Expr::assign("c", Expr::lit_int(0)),
                Expr::Loop {
                    var: "i".to_string(),
                    begin: Box::new(Expr::const_int(0)),
                    end: Box::new(Expr::Prim {
                        op: PrimOp::Shape,
                        args: vec![Expr::var("a")],
                    }),
                    step: Box::new(Expr::const_int(1)),
                    body: vec![Expr::assign(
                        "c",
                        Expr::Prim {
                            op: PrimOp::Add,
                            args: vec![
                                Expr::var("c"),
                                Expr::Index {
                                    value: Box::new(Expr::var("a")),
                                    ix: Box::new(Expr::var("i")),
                                },
                            ],
                        },
                    )],
                },
                Expr::Return(Box::new(Expr::var("c"))),
            ],
        };
        let inferred = infer_fun(&f).unwrap();
        match &inferred.func_ty {
            Ty::Func(args, ret) => {
                let a = apply(&inferred.mgu, &args[0]);
                assert!(a.is_array());
                // The running sum's initial literal must stay tied to the
                // array's element type rather than defaulting to Int64 --
                // a caller specializing with a Double64 array must still
                // be able to pin it down later.
                assert_eq!(a, Ty::array(apply(&inferred.mgu, ret)));
            }
            other => panic!("expected Func, got {other:?}"),
        }
    }

    #[test]
    fn unconstrained_integer_literal_defaults_to_int64() {
        let f = Fun {
            name: "one".to_string(),
            params: vec![],
            body: vec![Expr::Return(Box::new(Expr::lit_int(1)))],
        };
        let inferred = infer_fun(&f).unwrap();
        match &inferred.func_ty {
            Ty::Func(_, ret) => assert_eq!(apply(&inferred.mgu, ret), INT64),
            other => panic!("expected Func, got {other:?}"),
        }
    }
}
