//! End-to-end scenarios driving the full pipeline: surface tree -> lowering
//! -> inference -> registration -> call-site specialization -> JIT codegen
//! -> native call (§8).

use numjit::{
    lower_fun, ArrayDtype, AugOp, BinOp, CompareOp, Fun, JitContext, NativeResult, NumjitError,
    RangeCall, RuntimeValue, SurfaceExpr, SurfaceFun, SurfaceParam, SurfaceStmt,
};

fn name(id: &str) -> SurfaceExpr {
    SurfaceExpr::Name(id.to_string())
}

fn int(n: i64) -> SurfaceExpr {
    SurfaceExpr::Int(n)
}

fn register(ctx: &mut JitContext, f: &SurfaceFun) {
    let fun: Fun = lower_fun(f).unwrap();
    ctx.register(fun).unwrap();
}

fn add_fun() -> SurfaceFun {
    SurfaceFun {
        name: "add".to_string(),
        params: vec![SurfaceParam::new("a"), SurfaceParam::new("b")],
        body: vec![SurfaceStmt::Return(Some(SurfaceExpr::BinOp {
            op: BinOp::Add,
            left: Box::new(name("a")),
            right: Box::new(name("b")),
        }))],
    }
}

#[test]
fn add_specializes_separately_per_argument_type() {
    let mut ctx = JitContext::new().unwrap();
    register(&mut ctx, &add_fun());

    let int_sum = ctx
        .compile_for_args("add", &[RuntimeValue::Int(1), RuntimeValue::Int(2)])
        .unwrap();
    assert_eq!(int_sum, NativeResult::Int(3));

    let float_sum = ctx
        .compile_for_args("add", &[RuntimeValue::Float(1.0), RuntimeValue::Float(2.5)])
        .unwrap();
    assert_eq!(float_sum, NativeResult::Float(3.5));

    assert_eq!(ctx.cache_len(), 2);
}

fn is_prime_fun() -> SurfaceFun {
    SurfaceFun {
        name: "is_prime".to_string(),
        params: vec![SurfaceParam::new("x")],
        body: vec![
            SurfaceStmt::For {
                target: "i".to_string(),
                iterable: RangeCall {
                    callee: "range".to_string(),
                    args: vec![int(2), name("x")],
                },
                body: vec![SurfaceStmt::If {
                    test: SurfaceExpr::Compare {
                        left: Box::new(SurfaceExpr::BinOp {
                            op: BinOp::Mod,
                            left: Box::new(name("x")),
                            right: Box::new(name("i")),
                        }),
                        op: CompareOp::Eq,
                        right: Box::new(int(0)),
                    },
                    body: vec![SurfaceStmt::Return(Some(int(0)))],
                    orelse: vec![],
                }],
            },
            SurfaceStmt::Return(Some(int(1))),
        ],
    }
}

#[test]
fn is_prime_rejects_composites_and_accepts_primes() {
    let mut ctx = JitContext::new().unwrap();
    register(&mut ctx, &is_prime_fun());

    let prime = ctx
        .compile_for_args("is_prime", &[RuntimeValue::Int(3571)])
        .unwrap();
    assert_eq!(prime, NativeResult::Int(1));

    let composite = ctx
        .compile_for_args("is_prime", &[RuntimeValue::Int(3570)])
        .unwrap();
    assert_eq!(composite, NativeResult::Int(0));
}

fn fib_fun() -> SurfaceFun {
    SurfaceFun {
        name: "fib".to_string(),
        params: vec![SurfaceParam::new("x")],
        body: vec![
            SurfaceStmt::If {
                test: SurfaceExpr::Compare {
                    left: Box::new(name("x")),
                    op: CompareOp::Lt,
                    right: Box::new(int(3)),
                },
                body: vec![SurfaceStmt::Return(Some(int(1)))],
                orelse: vec![],
            },
            SurfaceStmt::Return(Some(SurfaceExpr::BinOp {
                op: BinOp::Add,
                left: Box::new(SurfaceExpr::Call {
                    callee: "fib".to_string(),
                    args: vec![SurfaceExpr::BinOp {
                        op: BinOp::Sub,
                        left: Box::new(name("x")),
                        right: Box::new(int(1)),
                    }],
                }),
                right: Box::new(SurfaceExpr::Call {
                    callee: "fib".to_string(),
                    args: vec![SurfaceExpr::BinOp {
                        op: BinOp::Sub,
                        left: Box::new(name("x")),
                        right: Box::new(int(2)),
                    }],
                }),
            })),
        ],
    }
}

#[test]
fn fib_compiles_with_a_recursive_self_call() {
    let mut ctx = JitContext::new().unwrap();
    register(&mut ctx, &fib_fun());

    let result = ctx
        .compile_for_args("fib", &[RuntimeValue::Int(10)])
        .unwrap();
    assert_eq!(result, NativeResult::Int(55));
}

fn dot_fun() -> SurfaceFun {
    SurfaceFun {
        name: "dot".to_string(),
        params: vec![SurfaceParam::new("a"), SurfaceParam::new("b")],
        body: vec![
            SurfaceStmt::Assign {
                target: "c".to_string(),
                value: int(0),
            },
            SurfaceStmt::Assign {
                target: "n".to_string(),
                value: SurfaceExpr::Subscript {
                    value: Box::new(SurfaceExpr::ShapeAttr(Box::new(name("a")))),
                    index: Box::new(int(0)),
                },
            },
            SurfaceStmt::For {
                target: "i".to_string(),
                iterable: RangeCall {
                    callee: "range".to_string(),
                    args: vec![name("n")],
                },
                body: vec![SurfaceStmt::AugAssign {
                    target: "c".to_string(),
                    op: AugOp::Add,
                    value: SurfaceExpr::BinOp {
                        op: BinOp::Mult,
                        left: Box::new(SurfaceExpr::Subscript {
                            value: Box::new(name("a")),
                            index: Box::new(name("i")),
                        }),
                        right: Box::new(SurfaceExpr::Subscript {
                            value: Box::new(name("b")),
                            index: Box::new(name("i")),
                        }),
                    },
                }],
            },
            SurfaceStmt::Return(Some(name("c"))),
        ],
    }
}

#[test]
fn dot_product_of_two_int64_arrays() {
    let mut ctx = JitContext::new().unwrap();
    register(&mut ctx, &dot_fun());

    let mut a = [1i64, 2, 3];
    let mut b = [4i64, 5, 6];
    let args = [
        RuntimeValue::Array {
            dtype: ArrayDtype::Int64,
            data: a.as_mut_ptr().cast(),
            shape: vec![3],
        },
        RuntimeValue::Array {
            dtype: ArrayDtype::Int64,
            data: b.as_mut_ptr().cast(),
            shape: vec![3],
        },
    ];

    let result = ctx.compile_for_args("dot", &args).unwrap();
    assert_eq!(result, NativeResult::Int(1 * 4 + 2 * 5 + 3 * 6));
}

fn count_to_fun() -> SurfaceFun {
    SurfaceFun {
        name: "count_to".to_string(),
        params: vec![SurfaceParam::new("n")],
        body: vec![
            SurfaceStmt::For {
                target: "_".to_string(),
                iterable: RangeCall {
                    callee: "range".to_string(),
                    args: vec![name("n")],
                },
                body: vec![SurfaceStmt::AugAssign {
                    target: "n".to_string(),
                    op: AugOp::Add,
                    value: int(1),
                }],
            },
            SurfaceStmt::Return(Some(name("n"))),
        ],
    }
}

#[test]
fn loop_bound_is_captured_once_before_the_counter_mutates() {
    let mut ctx = JitContext::new().unwrap();
    register(&mut ctx, &count_to_fun());

    let result = ctx
        .compile_for_args("count_to", &[RuntimeValue::Int(10)])
        .unwrap();
    assert_eq!(result, NativeResult::Int(20));
}

#[test]
fn a_return_type_unconstrained_by_any_parameter_is_rejected() {
    use numjit_core::Expr;

    // A function whose only return value is a reference to a name no
    // parameter or assignment ever binds: nothing at the call site can pin
    // its type down.
    let fun = Fun {
        name: "ghost".to_string(),
        params: vec![],
        body: vec![Expr::Return(Box::new(Expr::var("phantom")))],
    };

    let mut ctx = JitContext::new().unwrap();
    ctx.register(fun).unwrap();

    let result = ctx.compile_for_args("ghost", &[]);
    assert!(matches!(result, Err(NumjitError::UnderDetermined)));
}
