use numjit_core::{CmpOp, Const, Expr, Fun, Param, PrimOp};
use numjit_types::BaseTy;

use crate::error::LowerError;
use crate::surface::{
    Annotation, AugOp, BinOp, CompareOp, RangeCall, SurfaceExpr, SurfaceFun, SurfaceParam,
    SurfaceStmt,
};

/// Lowers a narrow surface function into the Core IR `Fun` node that every
/// downstream stage (inference, codegen) consumes.
pub fn lower_fun(f: &SurfaceFun) -> Result<Fun, LowerError> {
    let params = f.params.iter().map(lower_param).collect();
    let body = lower_block(&f.body)?;
    Ok(Fun {
        name: f.name.clone(),
        params,
        body,
    })
}

fn lower_param(p: &SurfaceParam) -> Param {
    Param {
        id: p.id.clone(),
        annotation: p.annotation.map(lower_annotation),
    }
}

fn lower_annotation(a: Annotation) -> BaseTy {
    match a {
        Annotation::Int | Annotation::Int64 | Annotation::Bool => BaseTy::Int64,
        Annotation::Float => BaseTy::Double64,
    }
}

fn lower_block(stmts: &[SurfaceStmt]) -> Result<Vec<Expr>, LowerError> {
    stmts.iter().map(lower_stmt).collect()
}

fn lower_stmt(stmt: &SurfaceStmt) -> Result<Expr, LowerError> {
    match stmt {
        SurfaceStmt::Expr(_) => {
            // visit_Expr in the source dialect silently drops expression
            // statements; preserved here rather than refined (§9 open
            // question ii resolved in DESIGN.md).
            Ok(Expr::Noop)
        }
        SurfaceStmt::Assign { target, value } => {
            Ok(Expr::assign(target.clone(), lower_expr(value)?))
        }
        SurfaceStmt::AugAssign { target, op, value } => {
            let prim_op = match op {
                AugOp::Add => PrimOp::Add,
                AugOp::Mult => PrimOp::Mult,
            };
            Ok(Expr::assign(
                target.clone(),
                Expr::Prim {
                    op: prim_op,
                    args: vec![Expr::var(target.clone()), lower_expr(value)?],
                },
            ))
        }
        SurfaceStmt::Return(value) => match value {
            Some(e) => Ok(Expr::Return(Box::new(lower_expr(e)?))),
            None => Ok(Expr::Noop),
        },
        SurfaceStmt::For {
            target,
            iterable,
            body,
        } => {
            let (begin, end, step) = lower_range_call(iterable)?;
            Ok(Expr::Loop {
                var: target.clone(),
                begin: Box::new(begin),
                end: Box::new(end),
                step: Box::new(step),
                body: lower_block(body)?,
            })
        }
        SurfaceStmt::If { test, body, orelse } => Ok(Expr::If {
            test: Box::new(lower_expr(test)?),
            body: lower_block(body)?,
            orelse: lower_block(orelse)?,
        }),
        SurfaceStmt::Pass => Ok(Expr::Noop),
        SurfaceStmt::Break => Ok(Expr::Break),
    }
}

/// Lowers a `range`/`xrange` call's arguments into `(begin, end, step)`
/// expressions under the arity rules of §4.1.
fn lower_range_call(call: &RangeCall) -> Result<(Expr, Expr, Expr), LowerError> {
    if call.callee != "range" && call.callee != "xrange" {
        return Err(LowerError::unsupported(format!(
            "loop over non-range iterable `{}`",
            call.callee
        )));
    }
    let args = call
        .args
        .iter()
        .map(lower_expr)
        .collect::<Result<Vec<_>, _>>()?;
    match args.len() {
        1 => {
            let mut it = args.into_iter();
            let end = it.next().unwrap();
            Ok((Expr::const_int(0), end, Expr::const_int(1)))
        }
        2 => {
            let mut it = args.into_iter();
            let begin = it.next().unwrap();
            let end = it.next().unwrap();
            Ok((begin, end, Expr::const_int(1)))
        }
        3 => {
            let mut it = args.into_iter();
            let begin = it.next().unwrap();
            let end = it.next().unwrap();
            let step = it.next().unwrap();
            Ok((begin, end, step))
        }
        n => Err(LowerError::unsupported(format!(
            "{}() called with {n} arguments",
            call.callee
        ))),
    }
}

fn lower_expr(e: &SurfaceExpr) -> Result<Expr, LowerError> {
    match e {
        SurfaceExpr::Name(id) => Ok(Expr::var(id.clone())),
        SurfaceExpr::Int(n) => Ok(Expr::lit_int(*n)),
        SurfaceExpr::Float(n) => Ok(Expr::lit_float(*n)),
        SurfaceExpr::Bool(b) => Ok(Expr::LitBool(*b)),
        SurfaceExpr::BinOp { op, left, right } => {
            let args = vec![lower_expr(left)?, lower_expr(right)?];
            Ok(Expr::Prim {
                op: lower_binop(*op),
                args,
            })
        }
        SurfaceExpr::Compare { left, op, right } => Ok(Expr::Compare {
            left: Box::new(lower_expr(left)?),
            ops: vec![lower_cmpop(*op)],
            comparators: vec![lower_expr(right)?],
        }),
        SurfaceExpr::ShapeAttr(value) => Ok(Expr::Prim {
            op: PrimOp::Shape,
            args: vec![lower_expr(value)?],
        }),
        SurfaceExpr::Subscript { value, index } => Ok(Expr::Index {
            value: Box::new(lower_expr(value)?),
            ix: Box::new(lower_expr(index)?),
        }),
        SurfaceExpr::Call { callee, args } => Ok(Expr::CallFunc {
            callee: callee.clone(),
            args: args.iter().map(lower_expr).collect::<Result<_, _>>()?,
        }),
    }
}

fn lower_binop(op: BinOp) -> PrimOp {
    match op {
        BinOp::Add => PrimOp::Add,
        BinOp::Sub => PrimOp::Sub,
        BinOp::Mult => PrimOp::Mult,
        BinOp::Div => PrimOp::Div,
        BinOp::Pow => PrimOp::Pow,
        BinOp::Mod => PrimOp::Mod,
        BinOp::BoolAnd => PrimOp::And,
        BinOp::BoolOr => PrimOp::Or,
    }
}

fn lower_cmpop(op: CompareOp) -> CmpOp {
    match op {
        CompareOp::Eq => CmpOp::Eq,
        CompareOp::NotEq => CmpOp::Ne,
        CompareOp::Lt => CmpOp::Lt,
        CompareOp::LtE => CmpOp::Le,
        CompareOp::Gt => CmpOp::Gt,
        CompareOp::GtE => CmpOp::Ge,
    }
}
