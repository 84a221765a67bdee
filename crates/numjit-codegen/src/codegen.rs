//! LLVM IR emission for a single specialized function (§4.5).
//!
//! Type-directed instruction selection mirrors the source dialect exactly:
//! rather than threading a type annotation through `Prim`/`Index`/`Compare`
//! (which the Core IR does not carry -- only `Var`/`LitInt`/`LitFloat`/
//! `Assign` have a type slot, per §3), codegen inspects the *emitted LLVM
//! value*'s own type (`IntValue` vs `FloatValue`) to pick the instruction,
//! the same way the dialect's own backend checks `a.type == ir_double_t`.

use std::collections::HashMap;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum};
use inkwell::values::{
    BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue, IntValue, PointerValue,
};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};

use numjit_core::{CmpOp, Const, Expr, Fun, PrimOp};
use numjit_infer::{apply, Subst};
use numjit_types::Ty;

use crate::error::CodegenError;
use crate::host::HostRegistry;
use crate::mangle::mangle;
use crate::types::{array_abi_struct, is_array_ty, ty_to_llvm};

/// Per-array-parameter metadata cached at the function prelude: the data
/// pointer, dimension count, and shape pointer extracted from the incoming
/// array-ABI struct (§4.5).
struct ArrayMeta<'ctx> {
    data: PointerValue<'ctx>,
    dims: IntValue<'ctx>,
    shape: PointerValue<'ctx>,
    elem_ty: BasicTypeEnum<'ctx>,
}

struct FunctionCodegen<'ctx, 'a> {
    context: &'ctx Context,
    builder: Builder<'ctx>,
    function: FunctionValue<'ctx>,
    /// Opaque pointers carry no pointee type of their own (LLVM 21), so each
    /// local's alloca'd type travels alongside its pointer.
    locals: HashMap<String, (PointerValue<'ctx>, BasicTypeEnum<'ctx>)>,
    arrays: HashMap<String, ArrayMeta<'ctx>>,
    exit_block: BasicBlock<'ctx>,
    retval_slot: Option<PointerValue<'ctx>>,
    break_stack: Vec<BasicBlock<'ctx>>,
    original_name: &'a str,
    specializer: &'a Subst,
    host_registry: &'a HostRegistry,
}

/// Emits a specialized function into `module`, returning the LLVM
/// `FunctionValue` ready for the execution engine.
///
/// `arg_types`/`ret_type` must be ground (no free type variables) -- they
/// are the specializer's output, not the inferencer's raw principal type.
pub fn compile_fun<'ctx>(
    context: &'ctx Context,
    module: &Module<'ctx>,
    fun: &Fun,
    arg_types: &[Ty],
    ret_type: &Ty,
    specializer: &Subst,
    host_registry: &HostRegistry,
) -> Result<FunctionValue<'ctx>, CodegenError> {
    let mangled = mangle(&fun.name, arg_types);

    let llvm_arg_types: Vec<BasicMetadataTypeEnum<'ctx>> = arg_types
        .iter()
        .map(|t| ty_to_llvm(context, t).map(Into::into))
        .collect::<Result<_, _>>()?;

    let is_void = matches!(ret_type, Ty::Base(numjit_types::BaseTy::Void));
    let fn_type = if is_void {
        context.void_type().fn_type(&llvm_arg_types, false)
    } else {
        let llvm_ret = ty_to_llvm(context, ret_type)?;
        llvm_ret.fn_type(&llvm_arg_types, false)
    };

    let function = module.add_function(&mangled, fn_type, None);
    let entry = context.append_basic_block(function, "entry");
    let exit_block = context.append_basic_block(function, "exit");

    let builder = context.create_builder();
    builder.position_at_end(entry);

    let mut cg = FunctionCodegen {
        context,
        builder,
        function,
        locals: HashMap::new(),
        arrays: HashMap::new(),
        exit_block,
        retval_slot: None,
        break_stack: Vec::new(),
        original_name: &fun.name,
        specializer,
        host_registry,
    };

    cg.emit_prelude(fun, arg_types)?;

    if !is_void {
        let llvm_ret = ty_to_llvm(context, ret_type)?;
        let slot = cg
            .builder
            .build_alloca(llvm_ret, "retval")
            .map_err(llvm_err)?;
        cg.retval_slot = Some(slot);
    }

    for stmt in &fun.body {
        cg.emit_stmt(stmt)?;
    }

    // A function that falls off the end of its body without an explicit
    // `Return` still needs to reach the exit block.
    if cg.builder.get_insert_block().unwrap().get_terminator().is_none() {
        cg.builder
            .build_unconditional_branch(cg.exit_block)
            .map_err(llvm_err)?;
    }

    cg.builder.position_at_end(cg.exit_block);
    match cg.retval_slot {
        Some(slot) => {
            let llvm_ret = ty_to_llvm(context, ret_type)?;
            let v = cg.builder.build_load(llvm_ret, slot, "ret").map_err(llvm_err)?;
            cg.builder.build_return(Some(&v)).map_err(llvm_err)?;
        }
        None => {
            cg.builder.build_return(None).map_err(llvm_err)?;
        }
    }

    Ok(function)
}

fn llvm_err(e: impl std::fmt::Display) -> CodegenError {
    CodegenError::LlvmError(e.to_string())
}

impl<'ctx, 'a> FunctionCodegen<'ctx, 'a> {
    /// Resolves a node's raw inferred type (possibly a free variable)
    /// through the specialization substitution into a ground type.
    fn resolve(&self, raw: &Ty) -> Ty {
        apply(self.specializer, raw)
    }

    fn emit_prelude(&mut self, fun: &Fun, arg_types: &[Ty]) -> Result<(), CodegenError> {
        for (i, (param, ty)) in fun.params.iter().zip(arg_types.iter()).enumerate() {
            let llvm_arg = self.function.get_nth_param(i as u32).unwrap();
            llvm_arg.set_name(&param.id);

            if is_array_ty(ty) {
                let elem = match ty {
                    Ty::Generic(_, e) => ty_to_llvm(self.context, e)?,
                    _ => unreachable!(),
                };
                let struct_ty = array_abi_struct(self.context, elem);
                let ptr = llvm_arg.into_pointer_value();

                let data_ptr = self
                    .builder
                    .build_struct_gep(struct_ty, ptr, 0, &format!("{}_data", param.id))
                    .map_err(llvm_err)?;
                let data = self
                    .builder
                    .build_load(
                        self.context.ptr_type(AddressSpace::default()),
                        data_ptr,
                        &format!("{}_data_v", param.id),
                    )
                    .map_err(llvm_err)?
                    .into_pointer_value();

                let dims_ptr = self
                    .builder
                    .build_struct_gep(struct_ty, ptr, 1, &format!("{}_dims", param.id))
                    .map_err(llvm_err)?;
                let dims = self
                    .builder
                    .build_load(self.context.i32_type(), dims_ptr, &format!("{}_dims_v", param.id))
                    .map_err(llvm_err)?
                    .into_int_value();

                let shape_ptr_ptr = self
                    .builder
                    .build_struct_gep(struct_ty, ptr, 2, &format!("{}_shape", param.id))
                    .map_err(llvm_err)?;
                let shape = self
                    .builder
                    .build_load(
                        self.context.ptr_type(AddressSpace::default()),
                        shape_ptr_ptr,
                        &format!("{}_shape_v", param.id),
                    )
                    .map_err(llvm_err)?
                    .into_pointer_value();

                self.arrays.insert(
                    param.id.clone(),
                    ArrayMeta {
                        data,
                        dims,
                        shape,
                        elem_ty: elem,
                    },
                );
                self.locals
                    .insert(param.id.clone(), (ptr, struct_ty.as_basic_type_enum()));
            } else {
                let llvm_ty = ty_to_llvm(self.context, ty)?;
                let slot = self
                    .builder
                    .build_alloca(llvm_ty, &param.id)
                    .map_err(llvm_err)?;
                self.builder.build_store(slot, llvm_arg).map_err(llvm_err)?;
                self.locals.insert(param.id.clone(), (slot, llvm_ty));
            }
        }
        Ok(())
    }

    fn current_block_open(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|b| b.get_terminator())
            .is_none()
    }

    fn emit_stmt(&mut self, e: &Expr) -> Result<(), CodegenError> {
        match e {
            Expr::Assign {
                ref_name,
                value,
                ty,
            } => {
                let v = self.emit_expr(value)?;
                if let Some((slot, _)) = self.locals.get(ref_name) {
                    self.builder.build_store(*slot, v).map_err(llvm_err)?;
                } else {
                    let raw = ty.borrow().clone().unwrap_or_else(|| Ty::var("$unknown"));
                    let resolved = self.resolve(&raw);
                    let llvm_ty = ty_to_llvm(self.context, &resolved)?;
                    let slot = self
                        .builder
                        .build_alloca(llvm_ty, ref_name)
                        .map_err(llvm_err)?;
                    self.builder.build_store(slot, v).map_err(llvm_err)?;
                    self.locals.insert(ref_name.clone(), (slot, llvm_ty));
                }
                Ok(())
            }
            Expr::Return(value) => {
                let v = self.emit_expr(value)?;
                if let Some(slot) = self.retval_slot {
                    self.builder.build_store(slot, v).map_err(llvm_err)?;
                }
                self.builder
                    .build_unconditional_branch(self.exit_block)
                    .map_err(llvm_err)?;
                Ok(())
            }
            Expr::Loop {
                var,
                begin,
                end,
                step,
                body,
            } => self.emit_loop(var, begin, end, step, body),
            Expr::If { test, body, orelse } => self.emit_if(test, body, orelse),
            Expr::Break => {
                if self.current_block_open() {
                    let target = *self
                        .break_stack
                        .last()
                        .ok_or_else(|| CodegenError::CodegenFailure("break outside loop".into()))?;
                    self.builder.build_unconditional_branch(target).map_err(llvm_err)?;
                }
                Ok(())
            }
            Expr::Noop => Ok(()),
            other => {
                // Any other node kind used in statement position is
                // evaluated purely for side effects (e.g. a bare `Prim` or
                // `CallFunc` statement), matching `visit_Expr`'s behavior
                // for expression statements.
                self.emit_expr(other)?;
                Ok(())
            }
        }
    }

    fn emit_loop(
        &mut self,
        var: &str,
        begin: &Expr,
        end: &Expr,
        step: &Expr,
        body: &[Expr],
    ) -> Result<(), CodegenError> {
        let init_block = self.context.append_basic_block(self.function, "for.init");
        let cond_block = self.context.append_basic_block(self.function, "for.cond");
        let body_block = self.context.append_basic_block(self.function, "for.body");
        let after_block = self.context.append_basic_block(self.function, "for.after");

        self.builder.build_unconditional_branch(init_block).map_err(llvm_err)?;
        self.builder.position_at_end(init_block);

        // `begin`/`end`/`step` are each evaluated exactly once, here in the
        // loop's init block, matching `range(...)`'s own semantics: the
        // bound and stride are snapshotted when the range is constructed,
        // not re-read on every iteration. `init_block` unconditionally
        // dominates `cond_block`/`body_block`, so these SSA values remain
        // valid to reference from either without re-emitting them.
        let begin_v = self.emit_expr(begin)?.into_int_value();
        let end_v = self.emit_expr(end)?.into_int_value();
        let step_v = self.emit_expr(step)?.into_int_value();
        let counter = self.builder.build_alloca(self.context.i64_type(), var).map_err(llvm_err)?;
        self.builder.build_store(counter, begin_v).map_err(llvm_err)?;
        self.locals
            .insert(var.to_string(), (counter, self.context.i64_type().into()));

        self.builder.build_unconditional_branch(cond_block).map_err(llvm_err)?;

        self.builder.position_at_end(cond_block);
        let cur = self
            .builder
            .build_load(self.context.i64_type(), counter, var)
            .map_err(llvm_err)?
            .into_int_value();
        let cond = self
            .builder
            .build_int_compare(IntPredicate::SLT, cur, end_v, "loopcond")
            .map_err(llvm_err)?;
        self.builder
            .build_conditional_branch(cond, body_block, after_block)
            .map_err(llvm_err)?;

        self.break_stack.push(after_block);
        self.builder.position_at_end(body_block);
        for s in body {
            self.emit_stmt(s)?;
        }
        if self.current_block_open() {
            let cur = self
                .builder
                .build_load(self.context.i64_type(), counter, var)
                .map_err(llvm_err)?
                .into_int_value();
            let next = self.builder.build_int_add(cur, step_v, "loopnext").map_err(llvm_err)?;
            self.builder.build_store(counter, next).map_err(llvm_err)?;
            self.builder.build_unconditional_branch(cond_block).map_err(llvm_err)?;
        }
        self.break_stack.pop();

        self.builder.position_at_end(after_block);
        Ok(())
    }

    fn emit_if(&mut self, test: &Expr, body: &[Expr], orelse: &[Expr]) -> Result<(), CodegenError> {
        let cond_v = self.emit_expr(test)?.into_int_value();
        let then_block = self.context.append_basic_block(self.function, "if.then");
        let else_block = self.context.append_basic_block(self.function, "if.else");
        let after_block = self.context.append_basic_block(self.function, "if.after");

        let zero = self.context.i64_type().const_int(0, false);
        let cond = if cond_v.get_type() == self.context.i64_type() {
            self.builder
                .build_int_compare(IntPredicate::NE, cond_v, zero, "ifcond")
                .map_err(llvm_err)?
        } else {
            cond_v
        };
        self.builder
            .build_conditional_branch(cond, then_block, else_block)
            .map_err(llvm_err)?;

        self.builder.position_at_end(then_block);
        for s in body {
            self.emit_stmt(s)?;
        }
        if self.current_block_open() {
            self.builder.build_unconditional_branch(after_block).map_err(llvm_err)?;
        }

        self.builder.position_at_end(else_block);
        for s in orelse {
            self.emit_stmt(s)?;
        }
        if self.current_block_open() {
            self.builder.build_unconditional_branch(after_block).map_err(llvm_err)?;
        }

        self.builder.position_at_end(after_block);
        Ok(())
    }

    fn emit_expr(&mut self, e: &Expr) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        match e {
            Expr::Var { id, .. } => {
                let (slot, pointee_ty) = *self
                    .locals
                    .get(id)
                    .ok_or_else(|| CodegenError::CodegenFailure(format!("unbound name `{id}`")))?;
                let loaded = self.builder.build_load(pointee_ty, slot, id).map_err(llvm_err)?;
                Ok(loaded)
            }
            Expr::LitInt { n, ty } => {
                let raw = ty.borrow().clone().unwrap_or(numjit_types::INT64);
                let resolved = self.resolve(&raw);
                match resolved {
                    Ty::Base(numjit_types::BaseTy::Double64) => {
                        Ok(self.context.f64_type().const_float(*n as f64).as_basic_value_enum())
                    }
                    Ty::Base(numjit_types::BaseTy::Float32) => {
                        Ok(self.context.f32_type().const_float(*n as f64).as_basic_value_enum())
                    }
                    Ty::Base(numjit_types::BaseTy::Int32) => Ok(self
                        .context
                        .i32_type()
                        .const_int(*n as u64, true)
                        .as_basic_value_enum()),
                    _ => Ok(self
                        .context
                        .i64_type()
                        .const_int(*n as u64, true)
                        .as_basic_value_enum()),
                }
            }
            Expr::LitFloat { n, ty } => {
                let raw = ty.borrow().clone().unwrap_or(numjit_types::DOUBLE64);
                let resolved = self.resolve(&raw);
                match resolved {
                    Ty::Base(numjit_types::BaseTy::Float32) => {
                        Ok(self.context.f32_type().const_float(*n).as_basic_value_enum())
                    }
                    _ => Ok(self.context.f64_type().const_float(*n).as_basic_value_enum()),
                }
            }
            Expr::LitBool(b) => Ok(self
                .context
                .i64_type()
                .const_int(*b as u64, false)
                .as_basic_value_enum()),
            Expr::Const(c) => Ok(match c {
                Const::Int(n) => self.context.i64_type().const_int(*n as u64, true).as_basic_value_enum(),
                Const::Float(n) => self.context.f64_type().const_float(*n).as_basic_value_enum(),
                Const::Bool(b) => self
                    .context
                    .i64_type()
                    .const_int(*b as u64, false)
                    .as_basic_value_enum(),
            }),
            Expr::Prim { op, args } => self.emit_prim(*op, args),
            Expr::Index { value, ix } => self.emit_index(value, ix),
            Expr::Compare {
                left,
                ops,
                comparators,
            } => {
                let op = ops.first().copied().unwrap_or(CmpOp::Eq);
                let rhs = comparators
                    .first()
                    .ok_or_else(|| CodegenError::CodegenFailure("Compare with no comparator".into()))?;
                let a = self.emit_expr(left)?;
                let b = self.emit_expr(rhs)?;
                self.emit_binop(op.as_prim_op(), a, b)
            }
            Expr::CallFunc { callee, args } => self.emit_call(callee, args),
            Expr::Assign { .. }
            | Expr::Return(_)
            | Expr::Loop { .. }
            | Expr::If { .. }
            | Expr::Break
            | Expr::Noop => Err(CodegenError::CodegenFailure(
                "statement-only node used in expression position".into(),
            )),
        }
    }

    fn emit_index(&mut self, value: &Expr, ix: &Expr) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        // `a.shape[i]` indexes the i32 shape vector, not `a`'s own element
        // array -- a distinct pointer with its own (always i32) element
        // width, so it must be special-cased ahead of the generic array-
        // parameter and raw-pointer paths below.
        if let Expr::Prim {
            op: PrimOp::Shape,
            args,
        } = value
        {
            if let Expr::Var { id, .. } = &args[0] {
                if let Some(meta) = self.arrays.get(id) {
                    let shape = meta.shape;
                    let ix_v = self.emit_expr(ix)?.into_int_value();
                    let i32_ty = self.context.i32_type();
                    let ptr = unsafe {
                        self.builder
                            .build_gep(i32_ty, shape, &[ix_v], "shapeidx")
                            .map_err(llvm_err)?
                    };
                    let loaded = self
                        .builder
                        .build_load(i32_ty, ptr, "shapeidxval")
                        .map_err(llvm_err)?
                        .into_int_value();
                    let widened = self
                        .builder
                        .build_int_s_extend(loaded, self.context.i64_type(), "shapeidxwide")
                        .map_err(llvm_err)?;
                    return Ok(widened.as_basic_value_enum());
                }
            }
            return Err(CodegenError::CodegenFailure(
                "shape# requires an array-typed variable".into(),
            ));
        }
        if let Expr::Var { id, .. } = value {
            if let Some(meta) = self.arrays.get(id) {
                let elem_ty = meta.elem_ty;
                let data = meta.data;
                let ix_v = self.emit_expr(ix)?.into_int_value();
                let ptr = unsafe {
                    self.builder
                        .build_gep(elem_ty, data, &[ix_v], "idx")
                        .map_err(llvm_err)?
                };
                let loaded = self.builder.build_load(elem_ty, ptr, "idxval").map_err(llvm_err)?;
                return Ok(loaded);
            }
        }
        // A local bound to a raw pointer (not a cached array parameter) is
        // indexed as an i64 array, the dialect's only other indexable shape.
        let value_v = self.emit_expr(value)?.into_pointer_value();
        let ix_v = self.emit_expr(ix)?.into_int_value();
        let elem_ty = self.context.i64_type();
        let ptr = unsafe {
            self.builder
                .build_gep(elem_ty, value_v, &[ix_v], "idx")
                .map_err(llvm_err)?
        };
        let loaded = self.builder.build_load(elem_ty, ptr, "idxval").map_err(llvm_err)?;
        Ok(loaded)
    }

    fn emit_prim(&mut self, op: PrimOp, args: &[Expr]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        if matches!(op, PrimOp::Shape) {
            if let Expr::Var { id, .. } = &args[0] {
                if let Some(meta) = self.arrays.get(id) {
                    return Ok(meta.shape.as_basic_value_enum());
                }
            }
            return Err(CodegenError::CodegenFailure(
                "shape# requires an array-typed variable".into(),
            ));
        }
        if matches!(op, PrimOp::Pow) {
            return Err(CodegenError::CodegenFailure("pow# is not implemented".into()));
        }
        if matches!(op, PrimOp::Not) {
            let a = self.emit_expr(&args[0])?.into_int_value();
            return Ok(self.builder.build_not(a, "not").map_err(llvm_err)?.as_basic_value_enum());
        }
        if matches!(op, PrimOp::Neg) {
            let a = self.emit_expr(&args[0])?;
            return match a {
                BasicValueEnum::FloatValue(f) => Ok(self
                    .builder
                    .build_float_neg(f, "neg")
                    .map_err(llvm_err)?
                    .as_basic_value_enum()),
                BasicValueEnum::IntValue(i) => Ok(self
                    .builder
                    .build_int_neg(i, "neg")
                    .map_err(llvm_err)?
                    .as_basic_value_enum()),
                _ => Err(CodegenError::CodegenFailure("neg# on non-numeric value".into())),
            };
        }

        let a = self.emit_expr(&args[0])?;
        let b = self.emit_expr(&args[1])?;
        self.emit_binop(op, a, b)
    }

    fn emit_binop(
        &self,
        op: PrimOp,
        a: BasicValueEnum<'ctx>,
        b: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let is_float = matches!(a, BasicValueEnum::FloatValue(_));
        match op {
            PrimOp::Add if is_float => self.bin_float(a, b, "fadd", Builder::build_float_add),
            PrimOp::Add => self.bin_int(a, b, "add", Builder::build_int_add),
            PrimOp::Sub if is_float => self.bin_float(a, b, "fsub", Builder::build_float_sub),
            PrimOp::Sub => self.bin_int(a, b, "sub", Builder::build_int_sub),
            PrimOp::Mult if is_float => self.bin_float(a, b, "fmul", Builder::build_float_mul),
            PrimOp::Mult => self.bin_int(a, b, "mul", Builder::build_int_mul),
            PrimOp::Div if is_float => self.bin_float(a, b, "fdiv", Builder::build_float_div),
            PrimOp::Div => self.bin_int(a, b, "sdiv", Builder::build_int_signed_div),
            PrimOp::Mod if is_float => self.bin_float(a, b, "frem", Builder::build_float_rem),
            PrimOp::Mod => self.bin_int(a, b, "srem", Builder::build_int_signed_rem),
            PrimOp::And => self.bin_int(a, b, "and", Builder::build_and),
            PrimOp::Or => self.bin_int(a, b, "or", Builder::build_or),
            PrimOp::Eq => self.compare(a, b, IntPredicate::EQ, FloatPredicate::UEQ, "eq"),
            PrimOp::Ne => self.compare(a, b, IntPredicate::NE, FloatPredicate::UNE, "ne"),
            PrimOp::Lt => self.compare(a, b, IntPredicate::SLT, FloatPredicate::ULT, "lt"),
            PrimOp::Le => self.compare(a, b, IntPredicate::SLE, FloatPredicate::ULE, "le"),
            PrimOp::Gt => self.compare(a, b, IntPredicate::SGT, FloatPredicate::UGT, "gt"),
            PrimOp::Ge => self.compare(a, b, IntPredicate::SGE, FloatPredicate::UGE, "ge"),
            PrimOp::Shape | PrimOp::Not | PrimOp::Neg => unreachable!("handled above"),
        }
    }

    fn bin_float(
        &self,
        a: BasicValueEnum<'ctx>,
        b: BasicValueEnum<'ctx>,
        name: &str,
        f: impl FnOnce(&Builder<'ctx>, inkwell::values::FloatValue<'ctx>, inkwell::values::FloatValue<'ctx>, &str) -> Result<inkwell::values::FloatValue<'ctx>, inkwell::builder::BuilderError>,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let v = f(&self.builder, a.into_float_value(), b.into_float_value(), name).map_err(llvm_err)?;
        Ok(v.as_basic_value_enum())
    }

    fn bin_int(
        &self,
        a: BasicValueEnum<'ctx>,
        b: BasicValueEnum<'ctx>,
        name: &str,
        f: impl FnOnce(&Builder<'ctx>, IntValue<'ctx>, IntValue<'ctx>, &str) -> Result<IntValue<'ctx>, inkwell::builder::BuilderError>,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let v = f(&self.builder, a.into_int_value(), b.into_int_value(), name).map_err(llvm_err)?;
        Ok(v.as_basic_value_enum())
    }

    fn compare(
        &self,
        a: BasicValueEnum<'ctx>,
        b: BasicValueEnum<'ctx>,
        int_pred: IntPredicate,
        float_pred: FloatPredicate,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let result = if matches!(a, BasicValueEnum::FloatValue(_)) {
            let cmp = self
                .builder
                .build_float_compare(float_pred, a.into_float_value(), b.into_float_value(), name)
                .map_err(llvm_err)?;
            self.builder
                .build_int_z_extend(cmp, self.context.i64_type(), "boolext")
                .map_err(llvm_err)?
        } else {
            let cmp = self
                .builder
                .build_int_compare(int_pred, a.into_int_value(), b.into_int_value(), name)
                .map_err(llvm_err)?;
            self.builder
                .build_int_z_extend(cmp, self.context.i64_type(), "boolext")
                .map_err(llvm_err)?
        };
        Ok(result.as_basic_value_enum())
    }

    fn emit_call(&mut self, callee: &str, args: &[Expr]) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        let arg_values: Vec<BasicValueEnum<'ctx>> = args
            .iter()
            .map(|a| self.emit_expr(a))
            .collect::<Result<_, _>>()?;
        let metadata_args: Vec<BasicMetadataValueEnum<'ctx>> =
            arg_values.iter().map(|v| (*v).into()).collect();

        if callee == self.original_name {
            let call = self
                .builder
                .build_call(self.function, &metadata_args, "selfcall")
                .map_err(llvm_err)?;
            return call
                .try_as_basic_value()
                .left()
                .ok_or_else(|| CodegenError::CodegenFailure("recursive call to a void function used as a value".into()));
        }

        let host_fn = self
            .host_registry
            .get(callee)
            .ok_or_else(|| CodegenError::UnregisteredCallee(callee.to_string()))?;

        let param_types: Vec<BasicMetadataTypeEnum<'ctx>> = host_fn
            .param_types
            .iter()
            .map(|t| ty_to_llvm(self.context, &t.to_ty()).map(Into::into))
            .collect::<Result<_, _>>()?;
        let ret_ty = ty_to_llvm(self.context, &host_fn.return_type.to_ty())?;
        let fn_type = ret_ty.fn_type(&param_types, false);

        // The host-call bridge: bake the callback's address as an integer
        // constant and cast it through to a typed function pointer. This is
        // the documented unsafe boundary (§9) -- arity/type mismatch here
        // traps at call time, not at compile time.
        let ptr_ty = self.context.ptr_type(AddressSpace::default());
        let addr = self.context.i64_type().const_int(host_fn.address as u64, false);
        let fn_ptr = self
            .builder
            .build_int_to_ptr(addr, ptr_ty, "hostfn")
            .map_err(llvm_err)?;

        let call = self
            .builder
            .build_indirect_call(fn_type, fn_ptr, &metadata_args, "hostcall")
            .map_err(llvm_err)?;
        call.try_as_basic_value()
            .left()
            .ok_or_else(|| CodegenError::CodegenFailure("host call to a void function used as a value".into()))
    }
}
