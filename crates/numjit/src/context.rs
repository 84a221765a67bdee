//! The process-wide JIT context: the single long-lived value holding every
//! piece of shared mutable state the pipeline needs (§5, §9 Design Note
//! "Shared mutable state").
//!
//! `JitContext` plays the role the source dialect's module-level globals
//! play (an interned LLVM context, the compilation cache, the host-function
//! table) collapsed into one value so every pipeline stage can take it by
//! explicit reference instead of reaching for ambient statics.

use std::sync::Arc;

use inkwell::context::Context;
use inkwell::execution_engine::ExecutionEngine;
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine};

use numjit_codegen::{compile_fun, HostFunction, HostRegistry, HostTy, NativeFunction, NativeResult};
use numjit_core::Fun;
use numjit_infer::infer_fun;
use numjit_types::Ty;

use crate::cache::CompilationCache;
use crate::config::CompileOptions;
use crate::error::NumjitError;
use crate::runtime::{classify_args, RuntimeValue};
use crate::specialize::specialize;

/// A function registered with the context: its lowered Core IR and its
/// already-inferred principal type (§6 `jit`/`autojit`: "eager lowering +
/// inference; specialization deferred to call time").
struct Registered {
    fun: Fun,
    func_ty: Ty,
    mgu: numjit_infer::Subst,
}

/// The process-wide JIT compiler context: an interned LLVM context, the
/// compilation cache, the host-function registry, and every function
/// registered for lazy specialization.
///
/// Not `Send`/`Sync`: §5 documents the single-threaded contract explicitly,
/// so this type makes no attempt to support concurrent use -- a caller
/// needing JIT compilation from multiple threads must serialize access
/// externally (e.g. behind a `Mutex`), exactly as §5 requires.
///
/// The underlying LLVM context is intentionally leaked for the process
/// lifetime (`Box::leak`): §5 states "the execution engine owns compiled
/// module memory for the process lifetime; once added, modules are not
/// removed," so there is no point in this type ever tearing the context
/// down, and leaking sidesteps the self-referential-lifetime problem of
/// storing an `ExecutionEngine<'ctx>` alongside the `Context` it borrows.
pub struct JitContext {
    context: &'static Context,
    target_machine: TargetMachine,
    options: CompileOptions,
    cache: CompilationCache,
    host_registry: HostRegistry,
    functions: std::collections::HashMap<String, Registered>,
    /// Every execution engine ever created, kept alive forever so the
    /// compiled code addresses handed out through [`NativeFunction`] stay
    /// valid (§5). One engine per specialized variant, matching §4.5's
    /// "Module finalization" step being a per-specialization act, not a
    /// whole-program one.
    engines: Vec<ExecutionEngine<'static>>,
}

impl JitContext {
    /// Creates a fresh context with default compile options.
    pub fn new() -> Result<Self, NumjitError> {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Result<Self, NumjitError> {
        Target::initialize_native(&InitializationConfig::default()).map_err(|e| {
            NumjitError::Codegen(numjit_codegen::CodegenError::LlvmError(e.to_string()))
        })?;

        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple).map_err(|e| {
            NumjitError::Codegen(numjit_codegen::CodegenError::LlvmError(e.to_string()))
        })?;
        let target_machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                options.opt_level.to_llvm(),
                RelocMode::Default,
                CodeModel::Default,
            )
            .ok_or_else(|| {
                NumjitError::Codegen(numjit_codegen::CodegenError::LlvmError(
                    "failed to create target machine".to_string(),
                ))
            })?;

        let context: &'static Context = Box::leak(Box::new(Context::create()));

        Ok(JitContext {
            context,
            target_machine,
            options,
            cache: CompilationCache::new(),
            host_registry: HostRegistry::new(),
            functions: std::collections::HashMap::new(),
            engines: Vec::new(),
        })
    }

    /// Registers a lowered function for lazy specialization (the `jit`
    /// decorator's eager half, per §6). Runs type inference immediately and
    /// stores the principal type; the first call with a new argument-type
    /// signature triggers specialization and codegen.
    pub fn register(&mut self, fun: Fun) -> Result<(), NumjitError> {
        let inferred = infer_fun(&fun)?;
        tracing::debug!(function = %fun.name, "registered function, principal type inferred");
        self.functions.insert(
            fun.name.clone(),
            Registered {
                fun,
                func_ty: inferred.func_ty,
                mgu: inferred.mgu,
            },
        );
        Ok(())
    }

    /// Registers a host callback reachable from compiled code by name (§6
    /// `reg`). Fails if `param_types`/`return_type` fall outside `{int,
    /// float}` -- structurally impossible here since [`HostTy`] is already
    /// closed to that set, matching the dialect's registration-time
    /// validation.
    pub fn register_host(
        &mut self,
        name: impl Into<String>,
        param_types: Vec<HostTy>,
        return_type: HostTy,
        address: usize,
    ) {
        let name = name.into();
        tracing::debug!(function = %name, "registered host callback");
        self.host_registry.register(HostFunction {
            name,
            param_types,
            return_type,
            address,
        });
    }

    /// Registers a host callback from string-spelled type annotations,
    /// rejecting registration outright if any annotation falls outside
    /// `{int, float}` -- the validation path `reg` actually exercises at the
    /// source level, where annotations arrive as strings rather than as an
    /// already-parsed [`HostTy`] (§6: "anything else fails registration").
    pub fn register_host_annotated(
        &mut self,
        name: impl Into<String>,
        param_annotations: &[&str],
        return_annotation: &str,
        address: usize,
    ) -> Result<(), NumjitError> {
        let parse = |a: &str| {
            numjit_codegen::parse_host_annotation(a)
                .map_err(|_| NumjitError::UnrecognizedHostAnnotation(a.to_string()))
        };
        let param_types = param_annotations
            .iter()
            .map(|a| parse(a))
            .collect::<Result<Vec<_>, _>>()?;
        let return_type = parse(return_annotation)?;
        self.register_host(name, param_types, return_type, address);
        Ok(())
    }

    /// Entry point standing in for the excluded decorator surface: compiles
    /// (on first call with a new argument-type signature) or reuses a cached
    /// variant, then calls it with the given runtime arguments (§4.4, §6).
    pub fn compile_for_args(
        &mut self,
        name: &str,
        args: &[RuntimeValue],
    ) -> Result<NativeResult, NumjitError> {
        let arg_types = classify_args(args)?;

        let entry = self
            .functions
            .get(name)
            .ok_or_else(|| NumjitError::UnknownFunction(name.to_string()))?;
        if entry.fun.params.len() != args.len() {
            return Err(NumjitError::ArityMismatch {
                name: name.to_string(),
                expected: entry.fun.params.len(),
                got: args.len(),
            });
        }

        let native = if let Some(cached) = self.cache.get(name, &arg_types) {
            tracing::debug!(function = name, ?arg_types, "cache hit");
            cached
        } else {
            tracing::info!(function = name, ?arg_types, "cache miss, compiling specialization");
            self.compile_variant(name, &arg_types)?
        };

        let native_args: Vec<_> = args.iter().map(RuntimeValue::to_native_arg).collect();
        // SAFETY: `native` was built from a specialization whose arg/return
        // types match `native_args`'s shape exactly -- `arg_types` drove both
        // the codegen signature and this call's marshaling -- and the
        // execution engine that owns its compiled code is kept alive in
        // `self.engines` for the process lifetime (§5).
        unsafe { native.call(&native_args).map_err(NumjitError::from) }
    }

    fn compile_variant(
        &mut self,
        name: &str,
        arg_types: &[Ty],
    ) -> Result<Arc<NativeFunction>, NumjitError> {
        let entry = self
            .functions
            .get(name)
            .ok_or_else(|| NumjitError::UnknownFunction(name.to_string()))?;

        let specialized = specialize(&entry.func_ty, &entry.mgu, arg_types)?;

        let mangled = numjit_codegen::mangle(name, &specialized.arg_types);
        let module = self.context.create_module(&mangled);

        compile_fun(
            self.context,
            &module,
            &entry.fun,
            &specialized.arg_types,
            &specialized.return_type,
            &specialized.specializer,
            &self.host_registry,
        )?;

        module.verify().map_err(|e| {
            NumjitError::Codegen(numjit_codegen::CodegenError::LlvmError(e.to_string()))
        })?;

        module
            .run_passes(
                self.options.pass_pipeline(),
                &self.target_machine,
                PassBuilderOptions::create(),
            )
            .map_err(|e| {
                NumjitError::Codegen(numjit_codegen::CodegenError::LlvmError(e.to_string()))
            })?;

        let engine = module
            .create_jit_execution_engine(self.options.opt_level.to_llvm())
            .map_err(|e| {
                NumjitError::Codegen(numjit_codegen::CodegenError::LlvmError(e.to_string()))
            })?;

        let address = engine
            .get_function_address(&mangled)
            .map_err(|e| {
                NumjitError::Codegen(numjit_codegen::CodegenError::LlvmError(e.to_string()))
            })? as usize;

        let native = NativeFunction::new(address, &specialized.arg_types, &specialized.return_type)?;
        let installed = self.cache.insert(name, &specialized.arg_types, native);

        // The engine must outlive every call through `installed`'s raw code
        // pointer -- keep it in `self.engines` for the process lifetime
        // rather than letting it drop at the end of this function (§5).
        self.engines.push(engine);

        Ok(installed)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
