/// Errors raised while emitting LLVM IR for a specialized function, and
/// while resolving the host-call bridge.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// A primitive tag codegen cannot emit -- `pow#` is explicitly
    /// unimplemented per §4.5, and an unrecognized tag would also land here.
    #[error("codegen failure: {0}")]
    CodegenFailure(String),

    /// `CallFunc` named a callee that is neither the enclosing function
    /// (recursive self-call) nor a name registered in the host-function
    /// table.
    #[error("unregistered callee: {0}")]
    UnregisteredCallee(String),

    /// A type reaching codegen still carries a free type variable -- the
    /// specializer should have ruled this out, so reaching it here means
    /// the caller skipped `UnderDetermined` and invoked codegen anyway.
    #[error("type not fully determined at codegen time: {0}")]
    NotDetermined(String),

    /// An inkwell/LLVM API call failed (builder error, verification
    /// failure, pass pipeline failure).
    #[error("LLVM error: {0}")]
    LlvmError(String),
}
