//! Configuration controlling the compilation pipeline.
//!
//! A small `Serialize + Deserialize` struct carried on [`crate::JitContext`],
//! rather than a bag of loose arguments threaded through every call.

use inkwell::OptimizationLevel;
use serde::{Deserialize, Serialize};

/// The LLVM optimization level to run over a specialized function's module
/// before it is handed to the execution engine.
///
/// §4.5 names level 3 with loop vectorization enabled as *the* pipeline;
/// here that is the default, not the only option -- a caller debugging a
/// miscompile can drop to `O0` without touching the rest of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
}

impl Default for OptLevel {
    fn default() -> Self {
        OptLevel::O3
    }
}

impl OptLevel {
    pub fn to_llvm(self) -> OptimizationLevel {
        match self {
            OptLevel::O0 => OptimizationLevel::None,
            OptLevel::O1 => OptimizationLevel::Less,
            OptLevel::O2 => OptimizationLevel::Default,
            OptLevel::O3 => OptimizationLevel::Aggressive,
        }
    }

    /// The `run_passes` pipeline string for this level, with loop
    /// vectorization folded in at `O3` per §4.5 ("an optimization pipeline
    /// at level 3 with loop vectorization enabled").
    fn pass_pipeline(self) -> &'static str {
        match self {
            OptLevel::O0 => "default<O0>",
            OptLevel::O1 => "default<O1>",
            OptLevel::O2 => "default<O2>",
            OptLevel::O3 => "default<O3>,loop-vectorize",
        }
    }
}

/// Options controlling specialization and codegen, carried on [`crate::JitContext`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    /// LLVM optimization level (§4.5's "level 3" default).
    pub opt_level: OptLevel,

    /// Whether loop vectorization is enabled at all, independent of
    /// `opt_level` -- §4.5 only turns it on at O3, but a caller profiling a
    /// pathological vectorizer bug on an O3 build can disable just this.
    pub loop_vectorize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            opt_level: OptLevel::default(),
            loop_vectorize: true,
        }
    }
}

impl CompileOptions {
    /// The LLVM new-pass-manager pipeline string to run, honoring
    /// `loop_vectorize` by falling back to the bare `default<N>` pipeline
    /// when the caller has opted out of vectorization at O3.
    pub fn pass_pipeline(&self) -> &'static str {
        if self.opt_level == OptLevel::O3 && !self.loop_vectorize {
            "default<O3>"
        } else {
            self.opt_level.pass_pipeline()
        }
    }
}
