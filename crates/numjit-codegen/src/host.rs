//! The host-function table: non-compiled callbacks that compiled code may
//! call into by name (§6 `reg`, §4.5 host-call bridge, §9 design note on the
//! raw-pointer boundary).

use std::collections::HashMap;

use numjit_types::{BaseTy, Ty};

use crate::error::CodegenError;

/// A recognized host-function parameter/return annotation. §6 restricts
/// registration to `{int, float}` -- narrower than the lowering's parameter
/// annotation set, since a host callback's signature must be fully concrete
/// (there is no inference pass over host code to fall back on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostTy {
    Int,
    Float,
}

impl HostTy {
    pub fn to_ty(self) -> Ty {
        match self {
            HostTy::Int => Ty::Base(BaseTy::Int64),
            HostTy::Float => Ty::Base(BaseTy::Double64),
        }
    }
}

/// A registered host callback: its name, the types of its parameters and
/// return value, and its in-process code address.
#[derive(Debug, Clone)]
pub struct HostFunction {
    pub name: String,
    pub param_types: Vec<HostTy>,
    pub return_type: HostTy,
    pub address: usize,
}

/// The process-wide registry of host callbacks reachable from compiled
/// code. Arity and types are validated at registration time and re-checked
/// at call-emission time (§9: "validate arity+types at registration and at
/// emission").
#[derive(Debug, Default)]
pub struct HostRegistry {
    functions: HashMap<String, HostFunction>,
}

impl HostRegistry {
    pub fn new() -> Self {
        HostRegistry {
            functions: HashMap::new(),
        }
    }

    /// Registers a callback. Fails if an annotated type falls outside
    /// `{int, float}` -- there is no such failure mode in this signature
    /// since `HostTy` is already closed to that set; this function exists so
    /// a caller constructing `HostFunction` from a looser, string-annotated
    /// source (e.g. a `reg`-style decorator bridge) has one place to reject
    /// unrecognized spellings.
    pub fn register(&mut self, f: HostFunction) {
        self.functions.insert(f.name.clone(), f);
    }

    pub fn get(&self, name: &str) -> Option<&HostFunction> {
        self.functions.get(name)
    }
}

/// Parses a type annotation string into a `HostTy`, the validation step
/// `reg` performs before installing a callback (§6: "must be drawn from the
/// recognized set {int, float}; anything else fails registration").
pub fn parse_host_annotation(s: &str) -> Result<HostTy, CodegenError> {
    match s {
        "int" => Ok(HostTy::Int),
        "float" => Ok(HostTy::Float),
        other => Err(CodegenError::CodegenFailure(format!(
            "unrecognized host annotation `{other}`, expected `int` or `float`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_annotations_parse() {
        assert_eq!(parse_host_annotation("int").unwrap(), HostTy::Int);
        assert_eq!(parse_host_annotation("float").unwrap(), HostTy::Float);
    }

    #[test]
    fn unrecognized_annotation_fails_registration() {
        assert!(parse_host_annotation("str").is_err());
    }

    #[test]
    fn registry_round_trips_a_registered_function() {
        let mut reg = HostRegistry::new();
        reg.register(HostFunction {
            name: "callback".to_string(),
            param_types: vec![HostTy::Int],
            return_type: HostTy::Int,
            address: 0x1000,
        });
        let f = reg.get("callback").unwrap();
        assert_eq!(f.address, 0x1000);
        assert_eq!(f.param_types, vec![HostTy::Int]);
    }

    #[test]
    fn unregistered_name_returns_none() {
        let reg = HostRegistry::new();
        assert!(reg.get("missing").is_none());
    }
}
