//! Specialization: unifying an inferred principal type against a call
//! site's classified runtime argument types to produce a monomorphic
//! substitution (§4.4 steps 2-5).

use numjit_infer::{apply, compose, unify, Subst};
use numjit_types::{is_determined, Ty};

use crate::error::NumjitError;

/// The result of specializing a function's principal type against one
/// call-site argument vector: a ground argument/return type vector and the
/// substitution codegen resolves every remaining free-variable node through.
pub struct Specialized {
    pub arg_types: Vec<Ty>,
    pub return_type: Ty,
    pub specializer: Subst,
}

/// Specializes `func_ty` (the `Func` type inference produced) under `mgu`
/// (its solved constraint set) against `call_args` (classified runtime
/// argument types), per §4.4.
///
/// Fails with `UnderDetermined` if any component of the specialized
/// argument/return vector still carries a free type variable after
/// unification -- the call site did not supply enough information to pin
/// down every type in the function, most commonly a function whose return
/// type depends on a variable no argument constrains.
pub fn specialize(func_ty: &Ty, mgu: &Subst, call_args: &[Ty]) -> Result<Specialized, NumjitError> {
    let return_var = Ty::var("$return_var");
    let spec = Ty::func(call_args.to_vec(), return_var.clone());

    let unifier = unify(func_ty, &spec)?;
    let specializer = compose(&unifier, mgu);

    let return_type = apply(&specializer, &return_var);
    let arg_types: Vec<Ty> = call_args
        .iter()
        .map(|_| ())
        .enumerate()
        .map(|(i, ())| match func_ty {
            Ty::Func(args, _) => apply(&specializer, &args[i]),
            _ => unreachable!("func_ty must be a Func"),
        })
        .collect();

    if !is_determined(&return_type) || arg_types.iter().any(|t| !is_determined(t)) {
        return Err(NumjitError::UnderDetermined);
    }

    Ok(Specialized {
        arg_types,
        return_type,
        specializer,
    })
}
