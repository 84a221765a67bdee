use numjit_types::Ty;

/// Computes the mangled cache/symbol key for `(function_name, monomorphic
/// argument-type vector)`, per §4.4/§6: `name ++ stable_hash(args)`.
///
/// Stability is only required within a process, so a process-local,
/// deterministic hash (blake3 over each argument type's `Display` form,
/// joined by a separator that cannot appear in a type's own rendering) is
/// sufficient -- no need for a cross-process-stable format.
pub fn mangle(name: &str, arg_types: &[Ty]) -> String {
    format!("{name}{}", stable_hash(arg_types))
}

/// A short, deterministic hex digest of an argument-type vector.
pub fn stable_hash(arg_types: &[Ty]) -> String {
    let mut hasher = blake3::Hasher::new();
    for t in arg_types {
        hasher.update(t.to_string().as_bytes());
        hasher.update(b"\0");
    }
    let digest = hasher.finalize();
    digest.to_hex()[..16].to_string()
}
