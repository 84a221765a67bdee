//! The compilation cache: mangled-name cache keyed on
//! `(function_name, argument-type vector)` (§3, §4.4, §6).

use std::collections::HashMap;
use std::sync::Arc;

use numjit_codegen::{mangle, NativeFunction};
use numjit_types::Ty;

/// Maps a mangled cache key to its compiled, callable native entry.
///
/// Native entries live as long as the process (§5: "once added, modules are
/// not removed"); each call borrows its entry via `Arc` rather than cloning
/// the underlying compiled code.
#[derive(Default)]
pub struct CompilationCache {
    entries: HashMap<String, Arc<NativeFunction>>,
}

impl CompilationCache {
    pub fn new() -> Self {
        CompilationCache {
            entries: HashMap::new(),
        }
    }

    /// Looks up a previously compiled variant for `(name, arg_types)`,
    /// without triggering compilation on a miss.
    pub fn get(&self, name: &str, arg_types: &[Ty]) -> Option<Arc<NativeFunction>> {
        self.entries.get(&mangle(name, arg_types)).cloned()
    }

    /// Installs a freshly compiled variant. Invariant (iii) of §3: the
    /// mangled key is total on the monomorphic signature, so a second
    /// install under the same `(name, arg_types)` simply overwrites the
    /// first rather than producing a duplicate entry under a different key.
    pub fn insert(&mut self, name: &str, arg_types: &[Ty], entry: NativeFunction) -> Arc<NativeFunction> {
        let key = mangle(name, arg_types);
        let entry = Arc::new(entry);
        self.entries.insert(key, entry.clone());
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numjit_types::{DOUBLE64, INT64};

    fn dummy(address: usize, arg_types: &[Ty], ret: &Ty) -> NativeFunction {
        NativeFunction::new(address, arg_types, ret).unwrap()
    }

    #[test]
    fn miss_then_insert_then_hit() {
        let mut cache = CompilationCache::new();
        assert!(cache.get("add", &[INT64, INT64]).is_none());

        let entry = dummy(0x1000, &[INT64, INT64], &INT64);
        cache.insert("add", &[INT64, INT64], entry);

        assert!(cache.get("add", &[INT64, INT64]).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_signatures_occupy_distinct_entries() {
        let mut cache = CompilationCache::new();
        cache.insert("add", &[INT64, INT64], dummy(0x1000, &[INT64, INT64], &INT64));
        cache.insert(
            "add",
            &[DOUBLE64, DOUBLE64],
            dummy(0x2000, &[DOUBLE64, DOUBLE64], &DOUBLE64),
        );
        assert_eq!(cache.len(), 2);
        assert!(cache.get("add", &[INT64, INT64]).is_some());
        assert!(cache.get("add", &[DOUBLE64, DOUBLE64]).is_some());
    }

    #[test]
    fn reinserting_the_same_signature_overwrites_rather_than_duplicates() {
        let mut cache = CompilationCache::new();
        cache.insert("add", &[INT64, INT64], dummy(0x1000, &[INT64, INT64], &INT64));
        cache.insert("add", &[INT64, INT64], dummy(0x2000, &[INT64, INT64], &INT64));
        assert_eq!(cache.len(), 1);
    }
}
