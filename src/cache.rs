//! Per-run memoization of function analyses
//!
//! Keyed by `FunctionId`, so two functions that share a name never share an
//! entry. The module is read-only for the whole run, so entries never go
//! stale and are never evicted.

use crate::accountant::FunctionAnalysis;
use crate::ir::FunctionId;
use fnv::FnvHashMap;

#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: FnvHashMap<FunctionId, FunctionAnalysis>,
    computations: u64,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached analysis for `id`, running `compute` only on the first request
    pub fn get_or_compute<F>(&mut self, id: FunctionId, compute: F) -> &FunctionAnalysis
    where
        F: FnOnce() -> FunctionAnalysis,
    {
        let computations = &mut self.computations;
        self.entries.entry(id).or_insert_with(|| {
            *computations += 1;
            compute()
        })
    }

    pub fn get(&self, id: FunctionId) -> Option<&FunctionAnalysis> {
        self.entries.get(&id)
    }

    /// Number of cache misses so far
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
