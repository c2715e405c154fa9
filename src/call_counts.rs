//! Direct call counts per callee
//!
//! Built once per run. Nothing in the report consumes it yet; it is the
//! starting point for weighting a function's traffic by how often it is
//! called.

use crate::ir::{FunctionId, Instruction, Module};
use fnv::FnvHashMap;

#[derive(Debug, Default)]
pub struct CallCountTable {
    counts: FnvHashMap<FunctionId, u64>,
    unresolved: u64,
}

impl CallCountTable {
    /// Tally every call instruction in the module by resolved callee
    ///
    /// Indirect calls and calls to names the module does not contain are
    /// counted as unresolved and otherwise skipped.
    pub fn build(module: &Module) -> Self {
        let mut table = Self::default();

        for (_, function) in module.functions() {
            for instruction in function.instructions() {
                let Instruction::Call { callee } = instruction else {
                    continue;
                };
                match callee.as_deref().and_then(|name| module.resolve(name)) {
                    Some(id) => *table.counts.entry(id).or_insert(0) += 1,
                    None => {
                        if let Some(name) = callee {
                            tracing::warn!(
                                "{}: call to unknown function '{}'",
                                function.name,
                                name
                            );
                        }
                        table.unresolved += 1;
                    }
                }
            }
        }

        table
    }

    /// Number of direct calls to `id`
    pub fn count(&self, id: FunctionId) -> u64 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn unresolved(&self) -> u64 {
        self.unresolved
    }

    /// Number of distinct callees
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Callees ordered by descending call count, ties by declaration order
    pub fn ranked(&self) -> Vec<(FunctionId, u64)> {
        let mut ranked: Vec<_> = self.counts.iter().map(|(id, n)| (*id, *n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}
