//! Per-function memory traffic accounting
//!
//! Counts loads and stores in a function body and sums the allocation size
//! of every value they move, as reported by the target's data layout.

use crate::data_layout::TypeSizeOracle;
use crate::demangle::demangle;
use crate::ir::{Function, Instruction};

/// Memory traffic metrics for one function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionAnalysis {
    /// Linkage name
    pub mangled_name: String,
    /// Human-readable name, equal to the mangled name when demangling fails
    pub demangled_name: String,
    pub loads: u64,
    pub stores: u64,
    /// Total bytes read by loads plus bytes written by stores
    pub bytes: u64,
}

/// Walks a function body and produces its `FunctionAnalysis`
pub struct InstructionAccountant<'a> {
    sizes: &'a dyn TypeSizeOracle,
}

impl<'a> InstructionAccountant<'a> {
    pub fn new(sizes: &'a dyn TypeSizeOracle) -> Self {
        Self { sizes }
    }

    pub fn analyze(&self, function: &Function) -> FunctionAnalysis {
        let mut result = FunctionAnalysis {
            mangled_name: function.name.clone(),
            demangled_name: demangle(&function.name),
            ..FunctionAnalysis::default()
        };

        for block in &function.blocks {
            for instruction in &block.instructions {
                match instruction {
                    Instruction::Load { ty } => {
                        let size = self.sizes.alloc_size(ty);
                        result.loads += 1;
                        result.bytes = result.bytes.saturating_add(size);
                        tracing::trace!(
                            "{}/{}: load {} ({} bytes)",
                            function.name,
                            block.label,
                            ty,
                            size
                        );
                    }
                    Instruction::Store { value_ty } => {
                        let size = self.sizes.alloc_size(value_ty);
                        result.stores += 1;
                        result.bytes = result.bytes.saturating_add(size);
                        tracing::trace!(
                            "{}/{}: store {} ({} bytes)",
                            function.name,
                            block.label,
                            value_ty,
                            size
                        );
                    }
                    Instruction::Call { .. } | Instruction::Other { .. } => {}
                }
            }
        }

        result
    }
}
