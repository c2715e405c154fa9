//! In-memory program unit: functions, blocks, instructions and debug locations
//!
//! Modules are loaded from a JSON dump produced by the front end:
//!
//! ```json
//! {
//!   "name": "demo.c",
//!   "data_layout": "e-m:e-i64:64-f80:128-n8:16:32:64-S128",
//!   "functions": [
//!     {
//!       "name": "_Z3sumPii",
//!       "debug": { "directory": "/home/me/proj", "filename": "src/sum.c", "line": 3 },
//!       "blocks": [
//!         { "label": "entry", "instructions": [
//!           { "op": "load", "ty": "i32" },
//!           { "op": "store", "value_ty": "i64" },
//!           { "op": "call", "callee": "helper" },
//!           { "op": "other", "opcode": "add" }
//!         ] }
//!       ]
//!     },
//!     { "name": "helper" }
//!   ]
//! }
//! ```
//!
//! A function without `blocks` is a declaration.

pub mod types;

pub use types::Type;

use crate::data_layout::DataLayout;
use crate::error::{MemcheckError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Identity of a function within one module (its declaration position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub usize);

/// Source location recorded in a function's debug metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugLocation {
    /// Compilation directory
    pub directory: String,
    /// File name, relative to `directory` or absolute
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// A single IR operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Read a value of type `ty` from memory
    Load { ty: Type },
    /// Write a value of type `value_ty` to memory
    Store { value_ty: Type },
    /// Call a function by name, `None` for indirect calls
    Call {
        #[serde(default)]
        callee: Option<String>,
    },
    /// Anything that does not touch addressable storage
    Other { opcode: String },
}

impl Instruction {
    pub fn load(ty: Type) -> Self {
        Instruction::Load { ty }
    }

    pub fn store(value_ty: Type) -> Self {
        Instruction::Store { value_ty }
    }

    pub fn call(callee: impl Into<String>) -> Self {
        Instruction::Call {
            callee: Some(callee.into()),
        }
    }

    pub fn indirect_call() -> Self {
        Instruction::Call { callee: None }
    }

    pub fn other(opcode: impl Into<String>) -> Self {
        Instruction::Other {
            opcode: opcode.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

/// A function definition or declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Linkage (mangled) name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            debug: None,
            blocks: Vec::new(),
        }
    }

    pub fn with_debug(mut self, directory: impl Into<String>, filename: impl Into<String>) -> Self {
        self.debug = Some(DebugLocation {
            directory: directory.into(),
            filename: filename.into(),
            line: None,
        });
        self
    }

    pub fn with_block(mut self, label: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        self.blocks.push(BasicBlock {
            label: label.into(),
            instructions,
        });
        self
    }

    /// A declaration has no body
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All instructions in block order
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|block| block.instructions.iter())
    }
}

/// On-disk shape of a module
#[derive(Deserialize)]
struct ModuleDump {
    #[serde(default)]
    name: String,
    #[serde(default)]
    data_layout: Option<String>,
    #[serde(default)]
    functions: Vec<Function>,
}

/// A program unit: functions in declaration order plus the target data layout
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    data_layout: DataLayout,
    functions: Vec<Function>,
    by_name: HashMap<String, FunctionId>,
}

impl Module {
    pub fn new(name: impl Into<String>, data_layout: DataLayout, functions: Vec<Function>) -> Self {
        let mut by_name = HashMap::with_capacity(functions.len());
        for (index, function) in functions.iter().enumerate() {
            if by_name
                .insert(function.name.clone(), FunctionId(index))
                .is_some()
            {
                tracing::warn!("duplicate function name '{}' in module", function.name);
            }
        }

        Self {
            name: name.into(),
            data_layout,
            functions,
            by_name,
        }
    }

    /// Parse a module from its JSON dump
    pub fn from_json_str(content: &str) -> Result<Self> {
        let dump: ModuleDump = serde_json::from_str(content)?;
        let data_layout = match dump.data_layout.as_deref() {
            Some(spec) => DataLayout::parse(spec)?,
            None => DataLayout::default(),
        };
        Ok(Self::new(dump.name, data_layout, dump.functions))
    }

    /// Load a module from a JSON dump on disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MemcheckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_layout(&self) -> &DataLayout {
        &self.data_layout
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Functions with their identities, in declaration order
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(index, function)| (FunctionId(index), function))
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.0)
    }

    /// Resolve a callee name to a function of this module
    ///
    /// With duplicate names the last definition wins, matching the order
    /// in which the index was built.
    pub fn resolve(&self, name: &str) -> Option<FunctionId> {
        self.by_name.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "sample.c",
        "data_layout": "e-p:32:32-i64:64",
        "functions": [
            {
                "name": "main",
                "debug": { "directory": "/work", "filename": "main.c", "line": 1 },
                "blocks": [
                    { "label": "entry", "instructions": [
                        { "op": "load", "ty": "i32" },
                        { "op": "call", "callee": "puts" },
                        { "op": "call" },
                        { "op": "other", "opcode": "ret" }
                    ] },
                    { "label": "exit", "instructions": [
                        { "op": "store", "value_ty": "ptr" }
                    ] }
                ]
            },
            { "name": "puts" }
        ]
    }"#;

    #[test]
    fn test_parse_module_dump() {
        let module = Module::from_json_str(SAMPLE).unwrap();
        assert_eq!(module.name(), "sample.c");
        assert_eq!(module.len(), 2);

        let (id, main) = module.functions().next().unwrap();
        assert_eq!(id, FunctionId(0));
        assert!(!main.is_declaration());
        assert_eq!(main.instructions().count(), 5);
        assert_eq!(main.debug.as_ref().unwrap().line, Some(1));
        assert_eq!(
            main.instructions().nth(2),
            Some(&Instruction::indirect_call())
        );

        let puts = module.function(FunctionId(1)).unwrap();
        assert!(puts.is_declaration());
        assert!(puts.debug.is_none());
    }

    #[test]
    fn test_resolve_by_name() {
        let module = Module::from_json_str(SAMPLE).unwrap();
        assert_eq!(module.resolve("puts"), Some(FunctionId(1)));
        assert_eq!(module.resolve("printf"), None);
    }

    #[test]
    fn test_missing_data_layout_uses_default() {
        let module = Module::from_json_str(r#"{ "functions": [] }"#).unwrap();
        assert!(module.is_empty());
        assert_eq!(module.data_layout(), &DataLayout::default());
    }

    #[test]
    fn test_rejects_unknown_opcode_tag() {
        let json = r#"{ "functions": [ { "name": "f", "blocks": [
            { "instructions": [ { "op": "teleport" } ] } ] } ] }"#;
        assert!(matches!(
            Module::from_json_str(json),
            Err(MemcheckError::ModuleParse(_))
        ));
    }

    #[test]
    fn test_rejects_bad_type_in_load() {
        let json = r#"{ "functions": [ { "name": "f", "blocks": [
            { "instructions": [ { "op": "load", "ty": "i0" } ] } ] } ] }"#;
        assert!(Module::from_json_str(json).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Module::from_json_file("/nonexistent/module.json").unwrap_err();
        assert!(matches!(err, MemcheckError::Io { .. }));
    }
}
