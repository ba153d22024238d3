//! The explicit `Context` that replaces the original implementation's
//! module-level global arrays (§9 "Global state"): arenas, interner,
//! functions, blocks, macros, and options all live here and are passed
//! into every phase. No singleton is required.

use rustc_hash::FxHashMap;

use crate::arena::{BlockArena, BlockId, FuncArena, FuncId};
use crate::interner::{Interner, Symbol};
use crate::macros::MacroDef;
use crate::types::TypeTable;
use crate::var::{VarId, Variable};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Target {
    Arm,
    RiscV32,
}

#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub target: Target,
    pub output_path: std::path::PathBuf,
    pub dump_ir: bool,
    pub include_libc: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: Target::Arm,
            output_path: std::path::PathBuf::from("a.out"),
            dump_ir: false,
            include_libc: true,
        }
    }
}

#[derive(Default)]
pub struct Context {
    pub interner: Interner,
    pub blocks: BlockArena,
    pub funcs: FuncArena,
    pub types: TypeTable,
    pub macros: FxHashMap<Symbol, MacroDef>,
    pub options: CompileOptions,
    variables: Vec<Variable>,
    pub globals: Vec<VarId>,
    pub data_section: Vec<u8>,
    /// Files already consumed under `#pragma once`.
    pub pragma_once_files: rustc_hash::FxHashSet<Symbol>,
}

impl Context {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn alloc_var(&mut self, mut var: Variable) -> VarId {
        let id = VarId(self.variables.len() as u32);
        if var.base.0 == u32::MAX {
            var.base = id;
        }
        self.variables.push(var);
        id
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.variables[id.0 as usize]
    }

    /// Create a new SSA renaming of `base`, owned (per §3 lifecycles) by
    /// whichever block hosts the defining instruction; the caller is
    /// responsible for appending the returned id to that block's
    /// `symbol_list`.
    pub fn rename_var(&mut self, base: VarId, subscript: u32) -> VarId {
        let mut renamed = self.var(base).clone();
        renamed.base = base;
        renamed.subscript = subscript;
        renamed.subscripts.clear();
        let id = VarId(self.variables.len() as u32);
        self.variables.push(renamed);
        self.var_mut(base).subscripts.push(id);
        id
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    pub fn block_ids_of(&self, func: FuncId) -> Vec<BlockId> {
        self.funcs.get(func).bb_list.clone()
    }
}
