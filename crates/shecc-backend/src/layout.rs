//! Architecture-independent two-pass layout driver (spec §4.H: "Pass 1
//! computes each instruction's code length ... Pass 2 emits bytes").
//!
//! Every architecture's instructions are a whole number of 4-byte words,
//! so pass 1 only has to count words per logical unit (a phase-2
//! instruction, or a hand-emitted prologue/epilogue/runtime-startup
//! fragment) rather than track variable byte lengths. Once every unit's
//! word count is known, every unit's byte offset is known too, which is
//! all pass 2 needs to resolve a branch or call's relative target.

use rustc_hash::FxHashMap;
use shecc_ir::{BlockId, Context, FuncId, Phase2Instr};

/// One thing the final image needs emitted, in program order. Functions
/// are laid out in arena order after the runtime-startup unit; within a
/// function, blocks follow `bb_list` (RPO) order.
pub(crate) enum Unit {
    RuntimeStart,
    Prologue(FuncId),
    /// `(func, block, instruction index within that block's phase-2 list)`
    Instr(FuncId, BlockId, usize),
    Epilogue(FuncId),
}

/// Byte offsets resolved by pass 1, handed to pass 2 so branches and
/// calls can compute relative (or gp-relative) targets.
pub(crate) struct Layout {
    pub units: Vec<Unit>,
    pub offsets: Vec<u32>,
    pub block_offset: FxHashMap<(FuncId, BlockId), u32>,
    pub func_entry: FxHashMap<FuncId, u32>,
    pub func_exit: FxHashMap<FuncId, u32>,
    pub code_len: u32,
}

pub(crate) trait Backend {
    fn runtime_start_words(&self, ctx: &Context, main: FuncId) -> u32;
    fn prologue_words(&self, ctx: &Context, func: FuncId) -> u32;
    fn epilogue_words(&self) -> u32;
    fn instr_words(&self, ctx: &Context, instr: &Phase2Instr) -> u32;
}

pub(crate) fn build(ctx: &Context, funcs: &[FuncId], main: FuncId, backend: &dyn Backend) -> Layout {
    let mut units = Vec::new();
    units.push(Unit::RuntimeStart);
    for &f in funcs {
        let func = ctx.funcs.get(f);
        for (i, &b) in func.bb_list.iter().enumerate() {
            if i == 0 {
                units.push(Unit::Prologue(f));
            }
            if b == func.exit_bb {
                units.push(Unit::Epilogue(f));
            }
            let n = ctx.blocks.get(b).phase2_instructions.len();
            for k in 0..n {
                units.push(Unit::Instr(f, b, k));
            }
        }
    }

    let mut offsets = Vec::with_capacity(units.len());
    let mut block_offset = FxHashMap::default();
    let mut func_entry = FxHashMap::default();
    let mut func_exit = FxHashMap::default();
    let mut pc: u32 = 0;
    let mut current_block: Option<(FuncId, BlockId)> = None;

    for unit in &units {
        offsets.push(pc);
        let words = match unit {
            Unit::RuntimeStart => backend.runtime_start_words(ctx, main),
            Unit::Prologue(f) => {
                func_entry.insert(*f, pc);
                backend.prologue_words(ctx, *f)
            }
            Unit::Epilogue(f) => {
                func_exit.insert(*f, pc);
                backend.epilogue_words()
            }
            Unit::Instr(f, b, k) => {
                if current_block != Some((*f, *b)) {
                    current_block = Some((*f, *b));
                    block_offset.entry((*f, *b)).or_insert(pc);
                }
                let instr = &ctx.blocks.get(*b).phase2_instructions[*k];
                backend.instr_words(ctx, instr)
            }
        };
        // A function/block's first unit may be the prologue/epilogue
        // rather than its first real instruction; make sure the block's
        // recorded offset always points at the earliest unit, which the
        // loop above already guarantees since Prologue/Epilogue units
        // are pushed before any Instr unit of the same block.
        if let Unit::Prologue(f) = unit {
            let func = ctx.funcs.get(*f);
            block_offset.entry((*f, func.entry_bb)).or_insert(pc);
        }
        if let Unit::Epilogue(f) = unit {
            let func = ctx.funcs.get(*f);
            block_offset.entry((*f, func.exit_bb)).or_insert(pc);
        }
        pc += words * 4;
    }

    Layout {
        units,
        offsets,
        block_offset,
        func_entry,
        func_exit,
        code_len: pc,
    }
}

impl Layout {
    pub fn block_pc(&self, func: FuncId, block: BlockId) -> u32 {
        *self
            .block_offset
            .get(&(func, block))
            .expect("every block reachable from bb_list has a recorded offset")
    }

    pub fn exit_pc(&self, func: FuncId) -> u32 {
        *self.func_exit.get(&func).expect("every function has an epilogue offset")
    }

    pub fn entry_pc(&self, func: FuncId) -> u32 {
        *self.func_entry.get(&func).expect("every function has a prologue offset")
    }
}

/// Find the function whose name is `"main"` — the entry point `__start`
/// calls into once argc/argv are staged. The parser rejects a program
/// with no `main` long before the backend ever runs, so its absence
/// here is an invariant violation rather than a user-facing error.
pub(crate) fn find_main(ctx: &Context, funcs: &[FuncId]) -> FuncId {
    funcs
        .iter()
        .copied()
        .find(|&f| ctx.interner.resolve(ctx.funcs.get(f).name) == "main")
        .expect("a compiled program always has a main function")
}
