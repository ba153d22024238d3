//! Arenas of stable indices for the cyclic basic-block / dominator-tree
//! graphs (§9 "Cyclic graphs"): blocks and functions are owned by flat
//! `Vec`s and referenced by newtype indices, never by owning pointer.

use crate::phase1::{BasicBlock, Function};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BlockId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FuncId(pub u32);

#[derive(Default)]
pub struct BlockArena {
    blocks: Vec<BasicBlock>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, block: BasicBlock) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    pub fn get(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    /// Fetch two distinct blocks mutably at once, needed when wiring an
    /// edge between a predecessor and its successor.
    pub fn get2_mut(&mut self, a: BlockId, b: BlockId) -> (&mut BasicBlock, &mut BasicBlock) {
        assert_ne!(a.0, b.0, "get2_mut requires distinct ids");
        let (lo, hi) = if a.0 < b.0 { (a.0, b.0) } else { (b.0, a.0) };
        let (left, right) = self.blocks.split_at_mut(hi as usize);
        let lo_ref = &mut left[lo as usize];
        let hi_ref = &mut right[0];
        if a.0 < b.0 {
            (lo_ref, hi_ref)
        } else {
            (hi_ref, lo_ref)
        }
    }
}

#[derive(Default)]
pub struct FuncArena {
    funcs: Vec<Function>,
}

impl FuncArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, func: Function) -> FuncId {
        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(func);
        id
    }

    pub fn get(&self, id: FuncId) -> &Function {
        &self.funcs[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.funcs[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        self.funcs
            .iter()
            .enumerate()
            .map(|(i, f)| (FuncId(i as u32), f))
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}
