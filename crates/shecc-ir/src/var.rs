//! Variables, per spec §3 "Variable".
//!
//! `base` points at the original source variable for SSA renamings
//! (self, for source variables). The rename stack is transient state
//! used only during SSA construction (§4.D.7) and otherwise empty.

use crate::arena::BlockId;
use crate::interner::Symbol;
use crate::types::TypeId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VarId(pub u32);

#[derive(Clone, Debug)]
pub struct Variable {
    pub type_id: TypeId,
    pub name: Symbol,
    pub ptr_depth: u8,
    pub is_func: bool,
    pub array_size: i32,
    /// Stack offset (locals) or data-section offset (globals), assigned
    /// by the register allocator / globals layout pass.
    pub offset: i32,
    pub init_val: Option<i32>,
    pub is_global: bool,
    pub is_const: bool,
    /// Instruction index of the last use; set by liveness analysis and
    /// consumed by the linear-scan allocator.
    pub liveness: Option<u32>,
    pub in_loop: bool,
    pub consumed: bool,
    /// SSA subscript (e.g. `x` renamed to `x.3`); 0 for the
    /// unrenamed/original variable.
    pub subscript: u32,
    /// Self for source variables; the `VarId` of the original variable
    /// for SSA renamings.
    pub base: VarId,
    pub subscripts: Vec<VarId>,
    /// Blocks that reference this variable, for dominance-frontier-based
    /// phi insertion (§4.D.5's "registers the block as a reference site").
    pub ref_block_list: Vec<BlockId>,
}

impl Variable {
    pub fn new_local(type_id: TypeId, name: Symbol, ptr_depth: u8, array_size: i32) -> Self {
        Self {
            type_id,
            name,
            ptr_depth,
            is_func: false,
            array_size,
            offset: 0,
            init_val: None,
            is_global: false,
            is_const: false,
            liveness: None,
            in_loop: false,
            consumed: false,
            subscript: 0,
            base: VarId(u32::MAX), // patched to self once inserted into an arena
            subscripts: Vec::new(),
            ref_block_list: Vec::new(),
        }
    }

    pub fn is_pointer(&self) -> bool {
        self.ptr_depth > 0
    }

    pub fn is_array(&self) -> bool {
        self.array_size > 0
    }
}
