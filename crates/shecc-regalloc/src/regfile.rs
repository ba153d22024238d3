//! The register file a basic block is allocated against (spec §3
//! "Register file": `{current_var?, polluted_flag}` per register,
//! sized to `NUM_REGISTERS`). A fresh file is used per block — the
//! allocator never carries a register binding across a control-flow
//! edge, only a memory one (spec §4.F: every polluted register is
//! spilled before `branch`/`jump`/`call`/`indirect` so a successor
//! block can only ever rely on memory, not on which physical register
//! held what).

use shecc_ir::{Context, VarId, NUM_REGISTERS};

#[derive(Clone, Copy)]
pub(crate) struct Occupant {
    pub var: VarId,
    pub polluted: bool,
    /// Set for a register a pending call's argument sequence has
    /// claimed (spec §4.F "Calls"): exempt from `expire`'s liveness
    /// check and from `farthest`'s eviction pool, since nothing but the
    /// `Call`/`Indirect` that follows is allowed to touch it. Cleared
    /// by `invalidate_all`.
    pub pinned: bool,
}

pub(crate) struct RegisterFile {
    regs: Vec<Option<Occupant>>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self { regs: vec![None; NUM_REGISTERS] }
    }

    pub fn find_holding(&self, var: VarId) -> Option<u8> {
        self.regs
            .iter()
            .position(|o| matches!(o, Some(o) if o.var == var))
            .map(|i| i as u8)
    }

    pub fn find_free(&self) -> Option<u8> {
        self.regs.iter().position(Option::is_none).map(|i| i as u8)
    }

    pub fn occupant(&self, reg: u8) -> Option<Occupant> {
        self.regs[reg as usize]
    }

    pub fn bind(&mut self, reg: u8, var: VarId, polluted: bool) {
        self.regs[reg as usize] = Some(Occupant { var, polluted, pinned: false });
    }

    /// Binds `var` into `reg` as an in-flight call argument, protected
    /// from eviction/expiry until the call consumes it.
    pub fn bind_pinned(&mut self, reg: u8, var: VarId) {
        self.regs[reg as usize] = Some(Occupant { var, polluted: false, pinned: true });
    }

    pub fn clear(&mut self, reg: u8) {
        self.regs[reg as usize] = None;
    }

    pub fn invalidate_all(&mut self) {
        for slot in &mut self.regs {
            *slot = None;
        }
    }

    /// Drop every register whose occupant's last use already lies
    /// behind `idx` — no write-back, since nothing downstream can
    /// possibly read the value again.
    pub fn expire(&mut self, ctx: &Context, idx: u32) {
        for slot in &mut self.regs {
            if let Some(o) = slot {
                if !o.pinned && ctx.var(o.var).liveness.map_or(true, |l| l < idx) {
                    *slot = None;
                }
            }
        }
    }

    /// The occupied, unpinned register whose occupant's last-use index
    /// is farthest away — the "spill the value needed soonest-to-never"
    /// policy, using the precomputed last-use index as the next-use
    /// distance (an occupant already past its last use would have been
    /// dropped by `expire`, so every candidate here still has a real
    /// future use or none at all, which sorts last). Pinned registers —
    /// a pending call's already-bound argument registers — are never
    /// eviction candidates.
    pub fn farthest(&self, ctx: &Context) -> u8 {
        self.regs
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.filter(|o| !o.pinned).map(|o| (i as u8, o)))
            .max_by_key(|(_, o)| ctx.var(o.var).liveness.unwrap_or(u32::MAX))
            .map(|(i, _)| i)
            .expect("spill is only requested when every register is occupied")
    }

    pub fn all_occupied(&self) -> impl Iterator<Item = (u8, Occupant)> + '_ {
        self.regs.iter().enumerate().filter_map(|(i, o)| o.map(|o| (i as u8, o)))
    }
}
