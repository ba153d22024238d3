//! SSA construction and SCCP (spec §4.D, §4.E): turns a function's raw
//! phase-1 basic-block graph into SSA form — RPO numbering, dominator
//! tree, dominance frontiers, φ-insertion, renaming, φ-unwinding, and
//! liveness — then runs sparse conditional constant propagation and
//! branch folding over the result.
//!
//! Nothing here performs register allocation; that is `shecc-regalloc`'s
//! job, working over the unwound, constant-folded phase-1 IR this crate
//! produces.

mod dominance;
mod globals;
mod liveness;
mod phi;
mod rename;
mod rpo;
mod sccp;
mod unwind;

use shecc_ir::{Context, FuncId};
use tracing::debug;

/// Run every SSA-construction step for one function, in the order spec
/// §4.D lists them, followed by liveness analysis.
pub fn build_ssa(ctx: &mut Context, func: FuncId) {
    let order = rpo::compute(ctx, func);
    debug!(blocks = order.len(), "rpo numbering complete");
    dominance::compute_idoms(ctx, &order);
    dominance::build_dominator_tree(ctx, &order);
    dominance::compute_dominance_frontiers(ctx, &order);
    let globals = globals::analyze(ctx, &order);
    debug!(globals = globals.global_vars.len(), "global-variable pass complete");
    phi::insert(ctx, func, &globals);
    rename::rename(ctx, func, &order);
    unwind::unwind_phis(ctx, &order);
    liveness::analyze(ctx, &order);
}

/// Run SCCP-style constant/branch folding to fixpoint (spec §4.E).
pub fn run_sccp(ctx: &mut Context, func: FuncId) {
    sccp::run(ctx, func);
}
