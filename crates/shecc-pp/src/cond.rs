//! Conditional-inclusion stack for `#if`/`#ifdef`/`#ifndef`/`#elif`/
//! `#else`/`#endif` (spec §4.B "Conditional inclusion").
//!
//! Skip-scanning is implicit: the main expansion loop in `lib.rs` simply
//! drops every non-directive token while [`currently_active`] is false,
//! rather than running a separate scanner pass.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CondCtx {
    IfThen,
    ElifThen,
    ElseThen,
}

pub struct CondFrame {
    pub ctx: CondCtx,
    /// Whether this frame's current branch is included, considering
    /// both its own condition and every enclosing frame's.
    pub included: bool,
    /// Whether any branch of this `#if`/`#elif*`/`#else` chain has been
    /// taken yet, so a later `#elif`/`#else` can short-circuit.
    pub taken_any: bool,
}

/// True if every frame on the stack currently admits its body, i.e. the
/// innermost active branch is in effect.
pub fn currently_active(stack: &[CondFrame]) -> bool {
    stack.iter().all(|f| f.included)
}

/// Whether the frame enclosing the top of `stack` is active — used when
/// evaluating a new `#elif`/`#else` condition, which must not fire at
/// all if an outer conditional has already excluded this region.
pub fn parent_active(stack: &[CondFrame]) -> bool {
    stack[..stack.len().saturating_sub(1)]
        .iter()
        .all(|f| f.included)
}
