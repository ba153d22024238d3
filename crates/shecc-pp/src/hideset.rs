//! Hide sets, per spec §4.B "Macro expansion safety": each token
//! carries the set of macro names already expanded on the path that
//! produced it, so self-referential expansion terminates instead of
//! looping.
//!
//! Implemented as a persistent singly-linked list behind `Rc` rather
//! than a `HashSet` per token: most tokens carry an empty or
//! one-element hide-set, and structural sharing keeps `union` cheap
//! when two branches of a nested expansion merge.

use std::rc::Rc;

use shecc_ir::Symbol;

#[derive(Clone, Debug, Default)]
pub struct HideSet(Option<Rc<Node>>);

#[derive(Debug)]
struct Node {
    sym: Symbol,
    next: Option<Rc<Node>>,
}

impl HideSet {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn contains(&self, sym: Symbol) -> bool {
        let mut cur = self.0.as_ref();
        while let Some(node) = cur {
            if node.sym == sym {
                return true;
            }
            cur = node.next.as_ref();
        }
        false
    }

    pub fn insert(&self, sym: Symbol) -> Self {
        if self.contains(sym) {
            return self.clone();
        }
        Self(Some(Rc::new(Node {
            sym,
            next: self.0.clone(),
        })))
    }

    /// The intersection of two hide-sets, used when an argument token
    /// (hidden by the call site) is substituted into a macro body
    /// (hidden by the macro's own expansion) — the result must carry
    /// only names hidden on both paths, matching the classic
    /// Dave Prosser algorithm.
    pub fn union(&self, other: &HideSet) -> Self {
        let mut out = self.clone();
        let mut cur = other.0.as_ref();
        while let Some(node) = cur {
            out = out.insert(node.sym);
            cur = node.next.as_ref();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shecc_ir::Interner;

    #[test]
    fn insert_and_contains() {
        let mut interner = Interner::new();
        let a = interner.intern("FOO");
        let b = interner.intern("BAR");
        let hs = HideSet::empty().insert(a);
        assert!(hs.contains(a));
        assert!(!hs.contains(b));
        let hs2 = hs.union(&HideSet::empty().insert(b));
        assert!(hs2.contains(a) && hs2.contains(b));
    }
}
