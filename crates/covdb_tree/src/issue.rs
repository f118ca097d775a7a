//! Exclusion-ID issuance.
//!
//! IDs are handed out in one pre-order traversal of the instance forest.
//! The issuance state is an explicit context threaded through the walk
//! rather than ambient global counters, which preserves the invariant the
//! exclusion index relies on: each functional unit's item IDs form a
//! contiguous range that never interleaves with another unit's.

use std::collections::HashSet;

use covdb_model::{FunitId, InstId};

use crate::db::CoverageDb;

/// Issuance state for one pre-order pass.
///
/// Each coverage-item kind draws from its own counter, all starting at 1
/// (zero is reserved to mean "unissued").
#[derive(Debug)]
pub struct IssueContext {
    next_signal: u32,
    next_expr: u32,
    next_arc: u32,
    issued: HashSet<FunitId>,
}

impl IssueContext {
    /// Creates a fresh context; the first ID of every kind is 1.
    pub fn new() -> Self {
        Self {
            next_signal: 1,
            next_expr: 1,
            next_arc: 1,
            issued: HashSet::new(),
        }
    }

    /// The highest signal ID issued so far, zero if none.
    pub fn last_signal_id(&self) -> u32 {
        self.next_signal - 1
    }

    /// The highest expression ID issued so far, zero if none.
    pub fn last_expr_id(&self) -> u32 {
        self.next_expr - 1
    }

    /// The highest FSM-arc ID issued so far, zero if none.
    pub fn last_arc_id(&self) -> u32 {
        self.next_arc - 1
    }
}

impl Default for IssueContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageDb {
    /// Issues exclusion IDs across the whole forest in pre-order.
    ///
    /// A functional unit shared by several instances is issued at its first
    /// placement only.
    pub fn issue_ids(&mut self, ctx: &mut IssueContext) {
        let roots = self.roots.clone();
        for root in roots {
            self.issue_inst(root, ctx);
        }
    }

    fn issue_inst(&mut self, id: InstId, ctx: &mut IssueContext) {
        if let Some(f) = self.insts[id].funit {
            if ctx.issued.insert(f) {
                let funit = &mut self.funits[f];
                for sig in &mut funit.signals {
                    sig.excl_id = ctx.next_signal;
                    ctx.next_signal += 1;
                }
                for expr in &mut funit.exprs {
                    expr.excl_id = ctx.next_expr;
                    ctx.next_expr += 1;
                }
                for fsm in &mut funit.fsms {
                    ctx.next_arc = fsm.table.issue_arc_ids(ctx.next_arc);
                }
            }
        }
        let children = self.insts[id].children.clone();
        for child in children {
            self.issue_inst(child, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covdb_model::{Expression, ExprKind, FunctionalUnit, FunitKind, Signal};

    #[test]
    fn preorder_issuance_is_contiguous_per_unit() {
        let mut db = CoverageDb::new();
        let mut a = FunctionalUnit::new("a", "a.v", FunitKind::Module);
        a.signals.push(Signal::reg("x", 1, 0));
        a.signals.push(Signal::reg("y", 1, 0));
        let a = db.add_funit(a);
        let mut b = FunctionalUnit::new("b", "b.v", FunitKind::Module);
        b.signals.push(Signal::reg("z", 1, 0));
        b.exprs.push(Expression::new(1, ExprKind::And));
        let b = db.add_funit(b);

        let top = db.create_instance(Some(a), "top", false, None);
        db.roots.push(top);
        db.add_child(top, Some(b), "u0", None, false).unwrap();

        let mut ctx = IssueContext::new();
        db.issue_ids(&mut ctx);

        assert_eq!(db.funits[a].signal_id_range(), Some((1, 2)));
        assert_eq!(db.funits[b].signal_id_range(), Some((3, 3)));
        assert_eq!(db.funits[b].expr_id_range(), Some((1, 1)));
        assert_eq!(ctx.last_signal_id(), 3);
        assert_eq!(ctx.last_expr_id(), 1);
        assert_eq!(ctx.last_arc_id(), 0);
    }

    #[test]
    fn shared_unit_issued_once() {
        let mut db = CoverageDb::new();
        let mut leaf = FunctionalUnit::new("leaf", "l.v", FunitKind::Module);
        leaf.signals.push(Signal::reg("q", 1, 0));
        let leaf = db.add_funit(leaf);
        let top_def = db.add_funit(FunctionalUnit::new("top", "t.v", FunitKind::Module));

        let top = db.create_instance(Some(top_def), "top", false, None);
        db.roots.push(top);
        db.add_child(top, Some(leaf), "u0", None, false).unwrap();
        db.add_child(top, Some(leaf), "u1", None, false).unwrap();

        let mut ctx = IssueContext::new();
        db.issue_ids(&mut ctx);
        assert_eq!(db.funits[leaf].signal_id_range(), Some((1, 1)));
        assert_eq!(ctx.last_signal_id(), 1);
    }

    #[test]
    fn forest_roots_issued_in_order() {
        let mut db = CoverageDb::new();
        let mut a = FunctionalUnit::new("a", "a.v", FunitKind::Module);
        a.signals.push(Signal::reg("x", 1, 0));
        let a = db.add_funit(a);
        let mut b = FunctionalUnit::new("b", "b.v", FunitKind::Module);
        b.signals.push(Signal::reg("y", 1, 0));
        let b = db.add_funit(b);

        let r1 = db.create_instance(Some(a), "top1", false, None);
        let r2 = db.create_instance(Some(b), "top2", false, None);
        db.roots.push(r1);
        db.roots.push(r2);

        let mut ctx = IssueContext::new();
        db.issue_ids(&mut ctx);
        assert_eq!(db.funits[a].signal_id_range(), Some((1, 1)));
        assert_eq!(db.funits[b].signal_id_range(), Some((2, 2)));
    }
}
