//! Exclusion-ID reverse lookup.
//!
//! An external exclusion command references one coverage item by its flat
//! numeric ID. Because IDs are issued in a single pre-order pass, each
//! functional unit's item lists cover a contiguous ID range, so the search
//! tests range containment at each node in O(1) and only descends when the
//! ID cannot live in that unit. A miss anywhere is a normal `None` result
//! treated by callers as a no-op exclusion request.

use covdb_model::{FunitId, InstId};

use crate::db::CoverageDb;

impl CoverageDb {
    /// Finds the signal carrying the given exclusion ID within a tree.
    ///
    /// Returns the owning functional unit and the signal's index in its
    /// list.
    pub fn find_signal_by_id(&self, root: InstId, id: u32) -> Option<(FunitId, usize)> {
        let node = &self.insts[root];
        if let Some(f) = node.funit {
            if let Some((first, last)) = self.funits[f].signal_id_range() {
                if id >= first && id <= last {
                    let index = self.funits[f].signals.iter().position(|s| s.excl_id == id)?;
                    return Some((f, index));
                }
            }
        }
        node.children
            .iter()
            .find_map(|&child| self.find_signal_by_id(child, id))
    }

    /// Finds the expression carrying the given exclusion ID within a tree.
    pub fn find_expr_by_id(&self, root: InstId, id: u32) -> Option<(FunitId, usize)> {
        let node = &self.insts[root];
        if let Some(f) = node.funit {
            if let Some((first, last)) = self.funits[f].expr_id_range() {
                if id >= first && id <= last {
                    let index = self.funits[f].exprs.iter().position(|e| e.excl_id == id)?;
                    return Some((f, index));
                }
            }
        }
        node.children
            .iter()
            .find_map(|&child| self.find_expr_by_id(child, id))
    }

    /// Finds the FSM arc carrying the given exclusion ID within a tree.
    ///
    /// Returns the owning functional unit, the FSM's index in its list, and
    /// the arc's index among the table's valid transitions.
    pub fn find_fsm_arc_by_id(&self, root: InstId, id: u32) -> Option<(FunitId, usize, u32)> {
        let node = &self.insts[root];
        if let Some(f) = node.funit {
            for (fsm_index, fsm) in self.funits[f].fsms.iter().enumerate() {
                if let Some(arc_index) = fsm.table.find_arc_by_id(id) {
                    return Some((f, fsm_index, arc_index));
                }
            }
        }
        node.children
            .iter()
            .find_map(|&child| self.find_fsm_arc_by_id(child, id))
    }

    /// Searches every tree in the forest for a signal by exclusion ID.
    pub fn lookup_signal(&self, id: u32) -> Option<(FunitId, usize)> {
        self.roots
            .iter()
            .find_map(|&root| self.find_signal_by_id(root, id))
    }

    /// Searches every tree in the forest for an expression by exclusion ID.
    pub fn lookup_expr(&self, id: u32) -> Option<(FunitId, usize)> {
        self.roots
            .iter()
            .find_map(|&root| self.find_expr_by_id(root, id))
    }

    /// Searches every tree in the forest for an FSM arc by exclusion ID.
    pub fn lookup_fsm_arc(&self, id: u32) -> Option<(FunitId, usize, u32)> {
        self.roots
            .iter()
            .find_map(|&root| self.find_fsm_arc_by_id(root, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueContext;
    use covdb_model::{Expression, ExprKind, Fsm, FunctionalUnit, FunitKind, Signal};

    /// top(2 signals, 1 expr) → u0: leaf(1 signal, 2 exprs, 1 fsm)
    fn issued_db() -> (CoverageDb, InstId) {
        let mut db = CoverageDb::new();
        let mut top_def = FunctionalUnit::new("top", "top.v", FunitKind::Module);
        top_def.signals.push(Signal::reg("a", 1, 0));
        top_def.signals.push(Signal::reg("b", 1, 0));
        top_def.exprs.push(Expression::new(4, ExprKind::And));
        let top_def = db.add_funit(top_def);

        let mut leaf_def = FunctionalUnit::new("leaf", "leaf.v", FunitKind::Module);
        leaf_def.signals.push(Signal::reg("state", 2, 0));
        leaf_def.exprs.push(Expression::new(8, ExprKind::Or));
        leaf_def.exprs.push(Expression::new(9, ExprKind::Unary));
        let mut fsm = Fsm::new(0, 0, 2).unwrap();
        fsm.add_arc(0, 1);
        fsm.add_arc(1, 0);
        fsm.create_tables();
        leaf_def.fsms.push(fsm);
        let leaf_def = db.add_funit(leaf_def);

        let top = db.create_instance(Some(top_def), "top", false, None);
        db.roots.push(top);
        db.add_child(top, Some(leaf_def), "u0", None, false).unwrap();

        let mut ctx = IssueContext::new();
        db.issue_ids(&mut ctx);
        (db, top)
    }

    #[test]
    fn every_issued_signal_id_has_a_unique_owner() {
        let (db, top) = issued_db();
        // Signals: top.a=1, top.b=2, leaf.state=3.
        for id in 1..=3 {
            let (funit, index) = db.find_signal_by_id(top, id).expect("issued id resolves");
            assert_eq!(db.funits[funit].signals[index].excl_id, id);
        }
        assert_eq!(db.find_signal_by_id(top, 4), None);
        assert_eq!(db.find_signal_by_id(top, 0), None);
    }

    #[test]
    fn expression_lookup_descends_on_containment_failure() {
        let (db, top) = issued_db();
        // Expressions: top=1, leaf=2..3.
        let (owner1, _) = db.find_expr_by_id(top, 1).unwrap();
        let (owner3, index3) = db.find_expr_by_id(top, 3).unwrap();
        assert_ne!(owner1, owner3);
        assert_eq!(db.funits[owner3].exprs[index3].excl_id, 3);
    }

    #[test]
    fn id_ranges_never_interleave() {
        let (db, _) = issued_db();
        let ranges: Vec<(u32, u32)> = db
            .funits
            .values()
            .filter_map(|f| f.signal_id_range())
            .collect();
        for (i, &(lo_a, hi_a)) in ranges.iter().enumerate() {
            for &(lo_b, hi_b) in ranges.iter().skip(i + 1) {
                assert!(hi_a < lo_b || hi_b < lo_a, "ranges overlap");
            }
        }
    }

    #[test]
    fn fsm_arc_lookup_delegates_to_tables() {
        let (db, top) = issued_db();
        // Two valid arcs issued as IDs 1 and 2.
        let (funit, fsm_index, arc0) = db.find_fsm_arc_by_id(top, 1).unwrap();
        assert_eq!(fsm_index, 0);
        assert_eq!(arc0, 0);
        let (_, _, arc1) = db.find_fsm_arc_by_id(top, 2).unwrap();
        assert_eq!(arc1, 1);
        assert_eq!(db.find_fsm_arc_by_id(top, 3), None);
        assert_eq!(db.funits[funit].name, "leaf");
    }

    #[test]
    fn forest_wide_lookup() {
        let (mut db, _) = issued_db();
        let lone_def = db.add_funit(FunctionalUnit::new("lone", "l.v", FunitKind::Module));
        let lone = db.create_instance(Some(lone_def), "lone_i", false, None);
        db.roots.push(lone);
        assert!(db.lookup_signal(2).is_some());
        assert!(db.lookup_expr(2).is_some());
        assert!(db.lookup_fsm_arc(99).is_none());
    }
}
