//! The top-level coverage database.
//!
//! A [`CoverageDb`] owns every functional unit and instance node in play,
//! plus the forest of instance-tree roots (several independent top modules
//! may coexist, and a merge-read temporarily adds the incoming file's roots
//! before pairing them off). All cross-references are arena indices, so
//! merge splicing never touches owned pointers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use covdb_model::{Arena, FunctionalUnit, FunitId, InstId, PointCounts, Statistics};

use crate::instance::Instance;

/// The coverage database: functional-unit store, instance forest, and the
/// run-level summary carried by the INFO record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageDb {
    /// All functional-unit definitions.
    pub funits: Arena<FunitId, FunctionalUnit>,
    /// All instance nodes, linked into trees by index.
    pub insts: Arena<InstId, Instance>,
    /// Roots of the instance forest, in creation order.
    pub roots: Vec<InstId>,
    /// Total simulation events accumulated across merged runs.
    pub sim_events: u64,
    /// Summary flags from the scoring run (opaque to the core).
    pub score_flags: u32,
    /// Coverage-point counts pinned by the first file loaded; later merge
    /// inputs must match them.
    pub points: Option<PointCounts>,
}

impl CoverageDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a functional-unit definition and returns its ID.
    pub fn add_funit(&mut self, funit: FunctionalUnit) -> FunitId {
        self.funits.alloc(funit)
    }

    /// Recomputes all statistics bottom-up.
    ///
    /// Every functional unit's statistics are rebuilt from its item lists,
    /// then each instance's statistics become its own unit's plus the sum
    /// over its children. Placeholder instances contribute known zeros.
    pub fn compute_stats(&mut self) {
        for funit in self.funits.values_mut() {
            funit.compute_stats();
        }
        let roots = self.roots.clone();
        for root in roots {
            self.accumulate_inst(root);
        }
    }

    fn accumulate_inst(&mut self, id: InstId) -> Statistics {
        let mut stat = match self.insts[id].funit {
            Some(f) => self.funits[f].stat.clone(),
            None => Statistics::zero(),
        };
        let children = self.insts[id].children.clone();
        for child in children {
            let child_stat = self.accumulate_inst(child);
            stat.absorb(&child_stat);
        }
        self.insts[id].stat = stat.clone();
        stat
    }

    /// Computes database-wide coverage-point counts per metric.
    ///
    /// Walks the forest so that orphaned definitions (left behind by merge
    /// or flatten) are not counted; a unit shared by several instances is
    /// counted once.
    pub fn point_counts(&self) -> PointCounts {
        let mut counts = PointCounts::default();
        let mut seen: HashSet<FunitId> = HashSet::new();
        for &root in &self.roots {
            self.count_inst(root, &mut counts, &mut seen);
        }
        counts
    }

    fn count_inst(&self, id: InstId, counts: &mut PointCounts, seen: &mut HashSet<FunitId>) {
        if let Some(f) = self.insts[id].funit {
            if seen.insert(f) {
                let funit = &self.funits[f];
                for sig in &funit.signals {
                    match sig.kind {
                        covdb_model::SignalKind::Memory { rows } => counts.memory += u64::from(rows),
                        _ => counts.toggle += u64::from(sig.width),
                    }
                }
                for expr in &funit.exprs {
                    counts.comb += u64::from(expr.combo_total());
                }
                for fsm in &funit.fsms {
                    counts.fsm += u64::from(fsm.table.valid_count());
                }
            }
        }
        for &child in &self.insts[id].children {
            self.count_inst(child, counts, seen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covdb_model::{Expression, ExprKind, FunitKind, Signal};

    fn db_with_two_levels() -> (CoverageDb, InstId, InstId) {
        let mut db = CoverageDb::new();
        let mut top_def = FunctionalUnit::new("top", "top.v", FunitKind::Module);
        top_def.signals.push(Signal::reg("ready", 1, 0));
        let top_def = db.add_funit(top_def);
        let mut leaf_def = FunctionalUnit::new("leaf", "leaf.v", FunitKind::Module);
        leaf_def.exprs.push(Expression::new(3, ExprKind::Or));
        let leaf_def = db.add_funit(leaf_def);

        let top = db.create_instance(Some(top_def), "top", false, None);
        db.roots.push(top);
        let leaf = db.add_child(top, Some(leaf_def), "u0", None, false).unwrap();
        (db, top, leaf)
    }

    #[test]
    fn stats_roll_up_to_root() {
        let (mut db, top, leaf) = db_with_two_levels();
        let leaf_funit = db.insts[leaf].funit.unwrap();
        db.funits[leaf_funit].exprs[0].record_combo(0);
        db.compute_stats();
        assert_eq!(db.insts[leaf].stat.comb_total, Some(3));
        assert_eq!(db.insts[leaf].stat.comb_hit, 1);
        assert_eq!(db.insts[top].stat.comb_total, Some(3));
        assert_eq!(db.insts[top].stat.comb_hit, 1);
        assert_eq!(db.insts[top].stat.tog_total, Some(1));
    }

    #[test]
    fn point_counts_walk_the_forest() {
        let (db, _, _) = db_with_two_levels();
        let counts = db.point_counts();
        assert_eq!(counts.toggle, 1);
        assert_eq!(counts.comb, 3);
        assert_eq!(counts.fsm, 0);
    }

    #[test]
    fn shared_funit_counted_once() {
        let (mut db, top, leaf) = db_with_two_levels();
        let leaf_funit = db.insts[leaf].funit.unwrap();
        db.add_child(top, Some(leaf_funit), "u1", None, false)
            .unwrap();
        let counts = db.point_counts();
        assert_eq!(counts.comb, 3);
    }

    #[test]
    fn orphan_funit_not_counted() {
        let (mut db, _, _) = db_with_two_levels();
        db.add_funit(FunctionalUnit::new("orphan", "o.v", FunitKind::Module));
        let counts = db.point_counts();
        assert_eq!(counts.comb, 3);
        assert_eq!(counts.toggle, 1);
    }

    #[test]
    fn db_serde_roundtrip() {
        let (mut db, top, _) = db_with_two_levels();
        db.compute_stats();
        let json = serde_json::to_string(&db).unwrap();
        let restored: CoverageDb = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.roots, db.roots);
        assert_eq!(restored.insts[top].stat, db.insts[top].stat);
        assert_eq!(restored.funits.len(), db.funits.len());
    }
}
