//! Integration tests for the full coverage-database lifecycle.
//!
//! These tests exercise the path a real scoring flow takes: build a
//! database the way the elaborator would, record coverage the way the
//! simulator would, issue exclusion IDs, persist to disk, and merge
//! further runs back in from their CDD files.

use std::fs;

use covdb_cdd::{read_file, write_file, CddError};
use covdb_model::{Expression, ExprKind, Fsm, FunctionalUnit, FunitId, FunitKind, InstId, Signal};
use covdb_tree::{CoverageDb, IssueContext};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helper: build a small scored design
// ---------------------------------------------------------------------------

/// Builds `top(ctrl){ u_fsm(fsm_unit) }` where `fsm_unit` carries the 2-bit
/// state machine with legal arcs 0→1, 1→2, 2→0.
fn build_design(db: &mut CoverageDb) -> (InstId, FunitId, FunitId) {
    let mut ctrl = FunctionalUnit::new("ctrl", "ctrl.v", FunitKind::Module);
    ctrl.signals.push(Signal::reg("busy", 1, 0));
    ctrl.exprs.push(Expression::new(21, ExprKind::And));
    let ctrl = db.add_funit(ctrl);

    let mut fsm_unit = FunctionalUnit::new("fsm_unit", "fsm_unit.v", FunitKind::Module);
    fsm_unit.signals.push(Signal::reg("state", 2, 0));
    let mut fsm = Fsm::new(0, 0, 2).unwrap();
    fsm.add_arc(0, 1);
    fsm.add_arc(1, 2);
    fsm.add_arc(2, 0);
    fsm.create_tables();
    fsm_unit.fsms.push(fsm);
    let fsm_unit = db.add_funit(fsm_unit);

    let top = db.create_instance(Some(ctrl), "top", false, None);
    db.roots.push(top);
    db.add_child(top, Some(fsm_unit), "u_fsm", None, false)
        .unwrap();
    (top, ctrl, fsm_unit)
}

// ---------------------------------------------------------------------------
// Lifecycle round trips
// ---------------------------------------------------------------------------

#[test]
fn score_write_read_preserves_coverage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run1.cdd");

    let mut db = CoverageDb::new();
    let (_, ctrl, fsm_unit) = build_design(&mut db);
    db.funits[ctrl].signals[0].record_toggle01(0);
    db.funits[ctrl].exprs[0].record_combo(2);
    db.funits[fsm_unit].fsms[0].observe(0, 1);
    db.sim_events = 5_000;
    let mut ctx = IssueContext::new();
    db.issue_ids(&mut ctx);
    write_file(&db, &path).unwrap();

    let mut back = CoverageDb::new();
    read_file(&mut back, &path).unwrap();
    back.compute_stats();

    assert_eq!(back.roots.len(), 1);
    let top = back.roots[0];
    assert_eq!(back.insts[top].stat.tog01_hit, 1);
    assert_eq!(back.insts[top].stat.comb_hit, 1);
    assert_eq!(back.insts[top].stat.comb_total, Some(3));
    assert_eq!(back.insts[top].stat.arc_total, Some(3));
    assert_eq!(back.insts[top].stat.arc_hit, 1);
    assert_eq!(back.insts[top].stat.state_total, Some(3));
    assert_eq!(back.sim_events, 5_000);

    // Exclusion IDs survive the round trip.
    assert!(back.lookup_signal(1).is_some());
    assert!(back.lookup_expr(1).is_some());
    assert!(back.lookup_fsm_arc(1).is_some());
}

#[test]
fn merging_two_runs_unions_fsm_coverage() {
    let dir = TempDir::new().unwrap();
    let run1 = dir.path().join("run1.cdd");
    let run2 = dir.path().join("run2.cdd");

    // Run 1 sees 0→1 and 1→2.
    let mut db1 = CoverageDb::new();
    let (_, _, fsm_unit) = build_design(&mut db1);
    db1.funits[fsm_unit].fsms[0].observe(0, 1);
    db1.funits[fsm_unit].fsms[0].observe(1, 2);
    db1.sim_events = 100;
    write_file(&db1, &run1).unwrap();

    // Run 2 additionally sees 2→0.
    let mut db2 = CoverageDb::new();
    let (_, _, fsm_unit) = build_design(&mut db2);
    db2.funits[fsm_unit].fsms[0].observe(2, 0);
    db2.sim_events = 50;
    write_file(&db2, &run2).unwrap();

    let mut merged = CoverageDb::new();
    read_file(&mut merged, &run1).unwrap();
    read_file(&mut merged, &run2).unwrap();
    merged.compute_stats();

    assert_eq!(merged.roots.len(), 1, "runs merge into one tree");
    let top = merged.roots[0];
    assert_eq!(merged.insts[top].stat.arc_total, Some(3));
    assert_eq!(merged.insts[top].stat.arc_hit, 3);
    assert_eq!(merged.insts[top].stat.state_hit, 3);
    assert_eq!(merged.sim_events, 150);
}

#[test]
fn merge_is_associative_across_files() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<_> = (0..3).map(|i| dir.path().join(format!("r{i}.cdd"))).collect();

    // Three runs hitting disjoint arcs.
    let arcs = [(0u64, 1u64), (1, 2), (2, 0)];
    for (path, &(from, to)) in paths.iter().zip(arcs.iter()) {
        let mut db = CoverageDb::new();
        let (_, _, fsm_unit) = build_design(&mut db);
        db.funits[fsm_unit].fsms[0].observe(from, to);
        write_file(&db, path).unwrap();
    }

    // (r0 ∪ r1) ∪ r2
    let mut left = CoverageDb::new();
    read_file(&mut left, &paths[0]).unwrap();
    read_file(&mut left, &paths[1]).unwrap();
    read_file(&mut left, &paths[2]).unwrap();
    left.compute_stats();

    // r0 ∪ (r1 ∪ r2): premerge the tail pair into its own file first.
    let premerged = dir.path().join("premerged.cdd");
    let mut tail = CoverageDb::new();
    read_file(&mut tail, &paths[1]).unwrap();
    read_file(&mut tail, &paths[2]).unwrap();
    write_file(&tail, &premerged).unwrap();
    let mut right = CoverageDb::new();
    read_file(&mut right, &paths[0]).unwrap();
    read_file(&mut right, &premerged).unwrap();
    right.compute_stats();

    let stat_l = &left.insts[left.roots[0]].stat;
    let stat_r = &right.insts[right.roots[0]].stat;
    assert_eq!(stat_l, stat_r);
    assert_eq!(stat_l.arc_hit, 3);
}

#[test]
fn hits_are_monotone_across_observe_and_merge() {
    let dir = TempDir::new().unwrap();
    let run = dir.path().join("run.cdd");

    let mut db = CoverageDb::new();
    let (_, _, fsm_unit) = build_design(&mut db);
    db.funits[fsm_unit].fsms[0].observe(0, 1);
    write_file(&db, &run).unwrap();

    // Interleave further observation with merging the old run back in.
    db.funits[fsm_unit].fsms[0].observe(1, 2);
    read_file(&mut db, &run).unwrap();
    db.funits[fsm_unit].fsms[0].observe(2, 0);
    read_file(&mut db, &run).unwrap();
    db.compute_stats();

    let table = &db.funits[fsm_unit].fsms[0].table;
    assert!(table.is_hit(0, 1));
    assert!(table.is_hit(1, 2));
    assert!(table.is_hit(2, 0));
    assert_eq!(db.insts[db.roots[0]].stat.arc_hit, 3);
}

// ---------------------------------------------------------------------------
// Rejection paths
// ---------------------------------------------------------------------------

#[test]
fn incompatible_point_counts_reject_merge_and_preserve_database() {
    let dir = TempDir::new().unwrap();
    let run1 = dir.path().join("run1.cdd");
    let run2 = dir.path().join("run2.cdd");

    let mut db1 = CoverageDb::new();
    build_design(&mut db1);
    write_file(&db1, &run1).unwrap();

    // A differently elaborated design: one extra signal changes the
    // toggle point count.
    let mut db2 = CoverageDb::new();
    let (_, ctrl, _) = build_design(&mut db2);
    db2.funits[ctrl].signals.push(Signal::reg("extra", 4, 0));
    write_file(&db2, &run2).unwrap();

    let mut merged = CoverageDb::new();
    read_file(&mut merged, &run1).unwrap();
    let before_roots = merged.roots.clone();
    let err = read_file(&mut merged, &run2).unwrap_err();
    assert!(matches!(err, CddError::PointCountMismatch));
    // The previously valid forest is untouched.
    assert_eq!(merged.roots, before_roots);
}

#[test]
fn structurally_incompatible_trees_stay_as_separate_roots() {
    let dir = TempDir::new().unwrap();
    let run1 = dir.path().join("run1.cdd");
    let run2 = dir.path().join("run2.cdd");

    let mut db1 = CoverageDb::new();
    build_design(&mut db1);
    write_file(&db1, &run1).unwrap();

    // Same point counts, unrelated hierarchy: 3 toggle bits across two
    // units named nothing like the first design's.
    let mut db2 = CoverageDb::new();
    let mut uart = FunctionalUnit::new("uart", "uart.v", FunitKind::Module);
    uart.signals.push(Signal::reg("tx", 1, 0));
    uart.signals.push(Signal::reg("rx", 2, 0));
    uart.exprs.push(Expression::new(3, ExprKind::And));
    let mut fsm = Fsm::new(1, 1, 2).unwrap();
    fsm.add_arc(0, 1);
    fsm.add_arc(1, 2);
    fsm.add_arc(2, 0);
    fsm.create_tables();
    uart.fsms.push(fsm);
    let uart = db2.add_funit(uart);
    let r2 = db2.create_instance(Some(uart), "uart_i", false, None);
    db2.roots.push(r2);
    write_file(&db2, &run2).unwrap();

    let mut merged = CoverageDb::new();
    read_file(&mut merged, &run1).unwrap();
    read_file(&mut merged, &run2).unwrap();
    assert_eq!(merged.roots.len(), 2, "incompatible trees kept separate");
}

#[test]
fn truncated_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.cdd");
    fs::write(&path, "2 module top top.v top 0\n").unwrap();
    let mut db = CoverageDb::new();
    assert!(read_file(&mut db, &path).is_err());
}
