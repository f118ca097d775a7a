//! CDD emission.
//!
//! Writes one record per line in a pre-order walk of the instance forest,
//! so every parent scope exists before any record that references it. Each
//! populated instance gets a functional-unit header followed by its item
//! records; placeholders get instance-only records.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use covdb_common::scope;
use covdb_model::InstId;
use covdb_tree::CoverageDb;

use crate::record::{
    InfoRecord, CDD_VERSION, REC_EXPRESSION, REC_FSM, REC_FUNIT, REC_INFO, REC_INST_ONLY,
    REC_SIGNAL,
};

/// Writes the whole database as a CDD stream.
pub fn write<W: Write>(db: &CoverageDb, out: &mut W) -> io::Result<()> {
    let info = InfoRecord {
        version: CDD_VERSION,
        flags: db.score_flags,
        sim_events: db.sim_events,
        points: db.points.unwrap_or_else(|| db.point_counts()),
    };
    writeln!(out, "{REC_INFO} {}", info.format())?;

    for &root in &db.roots {
        let root_scope = db.insts[root].name.clone();
        write_inst(db, out, root, &root_scope)?;
    }
    Ok(())
}

/// Writes the database to a file path.
pub fn write_file(db: &CoverageDb, path: impl AsRef<Path>) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write(db, &mut out)?;
    out.flush()
}

fn write_inst<W: Write>(db: &CoverageDb, out: &mut W, id: InstId, path: &str) -> io::Result<()> {
    let node = &db.insts[id];
    match node.funit {
        Some(f) => {
            let funit = &db.funits[f];
            writeln!(
                out,
                "{REC_FUNIT} {} {} {} {} {}",
                funit.kind.tag(),
                funit.name,
                funit.filename,
                path,
                u8::from(node.name_diff)
            )?;
            for sig in &funit.signals {
                writeln!(
                    out,
                    "{REC_SIGNAL} {} {} {} {} {} {} {} {} {} {}",
                    sig.name,
                    sig.kind.tag(),
                    sig.width,
                    sig.lsb,
                    sig.kind.rows(),
                    sig.excl_id,
                    sig.tog01.to_hex(),
                    sig.tog10.to_hex(),
                    sig.mem_wr.to_hex(),
                    sig.mem_rd.to_hex()
                )?;
            }
            for expr in &funit.exprs {
                writeln!(
                    out,
                    "{REC_EXPRESSION} {} {} {} {}",
                    expr.excl_id,
                    expr.line,
                    expr.kind.tag(),
                    expr.combo_hit.to_hex()
                )?;
            }
            for fsm in &funit.fsms {
                writeln!(
                    out,
                    "{REC_FSM} {} {} {} {} {} {}",
                    funit.signals[fsm.from_sig].name,
                    funit.signals[fsm.to_sig].name,
                    fsm.table.width(),
                    fsm.table.hit_plane().to_hex(),
                    fsm.table.valid_plane().to_hex(),
                    fsm.table.arc_id_base()
                )?;
            }
        }
        None => {
            writeln!(out, "{REC_INST_ONLY} {} {}", path, u8::from(node.name_diff))?;
        }
    }

    for &child in &node.children {
        let child_path = scope::join(path, &db.insts[child].name);
        write_inst(db, out, child, &child_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use covdb_model::{Fsm, FunctionalUnit, FunitKind, Signal};

    #[test]
    fn records_emitted_in_preorder() {
        let mut db = CoverageDb::new();
        let mut top_def = FunctionalUnit::new("top", "top.v", FunitKind::Module);
        top_def.signals.push(Signal::reg("state", 2, 0));
        let mut fsm = Fsm::new(0, 0, 2).unwrap();
        fsm.add_arc(0, 1);
        fsm.create_tables();
        top_def.fsms.push(fsm);
        let top_def = db.add_funit(top_def);
        let top = db.create_instance(Some(top_def), "top", false, None);
        db.roots.push(top);
        db.add_child(top, None, "hole", None, false).unwrap();

        let mut buf = Vec::new();
        write(&db, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("1 14 0 0 "));
        assert!(lines[1].starts_with("2 module top top.v top 0"));
        assert!(lines[2].starts_with("3 state reg 2 0 0 0 "));
        assert!(lines[3].starts_with("5 state state 2 "));
        assert_eq!(lines[4], "6 top.hole 0");
    }

    #[test]
    fn placeholder_root_writes_instance_only() {
        let mut db = CoverageDb::new();
        let root = db.create_instance(None, "bench", true, None);
        db.roots.push(root);
        let mut buf = Vec::new();
        write(&db, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().any(|l| l == "6 bench 1"));
    }
}
