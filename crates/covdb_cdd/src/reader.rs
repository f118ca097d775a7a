//! CDD parsing.
//!
//! Reads one record per line into a [`CoverageDb`]. The first file loads
//! into an empty database; reading a further file is a merge: the incoming
//! records build fresh forest roots, the INFO record's coverage-point
//! counts are checked against the database's, and the new roots are then
//! paired off against the existing trees. A fatal error unwinds the whole
//! read — callers discard the in-progress result rather than resuming.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use covdb_common::{scope, BitSet};
use covdb_model::{
    ArcTable, ExprKind, Expression, Fsm, FunctionalUnit, FunitId, FunitKind, InstId, Signal,
    SignalKind,
};
use covdb_tree::{CoverageDb, TreeError};

use crate::error::CddError;
use crate::record::{
    InfoRecord, CDD_VERSION, REC_EXPRESSION, REC_FSM, REC_FUNIT, REC_INFO, REC_INST_ONLY,
    REC_SIGNAL,
};

/// Reads a CDD stream into the database.
///
/// When the database already holds trees, the stream is treated as a merge
/// input; otherwise it becomes the initial load.
pub fn read<R: BufRead>(db: &mut CoverageDb, reader: R) -> Result<(), CddError> {
    let had_roots = !db.roots.is_empty();
    let mut file_roots: Vec<InstId> = Vec::new();
    let mut curr_funit: Option<FunitId> = None;
    let mut saw_info = false;
    let mut line_num = 0usize;

    for line_result in reader.lines() {
        let line = line_result?;
        line_num += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let code: u32 = fields[0]
            .parse()
            .map_err(|_| CddError::parse(line_num, "missing record type code"))?;

        match code {
            REC_INFO => {
                let info = InfoRecord::parse(&fields[1..])
                    .ok_or_else(|| CddError::parse(line_num, "malformed INFO record"))?;
                if info.version != CDD_VERSION {
                    return Err(CddError::VersionMismatch {
                        found: info.version,
                        expected: CDD_VERSION,
                    });
                }
                match db.points {
                    Some(points) if points != info.points => {
                        return Err(CddError::PointCountMismatch);
                    }
                    _ => db.points = Some(info.points),
                }
                db.sim_events += info.sim_events;
                db.score_flags |= info.flags;
                saw_info = true;
            }
            REC_FUNIT => {
                if fields.len() != 6 {
                    return Err(CddError::parse(line_num, "malformed functional-unit record"));
                }
                let kind = FunitKind::from_tag(fields[1])
                    .ok_or_else(|| CddError::parse(line_num, "unknown functional-unit kind"))?;
                let name_diff = fields[5] == "1";
                let funit = db.add_funit(FunctionalUnit::new(fields[2], fields[3], kind));
                attach(db, &mut file_roots, fields[4], Some(funit), name_diff)?;
                curr_funit = Some(funit);
            }
            REC_SIGNAL => {
                let funit = curr_funit.ok_or_else(|| {
                    CddError::parse(line_num, "signal record outside a functional unit")
                })?;
                let sig = parse_signal(&fields[1..], line_num)?;
                db.funits[funit].signals.push(sig);
            }
            REC_EXPRESSION => {
                let funit = curr_funit.ok_or_else(|| {
                    CddError::parse(line_num, "expression record outside a functional unit")
                })?;
                let expr = parse_expression(&fields[1..], line_num)?;
                db.funits[funit].exprs.push(expr);
            }
            REC_FSM => {
                let funit = curr_funit.ok_or_else(|| {
                    CddError::parse(line_num, "FSM record outside a functional unit")
                })?;
                let fsm = parse_fsm(db, funit, &fields[1..], line_num)?;
                db.funits[funit].fsms.push(fsm);
            }
            REC_INST_ONLY => {
                if fields.len() != 3 {
                    return Err(CddError::parse(line_num, "malformed instance-only record"));
                }
                let name_diff = fields[2] == "1";
                attach(db, &mut file_roots, fields[1], None, name_diff)?;
            }
            other => {
                return Err(CddError::parse(
                    line_num,
                    format!("unknown record type {other}"),
                ));
            }
        }
    }

    if !saw_info {
        return Err(CddError::Format("missing INFO record".to_string()));
    }

    debug!(
        lines = line_num,
        roots = file_roots.len(),
        merge = had_roots,
        "CDD read complete"
    );

    if had_roots {
        db.merge_forest(file_roots)?;
    } else {
        db.roots.extend(file_roots);
    }
    Ok(())
}

/// Reads a CDD file into the database.
pub fn read_file(db: &mut CoverageDb, path: impl AsRef<Path>) -> Result<(), CddError> {
    let reader = BufReader::new(File::open(path)?);
    read(db, reader)
}

/// Places an instance at the scope a record names.
///
/// A single-component scope becomes a new root of the incoming file's
/// forest; otherwise the parent must already exist in one of the file's
/// trees — records are written pre-order, so a missing parent is fatal
/// corruption.
fn attach(
    db: &mut CoverageDb,
    file_roots: &mut Vec<InstId>,
    path: &str,
    funit: Option<FunitId>,
    name_diff: bool,
) -> Result<InstId, CddError> {
    let (parent_scope, leaf) = scope::split_back(path);
    if parent_scope.is_empty() {
        let root = db.create_instance(funit, leaf, name_diff, None);
        file_roots.push(root);
        return Ok(root);
    }
    for &root in file_roots.iter() {
        if db.find_scope(root, parent_scope, true).is_some() {
            return Ok(db.read_add(root, parent_scope, funit, leaf, name_diff)?);
        }
    }
    Err(CddError::Tree(TreeError::ParentNotFound {
        scope: parent_scope.to_string(),
    }))
}

fn parse_signal(fields: &[&str], line: usize) -> Result<Signal, CddError> {
    let bad = || CddError::parse(line, "malformed signal record");
    if fields.len() != 10 {
        return Err(bad());
    }
    let width: u32 = fields[2].parse().map_err(|_| bad())?;
    let lsb: i32 = fields[3].parse().map_err(|_| bad())?;
    let rows: u32 = fields[4].parse().map_err(|_| bad())?;
    let kind = SignalKind::from_tag(fields[1], rows).ok_or_else(bad)?;
    let mut sig = Signal::new(fields[0], kind, width, lsb);
    sig.excl_id = fields[5].parse().map_err(|_| bad())?;
    sig.tog01 = BitSet::from_hex(fields[6], width).ok_or_else(bad)?;
    sig.tog10 = BitSet::from_hex(fields[7], width).ok_or_else(bad)?;
    sig.mem_wr = BitSet::from_hex(fields[8], kind.rows()).ok_or_else(bad)?;
    sig.mem_rd = BitSet::from_hex(fields[9], kind.rows()).ok_or_else(bad)?;
    Ok(sig)
}

fn parse_expression(fields: &[&str], line: usize) -> Result<Expression, CddError> {
    let bad = || CddError::parse(line, "malformed expression record");
    if fields.len() != 4 {
        return Err(bad());
    }
    let kind = ExprKind::from_tag(fields[2]).ok_or_else(bad)?;
    let mut expr = Expression::new(fields[1].parse().map_err(|_| bad())?, kind);
    expr.excl_id = fields[0].parse().map_err(|_| bad())?;
    expr.combo_hit = BitSet::from_hex(fields[3], kind.combo_slots()).ok_or_else(bad)?;
    Ok(expr)
}

fn parse_fsm(
    db: &CoverageDb,
    funit: FunitId,
    fields: &[&str],
    line: usize,
) -> Result<Fsm, CddError> {
    let bad = || CddError::parse(line, "malformed FSM record");
    if fields.len() != 6 {
        return Err(bad());
    }
    let unit = &db.funits[funit];
    let (from_name, to_name) = (fields[0], fields[1]);
    let (Some(from_sig), Some(to_sig)) = (unit.find_signal(from_name), unit.find_signal(to_name))
    else {
        return Err(CddError::FsmSignalsNotFound {
            from: from_name.to_string(),
            to: to_name.to_string(),
            funit: unit.name.clone(),
        });
    };
    let width: u32 = fields[2].parse().map_err(|_| bad())?;
    let mut fsm = Fsm::new(from_sig, to_sig, width).map_err(TreeError::from)?;
    let bits = fsm.table.side() * fsm.table.side();
    let hit = BitSet::from_hex(fields[3], bits).ok_or_else(bad)?;
    let valid = BitSet::from_hex(fields[4], bits).ok_or_else(bad)?;
    let base: u32 = fields[5].parse().map_err(|_| bad())?;
    fsm.table = ArcTable::from_parts(width, hit, valid, base).map_err(TreeError::from)?;
    Ok(fsm)
}
