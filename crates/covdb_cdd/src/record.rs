//! CDD record framing: type codes, the version constant, and the INFO
//! record.
//!
//! A coverage-database file is one textual record per line, space
//! delimited, with an integer type code first. The INFO record leads the
//! file and pins the tool version, run summary, and per-metric
//! coverage-point counts every later merge input must match.

use covdb_model::PointCounts;

/// Version constant written to and required from the INFO record.
pub const CDD_VERSION: u32 = 0x0014;

/// Record type code for the INFO record.
pub const REC_INFO: u32 = 1;
/// Record type code for a functional-unit header.
pub const REC_FUNIT: u32 = 2;
/// Record type code for a signal item.
pub const REC_SIGNAL: u32 = 3;
/// Record type code for an expression item.
pub const REC_EXPRESSION: u32 = 4;
/// Record type code for an FSM item.
pub const REC_FSM: u32 = 5;
/// Record type code for an instance-only placeholder.
pub const REC_INST_ONLY: u32 = 6;

/// The parsed body of an INFO record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoRecord {
    /// Tool version the file was written by.
    pub version: u32,
    /// Summary flags from the scoring run (opaque to the core).
    pub flags: u32,
    /// Number of simulation events the run processed.
    pub sim_events: u64,
    /// Per-metric coverage-point counts.
    pub points: PointCounts,
}

impl InfoRecord {
    /// Formats the record body (everything after the type code).
    pub fn format(&self) -> String {
        format!(
            "{:x} {:x} {} {} {} {} {}",
            self.version,
            self.flags,
            self.sim_events,
            self.points.comb,
            self.points.fsm,
            self.points.toggle,
            self.points.memory
        )
    }

    /// Parses a record body split into whitespace-delimited fields.
    pub fn parse(fields: &[&str]) -> Option<Self> {
        if fields.len() != 7 {
            return None;
        }
        Some(Self {
            version: u32::from_str_radix(fields[0], 16).ok()?,
            flags: u32::from_str_radix(fields[1], 16).ok()?,
            sim_events: fields[2].parse().ok()?,
            points: PointCounts {
                comb: fields[3].parse().ok()?,
                fsm: fields[4].parse().ok()?,
                toggle: fields[5].parse().ok()?,
                memory: fields[6].parse().ok()?,
            },
        })
    }
}
