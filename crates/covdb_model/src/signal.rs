//! Signal coverage items: toggle and memory hit tracking.
//!
//! A [`Signal`] is one entry in a functional unit's ordered signal list.
//! Nets and registers carry per-bit 0→1 / 1→0 toggle sets; memories
//! additionally track which addressable elements were written and read.

use covdb_common::BitSet;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::stats::Statistics;

/// The storage kind of a signal, determining which metrics apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// A combinational net (wire).
    Net,
    /// A sequential register.
    Reg,
    /// An addressable memory with the given number of elements.
    Memory {
        /// Number of addressable elements.
        rows: u32,
    },
}

impl SignalKind {
    /// Number of addressable elements, zero for non-memories.
    pub fn rows(self) -> u32 {
        match self {
            SignalKind::Memory { rows } => rows,
            _ => 0,
        }
    }

    /// Short lowercase tag used in the persisted record format.
    pub fn tag(self) -> &'static str {
        match self {
            SignalKind::Net => "net",
            SignalKind::Reg => "reg",
            SignalKind::Memory { .. } => "mem",
        }
    }

    /// Parses a tag written by [`SignalKind::tag`], with the element count
    /// carried separately in the record.
    pub fn from_tag(tag: &str, rows: u32) -> Option<Self> {
        Some(match tag {
            "net" => SignalKind::Net,
            "reg" => SignalKind::Reg,
            "mem" => SignalKind::Memory { rows },
            _ => return None,
        })
    }
}

/// A signal coverage item within a functional unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// The signal name, unique within its functional unit.
    pub name: String,
    /// The storage kind.
    pub kind: SignalKind,
    /// Bit width of one element.
    pub width: u32,
    /// Least significant bit index of the declared range.
    pub lsb: i32,
    /// Global exclusion ID; zero until an issuance pass assigns one.
    pub excl_id: u32,
    /// Per-bit 0→1 toggle hits.
    pub tog01: BitSet,
    /// Per-bit 1→0 toggle hits.
    pub tog10: BitSet,
    /// Per-element write hits (memories only, otherwise empty).
    pub mem_wr: BitSet,
    /// Per-element read hits (memories only, otherwise empty).
    pub mem_rd: BitSet,
}

impl Signal {
    /// Creates a signal item of the given kind with all hit sets clear.
    pub fn new(name: impl Into<String>, kind: SignalKind, width: u32, lsb: i32) -> Self {
        let rows = kind.rows();
        Self {
            name: name.into(),
            kind,
            width,
            lsb,
            excl_id: 0,
            tog01: BitSet::new(width),
            tog10: BitSet::new(width),
            mem_wr: BitSet::new(rows),
            mem_rd: BitSet::new(rows),
        }
    }

    /// Creates a combinational net item.
    pub fn net(name: impl Into<String>, width: u32, lsb: i32) -> Self {
        Self::new(name, SignalKind::Net, width, lsb)
    }

    /// Creates a register item.
    pub fn reg(name: impl Into<String>, width: u32, lsb: i32) -> Self {
        Self::new(name, SignalKind::Reg, width, lsb)
    }

    /// Creates a memory item with `rows` addressable elements.
    pub fn memory(name: impl Into<String>, width: u32, lsb: i32, rows: u32) -> Self {
        Self::new(name, SignalKind::Memory { rows }, width, lsb)
    }

    /// Records a 0→1 transition of the given bit. Monotone, idempotent.
    pub fn record_toggle01(&mut self, bit: u32) {
        self.tog01.set(bit);
    }

    /// Records a 1→0 transition of the given bit. Monotone, idempotent.
    pub fn record_toggle10(&mut self, bit: u32) {
        self.tog10.set(bit);
    }

    /// Records a write of the given addressable element.
    pub fn record_mem_write(&mut self, element: u32) {
        self.mem_wr.set(element);
    }

    /// Records a read of the given addressable element.
    pub fn record_mem_read(&mut self, element: u32) {
        self.mem_rd.set(element);
    }

    /// Folds this item's hit/total contribution into `stat`.
    pub fn accumulate_into(&self, stat: &mut Statistics) {
        match self.kind {
            SignalKind::Net | SignalKind::Reg => {
                let mut add = Statistics::zero();
                add.tog_total = Some(self.width);
                add.tog01_hit = self.tog01.count_ones();
                add.tog10_hit = self.tog10.count_ones();
                stat.absorb(&add);
            }
            SignalKind::Memory { rows } => {
                let mut add = Statistics::zero();
                add.mem_ae_total = Some(rows);
                add.mem_wr_hit = self.mem_wr.count_ones();
                add.mem_rd_hit = self.mem_rd.count_ones();
                add.mem_tog_total = Some(self.width);
                add.mem_tog01_hit = self.tog01.count_ones();
                add.mem_tog10_hit = self.tog10.count_ones();
                stat.absorb(&add);
            }
        }
    }

    /// Unions another run's hits for the same signal into this one.
    ///
    /// The counterpart must agree on name, kind, and width; a mismatch
    /// means the inputs came from different design elaborations.
    pub fn merge_from(&mut self, other: &Signal) -> Result<(), ModelError> {
        if self.name != other.name || self.kind != other.kind || self.width != other.width {
            return Err(ModelError::SignalMismatch {
                name: self.name.clone(),
                other: other.name.clone(),
            });
        }
        self.tog01 |= &other.tog01;
        self.tog10 |= &other.tog10;
        self.mem_wr |= &other.mem_wr;
        self.mem_rd |= &other.mem_rd;
        Ok(())
    }
}
