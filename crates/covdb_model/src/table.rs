//! Square FSM state-transition bit matrices.
//!
//! The table's side is the state signal's encoding domain (2^width): every
//! encodable value has a row and a column, so illegal encodings are
//! representable and simply never hit. Bit `(r, c)` set in the hit plane
//! means "a transition from encoded state r to encoded state c was
//! observed"; the valid plane marks transitions declared legal before
//! simulation.

use covdb_common::BitSet;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Largest supported state-vector width in bits.
///
/// The matrix representation needs 2^(2*width) bits; past this cap a
/// mis-tagged wide bus would request gigabytes, so table creation fails
/// fatally instead.
pub const MAX_FSM_WIDTH: u32 = 14;

/// A square bit matrix tracking observed and declared-legal transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcTable {
    width: u32,
    side: u32,
    hit: BitSet,
    valid: BitSet,
    /// First exclusion ID of this table's valid arcs; zero until issued.
    arc_id_base: u32,
}

impl ArcTable {
    /// Creates an all-clear table for a state vector of the given width.
    pub fn new(width: u32) -> Result<Self, ModelError> {
        if width == 0 || width > MAX_FSM_WIDTH {
            return Err(ModelError::FsmWidthTooLarge { width });
        }
        let side = 1u32 << width;
        Ok(Self {
            width,
            side,
            hit: BitSet::new(side * side),
            valid: BitSet::new(side * side),
            arc_id_base: 0,
        })
    }

    /// Rebuilds a table from persisted parts.
    pub fn from_parts(
        width: u32,
        hit: BitSet,
        valid: BitSet,
        arc_id_base: u32,
    ) -> Result<Self, ModelError> {
        let mut table = Self::new(width)?;
        table.hit |= &hit;
        table.valid |= &valid;
        table.arc_id_base = arc_id_base;
        Ok(table)
    }

    /// The state-vector width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The matrix side length (2^width).
    pub fn side(&self) -> u32 {
        self.side
    }

    fn index(&self, from: u64, to: u64) -> u32 {
        let mask = u64::from(self.side - 1);
        let r = (from & mask) as u32;
        let c = (to & mask) as u32;
        r * self.side + c
    }

    /// Marks the transition `from → to` as observed. Monotone, idempotent.
    ///
    /// Values are masked to the encoding domain.
    pub fn set_hit(&mut self, from: u64, to: u64) {
        let index = self.index(from, to);
        self.hit.set(index);
    }

    /// Marks the transition `from → to` as declared legal.
    pub fn set_valid(&mut self, from: u64, to: u64) {
        let index = self.index(from, to);
        self.valid.set(index);
    }

    /// Returns `true` if the transition was observed.
    pub fn is_hit(&self, from: u64, to: u64) -> bool {
        self.hit.get(self.index(from, to))
    }

    /// Returns `true` if the transition was declared legal.
    pub fn is_valid(&self, from: u64, to: u64) -> bool {
        self.valid.get(self.index(from, to))
    }

    /// Number of observed transitions.
    pub fn hit_count(&self) -> u32 {
        self.hit.count_ones()
    }

    /// Number of declared-legal transitions.
    pub fn valid_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Number of distinct states appearing as an endpoint of any observed
    /// transition.
    pub fn state_hit_count(&self) -> u32 {
        self.endpoint_count(&self.hit)
    }

    /// Number of distinct states appearing as an endpoint of any
    /// declared-legal transition.
    pub fn state_valid_count(&self) -> u32 {
        self.endpoint_count(&self.valid)
    }

    fn endpoint_count(&self, plane: &BitSet) -> u32 {
        let mut seen = BitSet::new(self.side);
        for bit in plane.ones() {
            seen.set(bit / self.side);
            seen.set(bit % self.side);
        }
        seen.count_ones()
    }

    /// Assigns sequential exclusion IDs to this table's valid arcs,
    /// starting at `first`. Returns the next unassigned ID.
    pub fn issue_arc_ids(&mut self, first: u32) -> u32 {
        self.arc_id_base = first;
        first + self.valid_count()
    }

    /// First exclusion ID of this table's valid arcs, zero if unissued.
    pub fn arc_id_base(&self) -> u32 {
        self.arc_id_base
    }

    /// Looks up a valid-arc index by exclusion ID.
    ///
    /// Indices count valid bits in row-major order. Returns `None` when the
    /// ID falls outside this table's issued range.
    pub fn find_arc_by_id(&self, id: u32) -> Option<u32> {
        if self.arc_id_base == 0 || id < self.arc_id_base {
            return None;
        }
        let offset = id - self.arc_id_base;
        (offset < self.valid_count()).then_some(offset)
    }

    /// Iterates declared-legal transitions as `(from, to)` pairs in
    /// row-major order (the order exclusion IDs are issued in).
    pub fn valid_arcs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.valid.ones().map(|bit| (bit / self.side, bit % self.side))
    }

    /// Unions another table's planes into this one.
    ///
    /// # Panics
    ///
    /// Panics if the tables have different widths; callers verify the two
    /// FSMs are bound to the same signal pair first.
    pub fn merge_from(&mut self, other: &ArcTable) {
        assert_eq!(self.width, other.width, "arc tables differ in width");
        self.hit |= &other.hit;
        self.valid |= &other.valid;
    }

    /// The observed-transition plane.
    pub fn hit_plane(&self) -> &BitSet {
        &self.hit
    }

    /// The declared-legal plane.
    pub fn valid_plane(&self) -> &BitSet {
        &self.valid
    }
}
