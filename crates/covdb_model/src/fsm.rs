//! FSM coverage descriptors.
//!
//! An [`Fsm`] binds a mandatory *to* state signal and a *from* state signal
//! (the same signal when the machine transitions on its own previous value),
//! an ordered list of declared legal transitions, and the square
//! [`ArcTable`](crate::table::ArcTable) that records what simulation
//! actually observed.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::stats::Statistics;
use crate::table::ArcTable;

/// A declared legal state transition.
///
/// Endpoint expressions are evaluated to concrete encodings during
/// elaboration; only the resulting values reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsmArc {
    /// Encoded from-state value.
    pub from: u64,
    /// Encoded to-state value.
    pub to: u64,
}

/// An FSM coverage item within a functional unit.
///
/// Signal bindings are indices into the owning unit's signal list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fsm {
    /// Index of the from-state signal in the owning unit.
    pub from_sig: usize,
    /// Index of the to-state signal in the owning unit.
    pub to_sig: usize,
    /// Declared legal transitions, in declaration order.
    pub arcs: Vec<FsmArc>,
    /// The transition table.
    pub table: ArcTable,
}

impl Fsm {
    /// Creates an FSM for a state signal of the given width.
    ///
    /// The table is sized to the signal's encoding domain, not the number
    /// of legal states.
    pub fn new(from_sig: usize, to_sig: usize, width: u32) -> Result<Self, ModelError> {
        Ok(Self {
            from_sig,
            to_sig,
            arcs: Vec::new(),
            table: ArcTable::new(width)?,
        })
    }

    /// Appends a declared legal-transition descriptor.
    ///
    /// This only pre-seeds legality bookkeeping; it never records a hit.
    pub fn add_arc(&mut self, from: u64, to: u64) {
        self.arcs.push(FsmArc { from, to });
    }

    /// Marks every declared arc's table entry as valid.
    ///
    /// Called once the state signals are sized, before simulation. Lets
    /// reporting distinguish "never happened because illegal" from "legal
    /// but never exercised".
    pub fn create_tables(&mut self) {
        for arc in &self.arcs {
            self.table.set_valid(arc.from, arc.to);
        }
    }

    /// Records an observed transition. Monotone, idempotent.
    pub fn observe(&mut self, from_value: u64, to_value: u64) {
        self.table.set_hit(from_value, to_value);
    }

    /// Folds this FSM's hit/total contribution into `stat`.
    ///
    /// When no legal transitions were ever declared, the legal state and
    /// arc populations are unknowable and the totals propagate as unknown.
    pub fn accumulate_into(&self, stat: &mut Statistics) {
        let mut add = Statistics::zero();
        if self.table.valid_count() == 0 {
            add.state_total = None;
            add.arc_total = None;
        } else {
            add.state_total = Some(self.table.state_valid_count());
            add.arc_total = Some(self.table.valid_count());
        }
        add.state_hit = self.table.state_hit_count();
        add.arc_hit = self.table.hit_count();
        stat.absorb(&add);
    }

    /// Unions another run's table into this one.
    ///
    /// The caller (which owns the signal names) has already verified both
    /// FSMs are bound to identically-named signal pairs.
    pub fn merge_from(&mut self, other: &Fsm) {
        self.table.merge_from(&other.table);
    }
}
