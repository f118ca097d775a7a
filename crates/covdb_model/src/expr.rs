//! Expression coverage items: combinational value-pair tracking.
//!
//! Each expression contributes a small fixed set of combination slots
//! determined by its operator. During simulation the evaluator marks the
//! slot matching the operand values it saw; coverage asks how many of the
//! slots were ever marked.

use covdb_common::BitSet;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::stats::Statistics;

/// Operator classes distinguished for combinational coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprKind {
    /// Logical/bitwise AND.
    And,
    /// Logical/bitwise OR.
    Or,
    /// XOR.
    Xor,
    /// Unary negation/reduction.
    Unary,
    /// Relational or equality comparison.
    Compare,
    /// Conditional (ternary) select.
    Cond,
}

impl ExprKind {
    /// Number of combination slots this operator is scored on.
    ///
    /// AND is covered by `left==0`, `right==0`, `both==1`; OR dually by
    /// `left==1`, `right==1`, `both==0`; XOR by all four operand pairs;
    /// single-valued operators by their false/true outcomes.
    pub fn combo_slots(self) -> u32 {
        match self {
            ExprKind::And | ExprKind::Or => 3,
            ExprKind::Xor => 4,
            ExprKind::Unary | ExprKind::Compare | ExprKind::Cond => 2,
        }
    }

    /// Short lowercase tag used in the persisted record format.
    pub fn tag(self) -> &'static str {
        match self {
            ExprKind::And => "and",
            ExprKind::Or => "or",
            ExprKind::Xor => "xor",
            ExprKind::Unary => "unary",
            ExprKind::Compare => "cmp",
            ExprKind::Cond => "cond",
        }
    }

    /// Parses a tag written by [`ExprKind::tag`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "and" => ExprKind::And,
            "or" => ExprKind::Or,
            "xor" => ExprKind::Xor,
            "unary" => ExprKind::Unary,
            "cmp" => ExprKind::Compare,
            "cond" => ExprKind::Cond,
            _ => return None,
        })
    }
}

/// An expression coverage item within a functional unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// Global exclusion ID; zero until an issuance pass assigns one.
    pub excl_id: u32,
    /// Source line the expression appears on.
    pub line: u32,
    /// The operator class.
    pub kind: ExprKind,
    /// Per-slot combination hits.
    pub combo_hit: BitSet,
}

impl Expression {
    /// Creates an expression item with all combination slots unhit.
    pub fn new(line: u32, kind: ExprKind) -> Self {
        Self {
            excl_id: 0,
            line,
            kind,
            combo_hit: BitSet::new(kind.combo_slots()),
        }
    }

    /// Number of combination slots scored on this expression.
    pub fn combo_total(&self) -> u32 {
        self.combo_hit.len()
    }

    /// Marks one combination slot as observed. Monotone, idempotent.
    pub fn record_combo(&mut self, slot: u32) {
        self.combo_hit.set(slot);
    }

    /// Folds this item's hit/total contribution into `stat`.
    pub fn accumulate_into(&self, stat: &mut Statistics) {
        let mut add = Statistics::zero();
        add.comb_total = Some(self.combo_total());
        add.comb_hit = self.combo_hit.count_ones();
        stat.absorb(&add);
    }

    /// Unions another run's hits for the same expression into this one.
    pub fn merge_from(&mut self, other: &Expression) -> Result<(), ModelError> {
        if self.kind != other.kind || self.line != other.line {
            return Err(ModelError::ExpressionMismatch { line: self.line });
        }
        self.combo_hit |= &other.combo_hit;
        Ok(())
    }
}
