//! Functional-unit definitions.
//!
//! A functional unit is a reusable design definition — a module, task,
//! function, or named block — owning ordered coverage-item lists and the
//! statistics aggregated over them. Several instances may reference the
//! same definition.

use covdb_common::scope;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::expr::Expression;
use crate::fsm::Fsm;
use crate::signal::Signal;
use crate::stats::Statistics;

/// The kind of design construct a functional unit represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunitKind {
    /// A module definition.
    Module,
    /// A task definition.
    Task,
    /// A function definition.
    Function,
    /// A named (or compiler-generated) begin/end block.
    NamedBlock,
}

impl FunitKind {
    /// Short lowercase tag used in the persisted record format.
    pub fn tag(self) -> &'static str {
        match self {
            FunitKind::Module => "module",
            FunitKind::Task => "task",
            FunitKind::Function => "function",
            FunitKind::NamedBlock => "block",
        }
    }

    /// Parses a tag written by [`FunitKind::tag`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "module" => FunitKind::Module,
            "task" => FunitKind::Task,
            "function" => FunitKind::Function,
            "block" => FunitKind::NamedBlock,
            _ => return None,
        })
    }
}

/// A design-level definition with its coverage-item stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalUnit {
    /// The definition name. Nested blocks carry their parent path, e.g.
    /// `alu.$u0`.
    pub name: String,
    /// Source file the definition came from.
    pub filename: String,
    /// The construct kind.
    pub kind: FunitKind,
    /// Ordered signal items.
    pub signals: Vec<Signal>,
    /// Ordered expression items.
    pub exprs: Vec<Expression>,
    /// Ordered FSM descriptors.
    pub fsms: Vec<Fsm>,
    /// Aggregated statistics, recomputed by [`FunctionalUnit::compute_stats`].
    pub stat: Statistics,
}

impl FunctionalUnit {
    /// Creates an empty functional unit.
    pub fn new(name: impl Into<String>, filename: impl Into<String>, kind: FunitKind) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            kind,
            signals: Vec::new(),
            exprs: Vec::new(),
            fsms: Vec::new(),
            stat: Statistics::zero(),
        }
    }

    /// Returns `true` if this unit is a compiler-generated unnamed scope.
    pub fn is_unnamed(&self) -> bool {
        let (_, leaf) = scope::split_back(&self.name);
        scope::is_unnamed(leaf)
    }

    /// Returns `true` if the unit declares no signals.
    pub fn has_no_signals(&self) -> bool {
        self.signals.is_empty()
    }

    /// Finds a signal by name, returning its list index.
    pub fn find_signal(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.name == name)
    }

    /// Recomputes this unit's aggregated statistics from its item lists.
    pub fn compute_stats(&mut self) {
        let mut stat = Statistics::zero();
        for sig in &self.signals {
            sig.accumulate_into(&mut stat);
        }
        for expr in &self.exprs {
            expr.accumulate_into(&mut stat);
        }
        for fsm in &self.fsms {
            fsm.accumulate_into(&mut stat);
        }
        self.stat = stat;
    }

    /// Inclusive exclusion-ID range covered by this unit's signal list.
    ///
    /// `None` when the list is empty or IDs have not been issued. Because
    /// issuance is strictly pre-order, the range is contiguous and never
    /// interleaves with another unit's.
    pub fn signal_id_range(&self) -> Option<(u32, u32)> {
        let first = self.signals.first()?.excl_id;
        let last = self.signals.last()?.excl_id;
        (first != 0).then_some((first, last))
    }

    /// Inclusive exclusion-ID range covered by this unit's expression list.
    pub fn expr_id_range(&self) -> Option<(u32, u32)> {
        let first = self.exprs.first()?.excl_id;
        let last = self.exprs.last()?.excl_id;
        (first != 0).then_some((first, last))
    }

    /// Unions another unit's coverage into this one, item by item.
    ///
    /// The two units must have identical item-list shapes: same counts,
    /// same signal names and widths, same expression operators, and FSMs
    /// bound to identically-named signal pairs. Any divergence means the
    /// inputs were derived from different design elaborations and is fatal.
    pub fn merge_from(&mut self, other: &FunctionalUnit) -> Result<(), ModelError> {
        if self.signals.len() != other.signals.len() {
            return Err(ModelError::ItemCountMismatch {
                kind: "signal",
                left: self.signals.len(),
                right: other.signals.len(),
            });
        }
        if self.exprs.len() != other.exprs.len() {
            return Err(ModelError::ItemCountMismatch {
                kind: "expression",
                left: self.exprs.len(),
                right: other.exprs.len(),
            });
        }
        if self.fsms.len() != other.fsms.len() {
            return Err(ModelError::ItemCountMismatch {
                kind: "FSM",
                left: self.fsms.len(),
                right: other.fsms.len(),
            });
        }

        // Verify FSM signal-pair names before mutating anything, so a fatal
        // mismatch leaves this unit untouched.
        for (fsm, other_fsm) in self.fsms.iter().zip(other.fsms.iter()) {
            let from = &self.signals[fsm.from_sig].name;
            let to = &self.signals[fsm.to_sig].name;
            let other_from = &other.signals[other_fsm.from_sig].name;
            let other_to = &other.signals[other_fsm.to_sig].name;
            if from != other_from || to != other_to {
                return Err(ModelError::FsmSignalMismatch {
                    from: from.clone(),
                    to: to.clone(),
                    other_from: other_from.clone(),
                    other_to: other_to.clone(),
                });
            }
        }
        for (sig, other_sig) in self.signals.iter().zip(other.signals.iter()) {
            if sig.name != other_sig.name
                || sig.kind != other_sig.kind
                || sig.width != other_sig.width
            {
                return Err(ModelError::SignalMismatch {
                    name: sig.name.clone(),
                    other: other_sig.name.clone(),
                });
            }
        }
        for (expr, other_expr) in self.exprs.iter().zip(other.exprs.iter()) {
            if expr.kind != other_expr.kind || expr.line != other_expr.line {
                return Err(ModelError::ExpressionMismatch { line: expr.line });
            }
        }

        for (sig, other_sig) in self.signals.iter_mut().zip(other.signals.iter()) {
            sig.merge_from(other_sig)?;
        }
        for (expr, other_expr) in self.exprs.iter_mut().zip(other.exprs.iter()) {
            expr.merge_from(other_expr)?;
        }
        for (fsm, other_fsm) in self.fsms.iter_mut().zip(other.fsms.iter()) {
            fsm.merge_from(other_fsm);
        }
        Ok(())
    }
}
