//! Item-level error types for the coverage data model.
//!
//! These errors surface when two databases derived from different design
//! elaborations are forced together, or when an FSM asks for a transition
//! table the matrix representation cannot hold.

use crate::table::MAX_FSM_WIDTH;

/// Errors raised by model-level operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// An FSM state vector is too wide to back a square transition table.
    #[error("FSM state width {width} exceeds the supported maximum of {MAX_FSM_WIDTH}")]
    FsmWidthTooLarge {
        /// The requested state-vector width in bits.
        width: u32,
    },

    /// Two merge counterparts disagree on a signal's identity or shape.
    #[error("signal {name:?} does not match merge counterpart {other:?}")]
    SignalMismatch {
        /// The signal name on the surviving side.
        name: String,
        /// The counterpart name on the incoming side.
        other: String,
    },

    /// Two merge counterparts disagree on an expression's shape.
    #[error("expression at line {line} does not match its merge counterpart")]
    ExpressionMismatch {
        /// Source line of the expression on the surviving side.
        line: u32,
    },

    /// Two FSMs bound to differently-named state-signal pairs were merged.
    #[error(
        "FSM state signals ({from}, {to}) do not match merge counterpart ({other_from}, {other_to})"
    )]
    FsmSignalMismatch {
        /// From-signal name on the surviving side.
        from: String,
        /// To-signal name on the surviving side.
        to: String,
        /// From-signal name on the incoming side.
        other_from: String,
        /// To-signal name on the incoming side.
        other_to: String,
    },

    /// Two merge counterparts carry different numbers of coverage items.
    #[error("{kind} item counts differ between merge inputs ({left} vs {right})")]
    ItemCountMismatch {
        /// Which item list diverged ("signal", "expression", "FSM").
        kind: &'static str,
        /// Item count on the surviving side.
        left: usize,
        /// Item count on the incoming side.
        right: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_display() {
        let e = ModelError::FsmWidthTooLarge { width: 24 };
        assert_eq!(
            e.to_string(),
            "FSM state width 24 exceeds the supported maximum of 14"
        );
    }

    #[test]
    fn count_mismatch_display() {
        let e = ModelError::ItemCountMismatch {
            kind: "signal",
            left: 2,
            right: 3,
        };
        assert_eq!(
            e.to_string(),
            "signal item counts differ between merge inputs (2 vs 3)"
        );
    }
}
