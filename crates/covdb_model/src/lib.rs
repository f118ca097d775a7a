//! Data model for the covdb coverage database.
//!
//! This crate defines the passive entities the database stores: functional
//! units and their ordered coverage-item lists (signals, expressions, FSM
//! descriptors), the FSM arc/state transition table, per-entity statistics,
//! and the arenas and ID newtypes everything is addressed through.

#![warn(missing_docs)]

pub mod arena;
pub mod error;
pub mod expr;
pub mod fsm;
pub mod funit;
pub mod ids;
pub mod signal;
pub mod stats;
pub mod table;

pub use arena::{Arena, EntityId};
pub use error::ModelError;
pub use expr::{ExprKind, Expression};
pub use fsm::{Fsm, FsmArc};
pub use funit::{FunctionalUnit, FunitKind};
pub use ids::{FunitId, InstId};
pub use signal::{Signal, SignalKind};
pub use stats::{PointCounts, Statistics};
pub use table::{ArcTable, MAX_FSM_WIDTH};
