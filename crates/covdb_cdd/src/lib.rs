//! Coverage-database (CDD) persistence for the covdb core.
//!
//! A CDD stream is one textual record per line: an INFO header pinning the
//! tool version and coverage-point counts, functional-unit headers with
//! their signal/expression/FSM item records, and instance-only records for
//! structural placeholders. Reading into a populated database is a merge:
//! point counts are verified, the incoming trees are built, and the merge
//! engine pairs them against the existing forest.

#![warn(missing_docs)]

pub mod error;
pub mod reader;
pub mod record;
pub mod writer;

pub use error::CddError;
pub use reader::{read, read_file};
pub use record::{InfoRecord, CDD_VERSION};
pub use writer::{write, write_file};
