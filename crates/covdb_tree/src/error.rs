//! Error types for instance-tree operations.
//!
//! Fatal conditions unwind out of the current top-level operation
//! (read-one-file, merge-two-trees); expected misses such as failed scope
//! lookups are `Option` returns, not errors.

use covdb_model::ModelError;

/// Errors raised by tree edits and merges.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A scope path did not resolve to an instance.
    #[error("scope {scope:?} does not name an instance in this tree")]
    ScopeNotFound {
        /// The scope path that failed to resolve.
        scope: String,
    },

    /// The parent of an instance being inserted or removed is missing,
    /// indicating unsalvageable corruption in the input data.
    #[error("parent instance {scope:?} not found during tree edit")]
    ParentNotFound {
        /// The parent scope path that failed to resolve.
        scope: String,
    },

    /// An item-level mismatch while merging two functional units.
    #[error(transparent)]
    Model(#[from] ModelError),
}
