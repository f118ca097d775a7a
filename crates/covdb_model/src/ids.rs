//! Opaque ID newtypes for database entities.
//!
//! Each ID is a thin `u32` wrapper created by [`Arena::alloc`](crate::arena::Arena::alloc).
//! Parent/child links in the instance tree are stored as these indices, so
//! tree edits during merge are index reassignments rather than pointer
//! surgery.

use crate::arena::EntityId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl EntityId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a functional-unit definition in the database.
    FunitId
);

define_id!(
    /// Opaque, copyable ID for an instance node in the structural forest.
    InstId
);
