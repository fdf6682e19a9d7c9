//! Stable arena ids for structural components.
//!
//! Ids are assigned once, when a component is created, and never change, even
//! when the component's identifier is renamed. They are `uuid`-backed so ids
//! minted by different definitions never collide inside a composed route.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Id of an assessment test.
    TestId
);
arena_id!(
    /// Id of a test part.
    TestPartId
);
arena_id!(
    /// Id of a section.
    SectionId
);
arena_id!(
    /// Id of an item reference.
    ItemRefId
);
