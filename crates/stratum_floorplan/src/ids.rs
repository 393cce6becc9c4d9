//! Opaque ID newtypes for floorplanning entities.
//!
//! [`BlockId`], [`NetId`], [`DieId`], [`IslandId`], and [`AlignmentId`] are
//! thin `u32` wrappers used as arena indices into the [`Design`](crate::Design)
//! and the per-die sequences. They are `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
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

            /// Returns the ID as a `usize` arena index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a block in the design.
    BlockId
);

define_id!(
    /// Opaque, copyable ID for a net in the design.
    NetId
);

define_id!(
    /// Opaque, copyable ID for a die layer; layer 0 is farthest from the heatsink.
    DieId
);

define_id!(
    /// Opaque, copyable ID for a TSV island (a group of blocks sharing vertical signals).
    IslandId
);

define_id!(
    /// Opaque, copyable ID for an alignment requirement.
    AlignmentId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn block_id_roundtrip() {
        let id = BlockId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn id_equality_and_order() {
        let a = DieId::from_raw(0);
        let b = DieId::from_raw(1);
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn id_hash() {
        let mut set = HashSet::new();
        set.insert(NetId::from_raw(1));
        set.insert(NetId::from_raw(2));
        set.insert(NetId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", IslandId::from_raw(7)), "7");
    }

    #[test]
    fn id_serde_is_transparent() {
        let json = serde_json::to_string(&BlockId::from_raw(5)).unwrap();
        assert_eq!(json, "5");
        let back: BlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BlockId::from_raw(5));
    }
}
