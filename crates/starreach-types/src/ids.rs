//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the galaxy has a strongly-typed ID to prevent accidental
//! mixing of identifiers at compile time. IDs created at runtime (empires,
//! colonies, fleets, build requests) use UUID v7 for time-ordered indexing.
//! Stars are created by the sector generator and take their IDs from the
//! sector's seeded RNG via [`StarId::from_random_bytes`], so regenerating a
//! sector reproduces the same identifiers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Build an identifier from 16 random bytes (UUID v4 layout).
            ///
            /// Used where the bytes come from a seeded generator and the
            /// identifier must be reproducible.
            pub const fn from_random_bytes(bytes: [u8; 16]) -> Self {
                Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a star.
    StarId
}

define_id! {
    /// Unique identifier for an empire.
    EmpireId
}

define_id! {
    /// Unique identifier for a colony on a planet.
    ColonyId
}

define_id! {
    /// Unique identifier for a fleet stationed at a star.
    FleetId
}

define_id! {
    /// Unique identifier for a completed building on a colony.
    BuildingId
}

define_id! {
    /// Unique identifier for a pending entry in a colony's build queue.
    BuildRequestId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let star = StarId::new();
        let empire = EmpireId::new();
        assert_ne!(star.into_inner(), Uuid::nil());
        assert_ne!(empire.into_inner(), Uuid::nil());
    }

    #[test]
    fn random_bytes_are_reproducible() {
        let bytes = [7_u8; 16];
        assert_eq!(StarId::from_random_bytes(bytes), StarId::from_random_bytes(bytes));
        assert_eq!(StarId::from_random_bytes(bytes).into_inner().get_version_num(), 4);
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = EmpireId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
