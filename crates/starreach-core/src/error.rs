//! Error types for the world services.
//!
//! Expected outcomes are not errors here: a missing entity is `Ok(None)`, an
//! exhausted placement search is `Ok(None)` or
//! [`CreateEmpireOutcome::NoSuitableLocation`](crate::CreateEmpireOutcome).

use starreach_db::StoreError;
use starreach_types::{EmpireId, StarId};
use starreach_world::ModificationRejection;

/// Errors from [`StarManager::modify`](crate::StarManager::modify).
#[derive(Debug, thiserror::Error)]
pub enum ModifyError {
    /// No star with this ID exists.
    #[error("star {star_id} not found")]
    StarNotFound {
        /// The requested star.
        star_id: StarId,
    },

    /// A precondition failed; the star is unchanged.
    #[error("modification rejected: {0}")]
    Rejected(#[from] ModificationRejection),

    /// The new state could not be persisted; the star is unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the placement search.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    /// A sector or empire read failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A star found by the search disappeared before it could be reserved.
    #[error("star {star_id} disappeared during reservation")]
    StarVanished {
        /// The chosen star.
        star_id: StarId,
    },
}

/// Errors from the empire manager.
#[derive(Debug, thiserror::Error)]
pub enum EmpireError {
    /// The display name is empty or too long.
    #[error("invalid empire name: {reason}")]
    InvalidName {
        /// What is wrong with it.
        reason: String,
    },

    /// The placement search failed.
    #[error("placement failed: {0}")]
    Placement(#[from] PlacementError),

    /// Reading or writing an empire failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The empire could not be saved and its reserved homeworld could not be
    /// released. The release is retried before the next creation.
    #[error("empire {empire_id} not saved, homeworld {star_id} awaits release: {source}")]
    HomeworldStranded {
        /// The empire that was never saved.
        empire_id: EmpireId,
        /// The star still holding its colony and fleets.
        star_id: StarId,
        /// Why the empire save failed.
        source: StoreError,
    },
}

/// Errors from a rank aggregation cycle.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// Loading inputs or saving the table failed. The previous table is
    /// still in place.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
