//! Error types for the base simulation.

use thiserror::Error;

use crate::aircraft::AircraftId;
use crate::base::{BaseId, BuildingId};
use crate::capacity::CapacityKind;
use crate::employees::EmployeeId;
use crate::grid::Tile;
use crate::templates::BuildingType;

/// Result type alias using [`BaseError`].
pub type Result<T> = std::result::Result<T, BaseError>;

/// Why a building cannot be destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyRefusal {
    /// The entrance holds the base together.
    Entrance,
    /// Removing the building would cut other buildings off from the entrance.
    BreaksConnectivity,
    /// Buildings cannot be removed while the base is under attack.
    UnderAttack,
}

impl std::fmt::Display for DestroyRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entrance => write!(f, "the entrance cannot be destroyed"),
            Self::BreaksConnectivity => {
                write!(f, "other buildings would lose their connection to the entrance")
            }
            Self::UnderAttack => write!(f, "the base is under attack"),
        }
    }
}

/// Top-level error type for base operations.
///
/// Variants for which [`BaseError::is_fatal`] returns `true` mean the
/// campaign state is corrupted; callers must stop using it.
#[derive(Debug, Error)]
pub enum BaseError {
    /// Not enough credits to pay the construction costs.
    #[error("Insufficient credits: need {required}, have {available}")]
    InsufficientCredits {
        /// Credits required.
        required: i64,
        /// Credits available.
        available: i64,
    },

    /// The tile lies outside the base grid.
    #[error("Invalid position {0:?}")]
    InvalidPosition(Tile),

    /// The tile is blocked.
    #[error("Tile {0:?} is blocked")]
    TileBlocked(Tile),

    /// The tile already holds a building.
    #[error("Tile {0:?} is already occupied")]
    TileOccupied(Tile),

    /// The template's per-base building limit is reached.
    #[error("Base already holds the maximum of {max} '{template}' buildings")]
    MaxCountReached {
        /// Template identifier.
        template: String,
        /// Allowed count.
        max: u32,
    },

    /// Template id not found.
    #[error("Unknown building template: {0}")]
    UnknownTemplate(String),

    /// Base id not found.
    #[error("Unknown base: {0:?}")]
    UnknownBase(BaseId),

    /// Building handle does not refer to a live building.
    #[error("Unknown building {building:?} in base {base:?}")]
    UnknownBuilding {
        /// Base that was searched.
        base: BaseId,
        /// Stale or foreign handle.
        building: BuildingId,
    },

    /// Employee id not found, or not available for the request.
    #[error("Unknown or unavailable employee: {0:?}")]
    UnknownEmployee(EmployeeId),

    /// Aircraft id not found, or not available for the request.
    #[error("Unknown or unavailable aircraft: {0:?}")]
    UnknownAircraft(AircraftId),

    /// Item id not found in the catalogue.
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// The building may not be destroyed.
    #[error("Building cannot be destroyed: {0}")]
    NotDestroyable(DestroyRefusal),

    /// The base is destroyed or otherwise not accepting orders.
    #[error("Base {0:?} is not operational")]
    BaseNotOperational(BaseId),

    /// Maximum number of bases reached.
    #[error("Cannot found more than {0} bases")]
    TooManyBases(usize),

    /// Not enough free capacity for the requested change.
    #[error("Not enough free {kind:?} capacity: need {required}, free {free}")]
    NoCapacity {
        /// Capacity that is exhausted.
        kind: CapacityKind,
        /// Amount required.
        required: i32,
        /// Amount free.
        free: i32,
    },

    /// A building of the required type is not operational.
    #[error("No functional {0:?} building in base")]
    NoFunctionalBuilding(BuildingType),

    /// A map tile does not reference the building it should.
    #[error("Building mismatch at base {base:?} tile {tile:?}")]
    TileMismatch {
        /// Base with the corrupted grid.
        base: BaseId,
        /// Offending tile.
        tile: Tile,
    },

    /// Internal state is inconsistent.
    #[error("Corrupted state: {0}")]
    CorruptedState(String),

    /// Failed to encode or decode a snapshot.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Data file problem.
    #[error(transparent)]
    Data(#[from] crate::templates::DataError),
}

impl BaseError {
    /// Whether this error signals corrupted state rather than a refused action.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::TileMismatch { .. } | Self::CorruptedState(_))
    }
}
