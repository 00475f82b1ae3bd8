//! # Base Core
//!
//! Deterministic base-building core for a strategy campaign.
//!
//! This crate contains **only** the base simulation:
//! - No UI or rendering
//! - No script engine (template triggers are emitted as events)
//! - No system randomness (a seeded campaign RNG drives every random pick)
//! - No floating-point math (levels and ranges use fixed-point)
//!
//! ## Crate Structure
//!
//! - [`campaign`] - Campaign context owning all strategic state
//! - [`templates`] - Building templates and the type dependency graph
//! - [`base`] - Bases and building instances
//! - [`grid`] - Base tile grid and placement
//! - [`resolver`] - Building-type status flags and propagation
//! - [`ledger`] - Capacity maxima and current usage
//! - [`overflow`] - Removing what no longer fits
//! - [`lifecycle`] - Placement, construction and status changes
//! - [`destruction`] - Building and base destruction
//! - [`snapshot`] - Save and restore of bases

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod aircraft;
pub mod aliens;
pub mod base;
pub mod campaign;
pub mod capacity;
pub mod config;
pub mod destruction;
pub mod employees;
pub mod error;
pub mod events;
pub mod grid;
pub mod hooks;
pub mod ledger;
pub mod lifecycle;
pub mod math;
pub mod overflow;
pub mod radar;
pub mod resolver;
pub mod snapshot;
pub mod storage;
pub mod templates;
pub mod validate;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::aircraft::{AircraftId, AircraftLocation, AircraftSize};
    pub use crate::base::{Base, BaseId, BaseStatus, Building, BuildingId, BuildingStatus};
    pub use crate::campaign::{BaseTemplate, BaseTemplateEntry, Campaign};
    pub use crate::capacity::{Capacity, CapacityKind};
    pub use crate::config::CampaignConfig;
    pub use crate::destruction::{building_destroy, destroy_base, mark_building_destroy};
    pub use crate::employees::{EmployeeId, EmployeeType};
    pub use crate::error::{BaseError, DestroyRefusal, Result};
    pub use crate::events::{CampaignEvent, TriggerKind};
    pub use crate::grid::{Tile, TileCell};
    pub use crate::lifecycle::{place_building, update_building_status};
    pub use crate::math::{Fixed, GeoPos};
    pub use crate::storage::{ItemCatalog, ItemDef, ItemId};
    pub use crate::templates::{BuildingTemplateData, BuildingType, Footprint, TemplateStore};
}
