//! Capacity kinds and the per-base capacity table.

use serde::{Deserialize, Serialize};

use crate::templates::BuildingType;

/// Resource ceiling tracked by a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapacityKind {
    /// Quarters space for hired employees.
    Employees,
    /// Storage volume.
    Items,
    /// Laboratory space.
    LabSpace,
    /// Workshop space.
    Workspace,
    /// Small aircraft hangar slots.
    SmallHangar,
    /// Large aircraft hangar slots.
    LargeHangar,
    /// Alien containment slots.
    Aliens,
    /// Antimatter storage.
    Antimatter,
}

/// Number of capacity kinds (`MAX_CAP`).
pub const MAX_CAP: usize = 8;

impl CapacityKind {
    /// Every capacity kind, in index order.
    pub const ALL: [Self; MAX_CAP] = [
        Self::Employees,
        Self::Items,
        Self::LabSpace,
        Self::Workspace,
        Self::SmallHangar,
        Self::LargeHangar,
        Self::Aliens,
        Self::Antimatter,
    ];

    /// Index of this kind in the capacity table.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Capacity granted by a building type, if any.
#[must_use]
pub const fn capacity_for_building_type(building_type: BuildingType) -> Option<CapacityKind> {
    match building_type {
        BuildingType::Lab => Some(CapacityKind::LabSpace),
        BuildingType::Quarters => Some(CapacityKind::Employees),
        BuildingType::Storage => Some(CapacityKind::Items),
        BuildingType::Workshop => Some(CapacityKind::Workspace),
        BuildingType::Hangar => Some(CapacityKind::LargeHangar),
        BuildingType::SmallHangar => Some(CapacityKind::SmallHangar),
        BuildingType::AlienContainment => Some(CapacityKind::Aliens),
        BuildingType::Antimatter => Some(CapacityKind::Antimatter),
        _ => None,
    }
}

/// Building type that grants a capacity kind.
#[must_use]
pub const fn building_type_for_capacity(kind: CapacityKind) -> BuildingType {
    match kind {
        CapacityKind::LabSpace => BuildingType::Lab,
        CapacityKind::Employees => BuildingType::Quarters,
        CapacityKind::Items => BuildingType::Storage,
        CapacityKind::Workspace => BuildingType::Workshop,
        CapacityKind::LargeHangar => BuildingType::Hangar,
        CapacityKind::SmallHangar => BuildingType::SmallHangar,
        CapacityKind::Aliens => BuildingType::AlienContainment,
        CapacityKind::Antimatter => BuildingType::Antimatter,
    }
}

/// Current usage and maximum of one capacity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capacity {
    /// Amount in use.
    pub cur: i32,
    /// Derived maximum.
    pub max: i32,
}

impl Capacity {
    /// Free space; negative when over capacity.
    #[must_use]
    pub const fn free(&self) -> i32 {
        self.max - self.cur
    }

    /// Whether usage exceeds the maximum.
    #[must_use]
    pub const fn is_overflowing(&self) -> bool {
        self.cur > self.max
    }
}

/// Capacity table of a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capacities([Capacity; MAX_CAP]);

impl Capacities {
    /// Entry for a kind.
    #[must_use]
    pub fn get(&self, kind: CapacityKind) -> Capacity {
        self.0[kind.index()]
    }

    /// Mutable entry for a kind.
    pub fn get_mut(&mut self, kind: CapacityKind) -> &mut Capacity {
        &mut self.0[kind.index()]
    }

    /// Set the current usage of a kind.
    pub fn set_current(&mut self, kind: CapacityKind, cur: i32) {
        self.0[kind.index()].cur = cur;
    }

    /// Iterate `(kind, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (CapacityKind, Capacity)> + '_ {
        CapacityKind::ALL.iter().map(|&kind| (kind, self.get(kind)))
    }
}
