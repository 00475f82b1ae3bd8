//! Building-status change hooks.
//!
//! When a building type becomes operational or stops being operational the
//! resolver calls every hook registered for that `(type, transition)` pair.
//! The default table wires up radar coverage, the installation limit and
//! alien containment.

use std::collections::HashMap;

use crate::aliens;
use crate::base::BaseId;
use crate::campaign::{self, Campaign};
use crate::events::CampaignEvent;
use crate::radar;
use crate::templates::BuildingType;

/// Direction of a status flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// The type became operational.
    Enabled,
    /// The type stopped being operational.
    Disabled,
}

impl Transition {
    /// Transition matching the new status flag.
    #[must_use]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// Function run on a status flip.
pub type StatusHook = fn(&mut Campaign, BaseId);

/// Hook table keyed by building type and transition.
#[derive(Debug, Clone, Default)]
pub struct StatusHooks {
    hooks: HashMap<(BuildingType, Transition), Vec<StatusHook>>,
}

impl StatusHooks {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the standard campaign reactions.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut hooks = Self::new();
        hooks.register(BuildingType::Radar, Transition::Enabled, radar::update_base_coverage);
        hooks.register(BuildingType::Radar, Transition::Disabled, radar::update_base_coverage);
        hooks.register(
            BuildingType::Command,
            Transition::Enabled,
            campaign::update_installation_limit,
        );
        hooks.register(
            BuildingType::Command,
            Transition::Disabled,
            campaign::update_installation_limit,
        );
        hooks.register(
            BuildingType::AlienContainment,
            Transition::Disabled,
            aliens::kill_all_captives,
        );
        hooks
    }

    /// Add a hook.
    pub fn register(&mut self, building_type: BuildingType, transition: Transition, hook: StatusHook) {
        self.hooks
            .entry((building_type, transition))
            .or_default()
            .push(hook);
    }

    /// Hooks for a pair, in registration order.
    #[must_use]
    pub fn hooks_for(&self, building_type: BuildingType, transition: Transition) -> &[StatusHook] {
        self.hooks
            .get(&(building_type, transition))
            .map_or(&[], Vec::as_slice)
    }
}

/// Announce a status flip and run its hooks.
pub(crate) fn fire(campaign: &mut Campaign, base: BaseId, building_type: BuildingType, enabled: bool) {
    campaign.emit(CampaignEvent::StatusChanged {
        base,
        building_type,
        enabled,
    });
    let hooks = campaign
        .hooks
        .hooks_for(building_type, Transition::from_enabled(enabled))
        .to_vec();
    for hook in hooks {
        hook(campaign, base);
    }
}
