//! Alien containment.

use serde::{Deserialize, Serialize};

use crate::base::BaseId;
use crate::campaign::Campaign;
use crate::capacity::CapacityKind;
use crate::error::Result;
use crate::events::CampaignEvent;
use crate::ledger;
use crate::resolver;
use crate::templates::BuildingType;

/// Captives of one alien race.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Captive {
    /// Race identifier.
    pub race: String,
    /// Living captives.
    pub alive: i32,
    /// Corpses kept for autopsy.
    pub dead: i32,
}

/// Captives held by a base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AlienContainment {
    captives: Vec<Captive>,
}

impl AlienContainment {
    /// Captives per race.
    #[must_use]
    pub fn captives(&self) -> &[Captive] {
        &self.captives
    }

    /// Living captives of every race.
    #[must_use]
    pub fn count_alive(&self) -> i32 {
        self.captives.iter().map(|captive| captive.alive).sum()
    }

    /// Corpses of every race.
    #[must_use]
    pub fn count_dead(&self) -> i32 {
        self.captives.iter().map(|captive| captive.dead).sum()
    }

    /// Add living and dead captives of a race.
    pub fn add(&mut self, race: &str, alive: i32, dead: i32) {
        if let Some(captive) = self.captives.iter_mut().find(|captive| captive.race == race) {
            captive.alive += alive;
            captive.dead += dead;
        } else {
            self.captives.push(Captive {
                race: race.to_string(),
                alive,
                dead,
            });
        }
    }

    /// Kill up to `count` living captives, first race first. Returns the
    /// number killed.
    pub fn kill(&mut self, count: i32) -> i32 {
        let mut left = count;
        for captive in &mut self.captives {
            if left <= 0 {
                break;
            }
            let killed = captive.alive.min(left);
            captive.alive -= killed;
            captive.dead += killed;
            left -= killed;
        }
        count - left
    }

    /// Kill every living captive. Returns the number killed.
    pub fn kill_all(&mut self) -> i32 {
        self.kill(self.count_alive())
    }
}

/// Bring captives into a base.
///
/// Without operational containment, or beyond its free space, captives
/// arrive dead. Returns the number kept alive.
pub fn add_captives(campaign: &mut Campaign, base: BaseId, race: &str, amount: i32) -> Result<i32> {
    let target = campaign.base_mut(base)?;
    let free = if resolver::building_status(target, BuildingType::AlienContainment) {
        target.capacity(CapacityKind::Aliens).free().max(0)
    } else {
        0
    };
    let alive = amount.min(free).max(0);
    target.containment.add(race, alive, amount - alive);
    ledger::refresh_current(campaign, base, CapacityKind::Aliens)?;
    Ok(alive)
}

/// Kill every captive in a base. Runs when containment stops working.
pub fn kill_all_captives(campaign: &mut Campaign, base: BaseId) {
    let Ok(target) = campaign.base_mut(base) else {
        tracing::warn!(base = base.0, "Captive cleanup for unknown base");
        return;
    };
    let count = target.containment.kill_all();
    target.capacities.set_current(CapacityKind::Aliens, 0);
    if count > 0 {
        tracing::info!(base = base.0, count, "Captive aliens died");
        campaign.emit(CampaignEvent::CaptivesKilled { base, count });
    }
}

/// Kill captives until the living ones fit the containment capacity.
pub fn remove_exceeding_captives(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    let target = campaign.base_mut(base)?;
    let excess = -target.capacity(CapacityKind::Aliens).free();
    if excess <= 0 {
        return Ok(());
    }
    let count = target.containment.kill(excess);
    ledger::refresh_current(campaign, base, CapacityKind::Aliens)?;
    if count > 0 {
        campaign.emit(CampaignEvent::CaptivesKilled { base, count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_races() {
        let mut containment = AlienContainment::default();
        containment.add("taman", 2, 0);
        containment.add("ortnok", 1, 1);
        containment.add("taman", 1, 2);
        assert_eq!(containment.captives().len(), 2);
        assert_eq!(containment.count_alive(), 4);
        assert_eq!(containment.count_dead(), 3);
    }

    #[test]
    fn test_kill_spans_races() {
        let mut containment = AlienContainment::default();
        containment.add("taman", 2, 0);
        containment.add("ortnok", 3, 0);
        assert_eq!(containment.kill(4), 4);
        assert_eq!(containment.captives()[0].alive, 0);
        assert_eq!(containment.captives()[1].alive, 1);
        assert_eq!(containment.count_dead(), 4);
        assert_eq!(containment.kill(10), 1);
        assert_eq!(containment.kill_all(), 0);
    }
}
